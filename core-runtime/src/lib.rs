//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the panel core:
//! - Logging and tracing setup
//! - Configuration and capability injection
//! - Event bus
//!
//! ## Overview
//!
//! Other workspace crates depend on this one for the shared configuration
//! type, the logging conventions, and the broadcast events through which the
//! host observes selection and refresh activity.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
