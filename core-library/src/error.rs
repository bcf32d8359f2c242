use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Invalid filter expression at offset {offset}: {message}")]
    InvalidFilter { offset: usize, message: String },
}

pub type Result<T> = std::result::Result<T, LibraryError>;
