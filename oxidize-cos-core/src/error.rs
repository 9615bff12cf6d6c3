use crate::parser::ParseError;
use crate::writer::WriteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CosError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Stream payload not loaded (source offset {offset})")]
    PayloadNotLoaded { offset: usize },

    #[error("Crypt callback failed: {0}")]
    Crypt(String),
}

pub type Result<T> = std::result::Result<T, CosError>;
