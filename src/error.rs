use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum VocError {
    #[error("invalid dataset handle: {0}")]
    InvalidHandle(String),

    #[error("Kaggle request failed: {0}")]
    KaggleHttp(String),

    #[error("Kaggle returned status {status}: {message}")]
    KaggleStatus { status: u16, message: String },

    #[error("failed to read Kaggle credentials at {0}")]
    CredentialsRead(PathBuf),

    #[error("failed to parse Kaggle credentials: {0}")]
    CredentialsParse(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
