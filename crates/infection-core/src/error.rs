use crate::UserId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfectionError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl InfectionError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, InfectionError>;
