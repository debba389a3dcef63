//! Structured error type for public API surfaces.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq)]
#[serde(tag = "kind")]
pub enum TtsError {
    #[error("{message}")]
    InvalidInput { message: String },
    #[error("{message}")]
    Pipeline { message: String },
    #[error("{message}")]
    NoAudio { message: String },
    #[error("{message}")]
    Io { message: String },
    #[error("{message}")]
    Internal { message: String },
}

pub type TtsResult<T> = std::result::Result<T, TtsError>;

impl TtsError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        TtsError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn pipeline(message: impl Into<String>) -> Self {
        TtsError::Pipeline {
            message: message.into(),
        }
    }

    pub fn no_audio(message: impl Into<String>) -> Self {
        TtsError::NoAudio {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        TtsError::Io {
            message: message.into(),
        }
    }

    /// Human-readable message without the variant tag.
    pub fn message(&self) -> &str {
        match self {
            TtsError::InvalidInput { message }
            | TtsError::Pipeline { message }
            | TtsError::NoAudio { message }
            | TtsError::Io { message }
            | TtsError::Internal { message } => message,
        }
    }

    /// True for errors caused by the caller rather than the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TtsError::InvalidInput { .. })
    }

    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<TtsError>() {
            Ok(tts) => tts,
            Err(err) => TtsError::Internal {
                message: format!("{:#}", err),
            },
        }
    }
}

impl From<anyhow::Error> for TtsError {
    fn from(err: anyhow::Error) -> Self {
        Self::from_anyhow(err)
    }
}
