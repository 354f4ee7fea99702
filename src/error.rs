//! Error taxonomy shared by the engines, utilities and collaborators

use thiserror::Error;

/// Everything that can go wrong inside the companion core
#[derive(Error, Debug)]
pub enum CompanionError {
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("cannot convert from {from} to {to}")]
    UnsupportedUnit { from: String, to: String },

    #[error("malformed time string: {0:?}")]
    MalformedTimeString(String),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("invalid alarm: {0}")]
    InvalidAlarm(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{0} lock poisoned")]
    StatePoisoned(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CompanionError {
    pub fn unsupported(from: impl ToString, to: impl ToString) -> Self {
        Self::UnsupportedUnit {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Errors the caller caused, as opposed to collaborator failures
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Storage(_) | Self::Serialization(_) | Self::StatePoisoned(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CompanionError>;
