//! Error types for polygon accuracy evaluation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    /// Rejected before any computation started.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("geometry error on feature {id}: {msg}")]
    Geometry { id: u64, msg: String },

    #[error("dissolve failed: {0}")]
    Dissolve(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    pub fn config(msg: impl Into<String>) -> Self {
        EvalError::Config(msg.into())
    }

    pub fn geometry(id: u64, msg: impl Into<String>) -> Self {
        EvalError::Geometry {
            id,
            msg: msg.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
