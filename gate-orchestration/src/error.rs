//! Erros da camada de orquestração

use std::path::PathBuf;

use gate_camera::CameraError;
use gate_core::CoreError;
use thiserror::Error;

pub type GateResult<T> = Result<T, GateError>;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error at {}: {reason}", .path.display())]
    Storage { path: PathBuf, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Camera(#[from] CameraError),
}

impl GateError {
    pub(crate) fn storage(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        GateError::Storage {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
