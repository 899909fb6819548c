//! Erros específicos do módulo de câmeras

use thiserror::Error;

use crate::types::FeedId;

pub type CameraResult<T> = Result<T, CameraError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera {feed} unavailable: {reason}")]
    Unavailable { feed: FeedId, reason: String },

    #[error("Camera already registered: {0}")]
    AlreadyRegistered(FeedId),

    #[error("Camera not found: {0}")]
    NotFound(FeedId),

    #[error("Invalid feed identifier: {0:?}")]
    InvalidFeed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Frame read failed: {0}")]
    ReadFailed(String),

    #[error("Image write failed: {0}")]
    WriteFailed(String),

    #[error("Capture loops did not stop in time: {}", join_feeds(.0))]
    Stuck(Vec<FeedId>),
}

fn join_feeds(feeds: &[FeedId]) -> String {
    feeds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Falha de captura de uma câmera; coletada por `capture_all`, nunca propagada
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureFailure {
    #[error("no frame available yet")]
    NoFrameYet,

    #[error("write failed: {0}")]
    Write(String),

    #[error("capture worker panicked")]
    Panicked,
}
