//! Exibição opcional dos feeds
//!
//! A renderização de janelas fica fora do núcleo; o loop de captura apenas
//! entrega o frame ao [`FrameDisplay`] enquanto a exibição estiver ligada.

use tracing::{debug, trace};

use crate::types::{FeedId, Frame};

pub trait FrameDisplay: Send + Sync {
    /// Chamado a cada frame lido enquanto a exibição está ligada
    fn show(&self, feed: &FeedId, frame: &Frame);

    /// Chamado uma vez quando o loop termina, se o feed chegou a ser exibido
    fn close(&self, feed: &FeedId);
}

/// Não exibe nada
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl FrameDisplay for NullDisplay {
    fn show(&self, _feed: &FeedId, _frame: &Frame) {}

    fn close(&self, _feed: &FeedId) {}
}

/// "Exibe" frames como eventos de trace
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceDisplay;

impl FrameDisplay for TraceDisplay {
    fn show(&self, feed: &FeedId, frame: &Frame) {
        trace!(
            %feed,
            sequence = frame.sequence,
            intensity = frame.avg_intensity(),
            "frame"
        );
    }

    fn close(&self, feed: &FeedId) {
        debug!(%feed, "display closed");
    }
}
