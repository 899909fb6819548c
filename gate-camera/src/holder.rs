//! Holder do frame mais recente de uma câmera
//!
//! O loop de captura (único escritor) troca o `Arc<Frame>` inteiro; leitores
//! clonam o `Arc`. O conteúdo de um frame publicado nunca é alterado, então
//! um leitor nunca vê frame parcial.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::sync::ShardedLock;

use crate::types::Frame;

#[derive(Debug, Default)]
pub struct FrameHolder {
    slot: ShardedLock<Option<Arc<Frame>>>,
    published: AtomicU64,
}

impl FrameHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitui o frame atual
    pub fn publish(&self, frame: Frame) -> Arc<Frame> {
        let frame = Arc::new(frame);
        // Só guarda um ponteiro: um poison não deixa estado inconsistente
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(frame.clone());
        drop(slot);
        self.published.fetch_add(1, Ordering::Release);
        frame
    }

    /// Frame mais recente, se algum já foi publicado
    pub fn latest(&self) -> Option<Arc<Frame>> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Total de frames publicados
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    pub fn has_frame(&self) -> bool {
        self.published() > 0
    }
}
