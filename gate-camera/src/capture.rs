//! Loop de captura de uma câmera
//!
//! Cada câmera roda em sua própria thread: lê um frame, publica no holder,
//! repassa à exibição se ligada e espera o próximo tick no canal de parada.
//! A espera no canal faz a parada ser observada em no máximo uma iteração.
//!
//! ```text
//! ┌──────────┐  read_frame   ┌──────────────┐  Arc<Frame>  ┌─────────────┐
//! │  Source  │──────────────▶│ capture loop │─────────────▶│ FrameHolder │◀── capture_all
//! └──────────┘               └──────┬───────┘              └─────────────┘
//!                                   │ stop_rx.recv_timeout(pacer)
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use tracing::{debug, info, warn};

use crate::display::FrameDisplay;
use crate::error::{CameraError, CameraResult};
use crate::holder::FrameHolder;
use crate::pacer::Pacer;
use crate::source::FrameSource;
use crate::types::FeedId;

/// Como o loop terminou
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// Sinal de parada observado
    Stopped,
    /// A fonte falhou; o último frame bom continua no holder
    SourceFailed(String),
    /// A leitura ou a exibição entrou em pânico
    Panicked,
}

/// Estado compartilhado entre o loop e o orquestrador
#[derive(Debug, Default)]
pub(crate) struct LoopShared {
    pub(crate) holder: FrameHolder,
    pub(crate) displaying: AtomicBool,
    pub(crate) running: AtomicBool,
    exit: Mutex<Option<LoopExit>>,
}

impl LoopShared {
    /// Como o loop terminou; `None` enquanto roda
    pub(crate) fn exit(&self) -> Option<LoopExit> {
        self.exit.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record_exit(&self, exit: &LoopExit) {
        *self.exit.lock().unwrap_or_else(PoisonError::into_inner) = Some(exit.clone());
    }
}

/// Handle de um loop de captura em execução
pub(crate) struct CaptureLoop {
    feed: FeedId,
    shared: Arc<LoopShared>,
    stop_tx: Sender<()>,
    done_rx: Receiver<LoopExit>,
    handle: Option<JoinHandle<()>>,
    exit: Option<LoopExit>,
}

impl CaptureLoop {
    /// Inicia o loop; a fonte passa a pertencer à thread
    pub(crate) fn spawn(
        feed: FeedId,
        source: Box<dyn FrameSource>,
        display: Arc<dyn FrameDisplay>,
        show: bool,
    ) -> CameraResult<Self> {
        let shared = Arc::new(LoopShared::default());
        shared.displaying.store(show, Ordering::Release);
        shared.running.store(true, Ordering::Release);

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (done_tx, done_rx) = bounded::<LoopExit>(1);

        let worker = Worker {
            feed: feed.clone(),
            shared: shared.clone(),
            display,
            stop_rx,
            done_tx,
        };

        let handle = thread::Builder::new()
            .name(format!("capture-{}", feed.file_stem()))
            .spawn(move || worker.run(source))
            .map_err(|err| CameraError::Unavailable {
                feed: feed.clone(),
                reason: format!("failed to spawn capture thread: {}", err),
            })?;

        info!(%feed, "capture loop started");

        Ok(Self {
            feed,
            shared,
            stop_tx,
            done_rx,
            handle: Some(handle),
            exit: None,
        })
    }

    pub(crate) fn feed(&self) -> &FeedId {
        &self.feed
    }

    pub(crate) fn shared(&self) -> &LoopShared {
        &self.shared
    }

    /// Sinaliza parada; chamadas repetidas são inofensivas
    pub(crate) fn request_stop(&self) {
        let _ = self.stop_tx.try_send(());
    }

    /// Espera o fim do loop até `deadline`; `None` se ainda não terminou
    pub(crate) fn join_until(&mut self, deadline: Instant) -> Option<LoopExit> {
        if let Some(exit) = &self.exit {
            return Some(exit.clone());
        }

        let exit = match self.done_rx.recv_deadline(deadline) {
            Ok(exit) => exit,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => LoopExit::Panicked,
        };

        // O loop já sinalizou o fim; o join não bloqueia
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!(feed = %self.feed, "capture thread panicked after finishing");
        }

        self.exit = Some(exit.clone());
        Some(exit)
    }
}

impl std::fmt::Debug for CaptureLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureLoop")
            .field("feed", &self.feed)
            .field("running", &self.shared.running.load(Ordering::Acquire))
            .field("published", &self.shared.holder.published())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WORKER
// ═══════════════════════════════════════════════════════════════════════════════

struct Worker {
    feed: FeedId,
    shared: Arc<LoopShared>,
    display: Arc<dyn FrameDisplay>,
    stop_rx: Receiver<()>,
    done_tx: Sender<LoopExit>,
}

impl Worker {
    fn run(self, mut source: Box<dyn FrameSource>) {
        let mut shown = false;

        let exit = panic::catch_unwind(AssertUnwindSafe(|| self.poll(source.as_mut(), &mut shown)))
            .unwrap_or(LoopExit::Panicked);

        if panic::catch_unwind(AssertUnwindSafe(|| source.release())).is_err() {
            warn!(feed = %self.feed, "device release panicked");
        }
        if shown {
            self.display.close(&self.feed);
        }

        self.shared.record_exit(&exit);
        self.shared.running.store(false, Ordering::Release);
        match &exit {
            LoopExit::Stopped => info!(feed = %self.feed, "capture loop stopped"),
            LoopExit::SourceFailed(reason) => warn!(feed = %self.feed, %reason, "capture loop ended: source failed"),
            LoopExit::Panicked => warn!(feed = %self.feed, "capture loop ended: panic"),
        }

        let _ = self.done_tx.send(exit);
    }

    fn poll(&self, source: &mut dyn FrameSource, shown: &mut bool) -> LoopExit {
        let mut pacer = Pacer::new(source.frame_interval());

        loop {
            match self.stop_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => return LoopExit::Stopped,
                Err(TryRecvError::Empty) => {}
            }

            match source.read_frame() {
                Ok(frame) => {
                    let frame = self.shared.holder.publish(frame);
                    if self.shared.displaying.load(Ordering::Acquire) {
                        self.display.show(&self.feed, &frame);
                        *shown = true;
                    }
                }
                Err(err) => return LoopExit::SourceFailed(err.to_string()),
            }

            match self.stop_rx.recv_timeout(pacer.until_next_tick()) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return LoopExit::Stopped,
                Err(RecvTimeoutError::Timeout) => {}
            }

            if pacer.missed_ticks() > 0 && pacer.tick_count() % 100 == 0 {
                debug!(feed = %self.feed, missed = pacer.missed_ticks(), "capture loop running late");
            }
        }
    }
}
