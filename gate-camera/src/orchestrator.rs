//! Orquestrador de câmeras
//!
//! Dono dos loops de captura. O registro de câmeras fica atrás de um único
//! `Mutex`, mas nenhuma operação lenta (abrir dispositivo, esperar loop,
//! gravar imagem) acontece com o lock tomado.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::capture::{CaptureLoop, LoopExit};
use crate::display::{FrameDisplay, NullDisplay};
use crate::error::{CameraError, CameraResult, CaptureFailure};
use crate::sink::{ImageSink, PngSink, image_file_name};
use crate::source::CameraDriver;
use crate::types::{FeedId, Frame};

/// Configuração do orquestrador
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOrchestratorConfig {
    /// Tempo máximo de espera pela parada dos loops
    pub stop_timeout_ms: u64,
    /// Exibição ligada para câmeras recém-adicionadas
    pub show_on_start: bool,
}

impl Default for CameraOrchestratorConfig {
    fn default() -> Self {
        Self {
            stop_timeout_ms: 2000,
            show_on_start: false,
        }
    }
}

impl CameraOrchestratorConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Resultado da captura de uma câmera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub feed: FeedId,
    pub result: Result<PathBuf, CaptureFailure>,
}

impl CaptureOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Estatísticas de uma câmera
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraStats {
    pub feed: FeedId,
    pub frames_read: u64,
    pub last_sequence: Option<u64>,
    pub running: bool,
    pub displaying: bool,
}

pub struct CameraOrchestrator {
    driver: Arc<dyn CameraDriver>,
    sink: Arc<dyn ImageSink>,
    display: Arc<dyn FrameDisplay>,
    config: CameraOrchestratorConfig,
    cameras: Mutex<BTreeMap<FeedId, CaptureLoop>>,
}

impl CameraOrchestrator {
    /// Cria orquestrador com sink PNG e sem exibição
    pub fn new(driver: Arc<dyn CameraDriver>, config: CameraOrchestratorConfig) -> Self {
        Self {
            driver,
            sink: Arc::new(PngSink),
            display: Arc::new(NullDisplay),
            config,
            cameras: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ImageSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_display(mut self, display: Arc<dyn FrameDisplay>) -> Self {
        self.display = display;
        self
    }

    pub fn config(&self) -> &CameraOrchestratorConfig {
        &self.config
    }

    // O mapa só muda por insert/remove completos: um poison não deixa
    // câmera pela metade
    fn cameras(&self) -> MutexGuard<'_, BTreeMap<FeedId, CaptureLoop>> {
        self.cameras.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CICLO DE VIDA
    // ═══════════════════════════════════════════════════════════════════════════

    /// Abre o dispositivo e inicia o loop de captura
    ///
    /// Se a abertura falha nada é registrado.
    pub fn add_camera(&self, feed: FeedId) -> CameraResult<()> {
        if self.cameras().contains_key(&feed) {
            return Err(CameraError::AlreadyRegistered(feed));
        }

        let source = self.driver.open(&feed).inspect_err(|err| {
            warn!(%feed, error = %err, "camera open failed");
        })?;
        let mut capture = CaptureLoop::spawn(feed.clone(), source, self.display.clone(), self.config.show_on_start)?;

        let mut cameras = self.cameras();
        if cameras.contains_key(&feed) {
            // Outra chamada registrou o mesmo feed enquanto abríamos
            drop(cameras);
            capture.request_stop();
            let _ = capture.join_until(Instant::now() + self.config.stop_timeout());
            return Err(CameraError::AlreadyRegistered(feed));
        }
        cameras.insert(feed.clone(), capture);
        debug!(%feed, total = cameras.len(), "camera registered");
        Ok(())
    }

    /// Para e remove uma câmera
    pub fn remove_camera(&self, feed: &FeedId) -> CameraResult<()> {
        let mut capture = self
            .cameras()
            .remove(feed)
            .ok_or_else(|| CameraError::NotFound(feed.clone()))?;

        capture.request_stop();
        match capture.join_until(Instant::now() + self.config.stop_timeout()) {
            Some(exit) => {
                debug!(%feed, ?exit, "camera removed");
                Ok(())
            }
            None => {
                error!(%feed, "capture loop did not stop in time");
                Err(CameraError::Stuck(vec![feed.clone()]))
            }
        }
    }

    /// Para todas as câmeras e espera, com prazo único, que terminem
    ///
    /// Loops que não terminam no prazo são abandonados e reportados como
    /// [`CameraError::Stuck`]. Uma segunda chamada não tem câmeras a parar.
    pub fn quit_all(&self) -> CameraResult<()> {
        let mut captures = std::mem::take(&mut *self.cameras());
        if captures.is_empty() {
            return Ok(());
        }

        for capture in captures.values() {
            capture.request_stop();
        }

        let deadline = Instant::now() + self.config.stop_timeout();
        let mut stuck = Vec::new();
        for (feed, capture) in captures.iter_mut() {
            if capture.join_until(deadline).is_none() {
                stuck.push(feed.clone());
            }
        }

        if stuck.is_empty() {
            info!(cameras = captures.len(), "all capture loops stopped");
            Ok(())
        } else {
            error!(stuck = ?stuck, "capture loops did not stop in time");
            Err(CameraError::Stuck(stuck))
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CAPTURA
    // ═══════════════════════════════════════════════════════════════════════════

    /// Grava o frame atual de cada câmera em `dest/<feed>.png`
    ///
    /// As gravações rodam em paralelo; o resultado vem em ordem de feed e
    /// uma falha de uma câmera não afeta as demais.
    pub fn capture_all(&self, dest: &Path) -> Vec<CaptureOutcome> {
        let snapshot: Vec<(FeedId, Option<Arc<Frame>>)> = self
            .cameras()
            .iter()
            .map(|(feed, capture)| (feed.clone(), capture.shared().holder.latest()))
            .collect();

        let feeds: Vec<FeedId> = snapshot.iter().map(|(feed, _)| feed.clone()).collect();
        let sink = self.sink.as_ref();

        let scoped = crossbeam_utils::thread::scope(|scope| {
            let handles: Vec<_> = snapshot
                .into_iter()
                .map(|(feed, frame)| scope.spawn(move |_| write_snapshot(sink, dest, &feed, frame.as_deref())))
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(Err(CaptureFailure::Panicked)))
                .collect::<Vec<_>>()
        });

        let results = scoped.unwrap_or_else(|_| vec![Err(CaptureFailure::Panicked); feeds.len()]);

        let outcomes: Vec<CaptureOutcome> = feeds
            .into_iter()
            .zip(results)
            .map(|(feed, result)| CaptureOutcome { feed, result })
            .collect();

        for outcome in &outcomes {
            if let Err(failure) = &outcome.result {
                warn!(feed = %outcome.feed, %failure, "capture failed");
            }
        }
        outcomes
    }

    /// Espera até cada câmera ter produzido o primeiro frame
    pub fn wait_until_ready(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let ready = self.cameras().values().all(|capture| capture.shared().holder.has_frame());
            if ready {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXIBIÇÃO
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn enable_display(&self, feed: &FeedId) -> CameraResult<()> {
        self.set_display(feed, true)
    }

    pub fn disable_display(&self, feed: &FeedId) -> CameraResult<()> {
        self.set_display(feed, false)
    }

    fn set_display(&self, feed: &FeedId, on: bool) -> CameraResult<()> {
        let cameras = self.cameras();
        let capture = cameras.get(feed).ok_or_else(|| CameraError::NotFound(feed.clone()))?;
        capture.shared().displaying.store(on, Ordering::Release);
        debug!(%feed, displaying = on, "display toggled");
        Ok(())
    }

    pub fn show_all(&self) {
        for capture in self.cameras().values() {
            capture.shared().displaying.store(true, Ordering::Release);
        }
    }

    pub fn hide_all(&self) {
        for capture in self.cameras().values() {
            capture.shared().displaying.store(false, Ordering::Release);
        }
    }

    pub fn is_displaying(&self, feed: &FeedId) -> CameraResult<bool> {
        self.cameras()
            .get(feed)
            .map(|capture| capture.shared().displaying.load(Ordering::Acquire))
            .ok_or_else(|| CameraError::NotFound(feed.clone()))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONSULTA
    // ═══════════════════════════════════════════════════════════════════════════

    /// Feeds registrados, em ordem
    pub fn feeds(&self) -> Vec<FeedId> {
        self.cameras().keys().cloned().collect()
    }

    pub fn is_registered(&self, feed: &FeedId) -> bool {
        self.cameras().contains_key(feed)
    }

    pub fn camera_count(&self) -> usize {
        self.cameras().len()
    }

    pub fn stats(&self) -> Vec<CameraStats> {
        self.cameras()
            .values()
            .map(|capture| {
                let shared = capture.shared();
                CameraStats {
                    feed: capture.feed().clone(),
                    frames_read: shared.holder.published(),
                    last_sequence: shared.holder.latest().map(|frame| frame.sequence),
                    running: shared.running.load(Ordering::Acquire),
                    displaying: shared.displaying.load(Ordering::Acquire),
                }
            })
            .collect()
    }

    /// Como o loop de uma câmera terminou, se já terminou
    pub fn exit_status(&self, feed: &FeedId) -> CameraResult<Option<LoopExit>> {
        let cameras = self.cameras();
        let capture = cameras.get(feed).ok_or_else(|| CameraError::NotFound(feed.clone()))?;
        Ok(capture.shared().exit())
    }
}

fn write_snapshot(sink: &dyn ImageSink, dest: &Path, feed: &FeedId, frame: Option<&Frame>) -> Result<PathBuf, CaptureFailure> {
    let frame = frame.ok_or(CaptureFailure::NoFrameYet)?;
    let path = dest.join(image_file_name(feed));
    sink.write_image(frame, &path)
        .map_err(|err| CaptureFailure::Write(err.to_string()))?;
    Ok(path)
}

impl std::fmt::Debug for CameraOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraOrchestrator")
            .field("config", &self.config)
            .field("feeds", &self.feeds())
            .finish()
    }
}

impl Drop for CameraOrchestrator {
    fn drop(&mut self) {
        if self.camera_count() > 0
            && let Err(err) = self.quit_all()
        {
            error!(error = %err, "cameras left running on drop");
        }
    }
}
