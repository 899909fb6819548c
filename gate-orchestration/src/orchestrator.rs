//! Orquestrador de segurança
//!
//! Liga a máquina de estados às capturas: um handler por tipo de evento no
//! bus. Para cada evento recebido:
//!
//! ```text
//! nome da pasta (tipo + timestamp) → cria pasta → capture_all → logger.record
//! ```
//!
//! Não guarda lógica de estado nem de câmera; só sequencia. Falhas de
//! armazenamento e de captura viram campos do registro, nunca erro para a
//! máquina.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use gate_camera::CameraOrchestrator;
use gate_core::{EventBus, EventKind, HandlerError, SecurityEvent, SubscriptionId};
use tracing::{error, info, warn};

use crate::error::{GateError, GateResult};
use crate::logger::{CameraRecord, EventLogger, EventRecord};

/// Tentativas de sufixo antes de desistir de uma pasta única
const MAX_FOLDER_SUFFIX: u32 = 1000;

/// Nome da pasta de captura: `event_<KIND>_<YYYY-MM-DD_HHMMSS>`
pub fn capture_folder_name(kind: EventKind, time: &DateTime<Local>) -> String {
    format!("event_{}_{}", kind, time.format("%Y-%m-%d_%H%M%S"))
}

/// Cria `root/<base>`, ou `root/<base>-<n>` se já existir
pub fn create_unique_folder(root: &Path, base: &str) -> GateResult<PathBuf> {
    std::fs::create_dir_all(root).map_err(|e| GateError::storage(root, e))?;

    for suffix in 0..MAX_FOLDER_SUFFIX {
        let name = match suffix {
            0 => base.to_string(),
            n => format!("{}-{}", base, n),
        };
        let path = root.join(name);
        match std::fs::create_dir(&path) {
            Ok(()) => return Ok(path),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(GateError::storage(path, err)),
        }
    }

    Err(GateError::storage(root.join(base), "no free folder name"))
}

/// Executa a sequência de captura de um evento
pub struct CaptureSequencer {
    cameras: Arc<CameraOrchestrator>,
    logger: Arc<dyn EventLogger>,
    capture_root: PathBuf,
}

impl CaptureSequencer {
    pub fn new(cameras: Arc<CameraOrchestrator>, logger: Arc<dyn EventLogger>, capture_root: impl Into<PathBuf>) -> Self {
        Self {
            cameras,
            logger,
            capture_root: capture_root.into(),
        }
    }

    pub fn capture_root(&self) -> &Path {
        &self.capture_root
    }

    /// Pasta, captura e registro; o registro é sempre entregue ao logger
    pub fn handle(&self, event: &SecurityEvent) -> EventRecord {
        let time = Local::now();
        let base = capture_folder_name(event.kind, &time);

        let mut record = EventRecord {
            event_type: event.kind,
            event_time: time,
            image_path: self.capture_root.join(&base),
            cameras: Vec::new(),
            payload: event.payload.clone(),
            storage_error: None,
        };

        match create_unique_folder(&self.capture_root, &base) {
            Ok(folder) => {
                let outcomes = self.cameras.capture_all(&folder);
                record.cameras = outcomes.iter().map(CameraRecord::from).collect();
                record.image_path = folder;
                info!(
                    kind = %event.kind,
                    folder = %record.image_path.display(),
                    captured = record.captured(),
                    cameras = record.cameras.len(),
                    "event captured"
                );
            }
            Err(err) => {
                error!(kind = %event.kind, error = %err, "capture folder not created");
                record.storage_error = Some(err.to_string());
            }
        }

        self.logger.record(record.clone());
        record
    }
}

/// Inscrições do sequenciador no bus
pub struct SecurityOrchestrator {
    bus: EventBus,
    sequencer: Arc<CaptureSequencer>,
    subscriptions: Vec<(EventKind, SubscriptionId)>,
}

impl SecurityOrchestrator {
    /// Inscreve um handler para cada tipo em `kinds`
    pub fn attach(bus: EventBus, sequencer: Arc<CaptureSequencer>, kinds: &[EventKind]) -> GateResult<Self> {
        let mut orchestrator = Self {
            bus,
            sequencer,
            subscriptions: Vec::with_capacity(kinds.len()),
        };

        for &kind in kinds {
            let sequencer = orchestrator.sequencer.clone();
            let id = orchestrator.bus.subscribe(kind, move |event| {
                let record = sequencer.handle(event);
                match record.storage_error {
                    Some(reason) => Err(HandlerError(reason)),
                    None => Ok(()),
                }
            })?;
            orchestrator.subscriptions.push((kind, id));
        }

        Ok(orchestrator)
    }

    /// Inscreve para todos os tipos de evento
    pub fn attach_all(bus: EventBus, sequencer: Arc<CaptureSequencer>) -> GateResult<Self> {
        Self::attach(bus, sequencer, &EventKind::ALL)
    }

    pub fn sequencer(&self) -> &CaptureSequencer {
        &self.sequencer
    }

    pub fn subscribed_kinds(&self) -> Vec<EventKind> {
        self.subscriptions.iter().map(|(kind, _)| *kind).collect()
    }

    /// Remove as inscrições; inscrições já ausentes geram aviso
    pub fn detach(&mut self) {
        for (kind, id) in self.subscriptions.drain(..) {
            if let Err(err) = self.bus.unsubscribe(kind, id) {
                warn!(error = %err, "subscription already gone");
            }
        }
    }
}

impl Drop for SecurityOrchestrator {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for SecurityOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityOrchestrator")
            .field("capture_root", &self.sequencer.capture_root)
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}
