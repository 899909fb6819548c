//! Registro persistente de eventos
//!
//! Cada evento tratado pelo orquestrador vira um [`EventRecord`]. O
//! [`JsonEventLogger`] mantém a lista em memória e regrava o arquivo inteiro
//! (`{"events": [...]}`) a cada registro. Falhas de I/O são registradas em
//! log e nunca voltam para quem chamou.
//!
//! Um arquivo que não é JSON válido nunca é sobrescrito: ele é movido para
//! `<nome>.corrupt-<AAAAmmdd-HHMMSS>` antes de o logger começar vazio. Se nem
//! isso for possível, o logger segue só em memória.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local};
use gate_camera::CaptureOutcome;
use gate_core::EventKind;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{GateError, GateResult};

/// Resultado da captura de uma câmera, como gravado no arquivo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub feed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&CaptureOutcome> for CameraRecord {
    fn from(outcome: &CaptureOutcome) -> Self {
        let (image, error) = match &outcome.result {
            Ok(path) => (Some(path.clone()), None),
            Err(failure) => (None, Some(failure.to_string())),
        };
        Self {
            feed: outcome.feed.to_string(),
            image,
            error,
        }
    }
}

/// Um evento tratado
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_type: EventKind,
    pub event_time: DateTime<Local>,
    /// Pasta de captura
    pub image_path: PathBuf,
    #[serde(default)]
    pub cameras: Vec<CameraRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub payload: BTreeMap<String, String>,
    /// Preenchido quando a pasta não pôde ser criada
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
}

impl EventRecord {
    /// Câmeras cuja imagem foi gravada
    pub fn captured(&self) -> usize {
        self.cameras.iter().filter(|c| c.image.is_some()).count()
    }
}

/// Destino dos registros de evento
pub trait EventLogger: Send + Sync {
    /// Nunca falha para o chamador
    fn record(&self, record: EventRecord);
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EventFile {
    #[serde(default)]
    events: Vec<EventRecord>,
}

/// Logger JSON em arquivo
#[derive(Debug)]
pub struct JsonEventLogger {
    path: PathBuf,
    events: Mutex<Vec<EventRecord>>,
    /// Falso quando o arquivo existente não pôde ser lido nem posto de lado
    persist: AtomicBool,
}

impl JsonEventLogger {
    /// Abre o logger, carregando eventos existentes (arquivo ausente = vazio)
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (events, persist) = match read_file(&path) {
            Ok(events) => (events, true),
            Err(failure) => {
                let persist = set_aside(&path, failure);
                warn!(persist, "starting with an empty event list");
                (Vec::new(), persist)
            }
        };
        debug!(path = %path.display(), loaded = events.len(), "event log opened");
        Self {
            path,
            events: Mutex::new(events),
            persist: AtomicBool::new(persist),
        }
    }

    /// Se registros novos chegam ao disco
    pub fn is_persistent(&self) -> bool {
        self.persist.load(Ordering::Acquire)
    }

    fn write_through(&self, events: &[EventRecord], what: &str) {
        if !self.is_persistent() {
            warn!(path = %self.path.display(), what, "event file left untouched; keeping events in memory");
            return;
        }
        if let Err(err) = write_file(&self.path, events) {
            error!(error = %err, what, "failed to write event file");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn events_guard(&self) -> MutexGuard<'_, Vec<EventRecord>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Eventos em memória
    pub fn events(&self) -> Vec<EventRecord> {
        self.events_guard().clone()
    }

    pub fn len(&self) -> usize {
        self.events_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recarrega do disco e retorna a lista
    pub fn retrieve(&self) -> Vec<EventRecord> {
        let mut events = self.events_guard();
        match read_file(&self.path) {
            Ok(loaded) => *events = loaded,
            Err(failure) => {
                error!("failed to reload events; keeping the list in memory");
                if !set_aside(&self.path, failure) {
                    self.persist.store(false, Ordering::Release);
                }
            }
        }
        events.clone()
    }

    /// Apaga a lista e o conteúdo do arquivo
    pub fn purge(&self) {
        let mut events = self.events_guard();
        events.clear();
        self.write_through(&events, "purge");
    }
}

impl EventLogger for JsonEventLogger {
    fn record(&self, record: EventRecord) {
        let mut events = self.events_guard();
        events.push(record);
        self.write_through(&events, "record");
    }
}

/// Por que o arquivo existente não foi carregado
#[derive(Debug)]
enum ReadFailure {
    /// Não deu para ler os bytes
    Unreadable(GateError),
    /// Bytes lidos, mas não são um arquivo de eventos
    Corrupt(GateError),
}

fn read_file(path: &Path) -> Result<Vec<EventRecord>, ReadFailure> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| ReadFailure::Unreadable(GateError::storage(path, e)))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: EventFile =
        serde_json::from_str(&content).map_err(|e| ReadFailure::Corrupt(GateError::storage(path, e)))?;
    Ok(file.events)
}

/// Move um arquivo corrompido para o lado; retorna se o caminho ficou livre
fn set_aside(path: &Path, failure: ReadFailure) -> bool {
    match failure {
        ReadFailure::Unreadable(err) => {
            error!(error = %err, "event file unreadable; it will not be overwritten");
            false
        }
        ReadFailure::Corrupt(err) => match move_corrupt(path) {
            Ok(moved) => {
                error!(error = %err, moved_to = %moved.display(), "corrupt event file set aside");
                true
            }
            Err(move_err) => {
                error!(error = %err, move_error = %move_err, "corrupt event file could not be set aside; it will not be overwritten");
                false
            }
        },
    }
}

fn move_corrupt(path: &Path) -> GateResult<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "events.json".to_string());
    let stamp = Local::now().format("%Y%m%d-%H%M%S");

    let mut target = path.with_file_name(format!("{}.corrupt-{}", name, stamp));
    let mut counter = 1;
    while target.exists() {
        target = path.with_file_name(format!("{}.corrupt-{}-{}", name, stamp, counter));
        counter += 1;
    }

    std::fs::rename(path, &target).map_err(|e| GateError::storage(path, e))?;
    info!(from = %path.display(), to = %target.display(), "event file moved");
    Ok(target)
}

fn write_file(path: &Path, events: &[EventRecord]) -> GateResult<()> {
    #[derive(Serialize)]
    struct EventFileRef<'a> {
        events: &'a [EventRecord],
    }

    let json = serde_json::to_string_pretty(&EventFileRef { events }).map_err(|e| GateError::storage(path, e))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| GateError::storage(parent, e))?;
    }
    std::fs::write(path, json).map_err(|e| GateError::storage(path, e))
}
