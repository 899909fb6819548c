//! # 🛡️ gate-orchestration — Checkpoint completo
//!
//! Une a máquina de estados (`gate-core`) às câmeras (`gate-camera`):
//! cada evento publicado pela máquina gera uma pasta de captura com uma
//! imagem por câmera e um registro no arquivo de eventos.
//!
//! ## Fluxo
//!
//! ```text
//! perform("identify") ─▶ SecurityStateMachine ─▶ EventBus ─▶ SecurityOrchestrator
//!                                                                 │
//!                     event_<KIND>_<timestamp>/<feed>.png ◀── capture_all
//!                                          events.json ◀── JsonEventLogger
//! ```
//!
//! ## Exemplo
//!
//! ```no_run
//! use gate_orchestration::{Checkpoint, GateConfig};
//!
//! let mut checkpoint = Checkpoint::from_config(GateConfig::default())?;
//! checkpoint.perform("walk_up", &[])?;
//! checkpoint.perform("open", &["42"])?;
//! checkpoint.perform("identify", &[])?;
//! checkpoint.shutdown()?;
//! # Ok::<(), gate_orchestration::GateError>(())
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod logger;
pub mod orchestrator;

pub use checkpoint::Checkpoint;
pub use config::{CamerasConfig, GateConfig, StorageConfig};
pub use error::{GateError, GateResult};
pub use logger::{CameraRecord, EventLogger, EventRecord, JsonEventLogger};
pub use orchestrator::{CaptureSequencer, SecurityOrchestrator, capture_folder_name, create_unique_folder};

// Re-export das camadas inferiores
pub use gate_camera;
pub use gate_core;
