//! # 📷 gate-camera — Captura concorrente de evidências
//!
//! Cada câmera registrada roda um loop próprio que sobrescreve continuamente
//! o frame mais recente. `capture_all` lê esses frames de outra thread e grava
//! uma imagem por câmera; a troca do frame é atômica (troca de `Arc`), então a
//! leitura nunca vê um frame parcial.
//!
//! ## Capacidades externas
//!
//! - [`FrameSource`] / [`CameraDriver`]: ler frame, liberar dispositivo
//! - [`ImageSink`]: persistir um frame em um caminho ([`PngSink`])
//! - [`FrameDisplay`]: exibição opcional, independente da captura
//!
//! ## Exemplo
//!
//! ```no_run
//! use std::sync::Arc;
//! use gate_camera::{CameraConfig, CameraOrchestrator, CameraOrchestratorConfig, FeedId, SyntheticDriver};
//!
//! let driver = Arc::new(SyntheticDriver::new(CameraConfig::default()));
//! let cameras = CameraOrchestrator::new(driver, CameraOrchestratorConfig::default());
//! cameras.add_camera(FeedId::Index(0))?;
//! cameras.wait_until_ready(std::time::Duration::from_secs(1));
//! let outcomes = cameras.capture_all(std::path::Path::new("/tmp"));
//! cameras.quit_all()?;
//! # Ok::<(), gate_camera::CameraError>(())
//! ```

pub mod capture;
pub mod display;
pub mod error;
pub mod holder;
pub mod orchestrator;
pub mod pacer;
pub mod sink;
pub mod source;
pub mod types;

pub use capture::LoopExit;
pub use display::{FrameDisplay, NullDisplay, TraceDisplay};
pub use error::{CameraError, CameraResult, CaptureFailure};
pub use holder::FrameHolder;
pub use orchestrator::{CameraOrchestrator, CameraOrchestratorConfig, CameraStats, CaptureOutcome};
pub use pacer::Pacer;
pub use sink::{ImageSink, PngSink, image_file_name};
pub use source::{CameraConfig, CameraDriver, FrameSource, SyntheticCamera, SyntheticDriver};
pub use types::{FeedId, Frame, Pixel};

#[cfg(test)]
mod tests;
