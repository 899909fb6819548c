//! Configuração do checkpoint (`gate.toml`)
//!
//! Todas as seções são opcionais; campos ausentes assumem os valores padrão.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use gate_camera::{CameraConfig, CameraOrchestratorConfig, FeedId};
use gate_core::MachineConfig;
use gate_core::machine::DEFAULT_MAX_TRIES;
use serde::{Deserialize, Serialize};

use crate::error::{GateError, GateResult};

/// Configuração completa
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Máquina de estados
    #[serde(default = "default_machine")]
    pub machine: MachineConfig,

    /// Câmeras
    #[serde(default)]
    pub cameras: CamerasConfig,

    /// Pastas de captura e arquivo de eventos
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            machine: default_machine(),
            cameras: CamerasConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

fn default_machine() -> MachineConfig {
    MachineConfig {
        allow_list: BTreeSet::from([42, 100, 55]),
        max_tries: DEFAULT_MAX_TRIES,
    }
}

/// Seção `[cameras]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CamerasConfig {
    /// Dígitos viram índice de dispositivo; qualquer outra coisa, URI
    pub feeds: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub stop_timeout_ms: u64,
    pub show_on_start: bool,
}

impl Default for CamerasConfig {
    fn default() -> Self {
        let camera = CameraConfig::default();
        let orchestrator = CameraOrchestratorConfig::default();
        Self {
            feeds: vec!["0".to_string()],
            width: camera.width,
            height: camera.height,
            fps: camera.fps,
            stop_timeout_ms: orchestrator.stop_timeout_ms,
            show_on_start: orchestrator.show_on_start,
        }
    }
}

impl CamerasConfig {
    pub fn camera_config(&self) -> CameraConfig {
        CameraConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
        }
    }

    pub fn orchestrator_config(&self) -> CameraOrchestratorConfig {
        CameraOrchestratorConfig {
            stop_timeout_ms: self.stop_timeout_ms,
            show_on_start: self.show_on_start,
        }
    }

    /// Feeds parseados, sem duplicatas, na ordem em que aparecem
    pub fn feed_ids(&self) -> GateResult<Vec<FeedId>> {
        let mut seen = BTreeSet::new();
        let mut feeds = Vec::new();
        for raw in &self.feeds {
            let feed: FeedId = raw.parse().map_err(|e| GateError::Config(format!("{}", e)))?;
            if seen.insert(feed.clone()) {
                feeds.push(feed);
            }
        }
        Ok(feeds)
    }
}

/// Seção `[storage]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Raiz das pastas `event_<KIND>_<timestamp>`
    pub capture_root: PathBuf,
    /// Arquivo JSON com o histórico de eventos
    pub events_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            capture_root: PathBuf::from("event_captures"),
            events_file: PathBuf::from("events.json"),
        }
    }
}

impl GateConfig {
    /// Parse a partir de uma string TOML
    pub fn from_str(content: &str) -> GateResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| GateError::Config(format!("Failed to parse gate.toml: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Carrega de um arquivo
    pub fn from_file(path: &Path) -> GateResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GateError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_str(&content)
    }

    /// Serializa para TOML
    pub fn to_string(&self) -> GateResult<String> {
        toml::to_string_pretty(self).map_err(|e| GateError::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> GateResult<()> {
        if self.machine.max_tries == 0 {
            return Err(GateError::Config("machine.max_tries must be > 0".into()));
        }
        self.cameras
            .camera_config()
            .validate()
            .map_err(|e| GateError::Config(e.to_string()))?;
        self.cameras.feed_ids()?;
        Ok(())
    }
}
