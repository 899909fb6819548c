//! Checkpoint: monta e conduz o sistema completo
//!
//! Dono do bus, da máquina, das câmeras e do logger. É a superfície que o
//! shell usa: ações por nome, estado, ações disponíveis, gestão de câmeras e
//! eventos manuais.

use std::sync::Arc;
use std::time::Duration;

use gate_camera::{CameraDriver, CameraOrchestrator, FeedId, FrameDisplay, NullDisplay, SyntheticDriver};
use gate_core::{ActionKind, EventBus, EventKind, SecurityEvent, SecurityStateMachine, State};
use tracing::{info, warn};

use crate::config::GateConfig;
use crate::error::GateResult;
use crate::logger::{EventRecord, JsonEventLogger};
use crate::orchestrator::{CaptureSequencer, SecurityOrchestrator};

pub struct Checkpoint {
    config: GateConfig,
    machine: SecurityStateMachine,
    cameras: Arc<CameraOrchestrator>,
    logger: Arc<JsonEventLogger>,
    orchestrator: SecurityOrchestrator,
}

impl Checkpoint {
    /// Monta o checkpoint com câmeras sintéticas
    pub fn from_config(config: GateConfig) -> GateResult<Self> {
        let driver = Arc::new(SyntheticDriver::new(config.cameras.camera_config()));
        Self::with_driver(config, driver, Arc::new(NullDisplay))
    }

    /// Monta o checkpoint com driver e exibição dados
    ///
    /// Câmeras que não abrem ficam de fora, com aviso; o checkpoint sobe
    /// mesmo sem nenhuma.
    pub fn with_driver(
        config: GateConfig,
        driver: Arc<dyn CameraDriver>,
        display: Arc<dyn FrameDisplay>,
    ) -> GateResult<Self> {
        config.validate()?;

        let bus = EventBus::new();
        let cameras = Arc::new(
            CameraOrchestrator::new(driver, config.cameras.orchestrator_config()).with_display(display),
        );
        for feed in config.cameras.feed_ids()? {
            if let Err(err) = cameras.add_camera(feed.clone()) {
                warn!(%feed, error = %err, "camera skipped");
            }
        }

        let logger = Arc::new(JsonEventLogger::open(&config.storage.events_file));
        let sequencer = Arc::new(CaptureSequencer::new(
            cameras.clone(),
            logger.clone(),
            &config.storage.capture_root,
        ));
        let orchestrator = SecurityOrchestrator::attach_all(bus.clone(), sequencer)?;
        let machine = SecurityStateMachine::new(bus, config.machine.clone());

        info!(
            cameras = cameras.camera_count(),
            capture_root = %config.storage.capture_root.display(),
            "checkpoint ready"
        );

        Ok(Self {
            config,
            machine,
            cameras,
            logger,
            orchestrator,
        })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn machine(&self) -> &SecurityStateMachine {
        &self.machine
    }

    pub fn cameras(&self) -> &CameraOrchestrator {
        &self.cameras
    }

    pub fn logger(&self) -> &JsonEventLogger {
        &self.logger
    }

    pub fn orchestrator(&self) -> &SecurityOrchestrator {
        &self.orchestrator
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MÁQUINA
    // ═══════════════════════════════════════════════════════════════════════════

    /// Executa uma ação pelo nome; a rejeição volta com a mensagem da máquina
    pub fn perform(&mut self, name: &str, args: &[&str]) -> GateResult<State> {
        Ok(self.machine.perform(name, args)?)
    }

    pub fn state(&self) -> State {
        self.machine.state()
    }

    pub fn available_actions(&self) -> Vec<ActionKind> {
        self.machine.available_actions()
    }

    pub fn enabled_actions(&self) -> Vec<ActionKind> {
        self.machine.enabled_actions()
    }

    /// Captura e registra um evento sem passar pela máquina
    pub fn trigger_event(&self, kind: EventKind) -> EventRecord {
        info!(%kind, "manual trigger");
        self.orchestrator.sequencer().handle(&SecurityEvent::new(kind))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CÂMERAS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn add_camera(&self, feed: FeedId) -> GateResult<()> {
        Ok(self.cameras.add_camera(feed)?)
    }

    pub fn remove_camera(&self, feed: &FeedId) -> GateResult<()> {
        Ok(self.cameras.remove_camera(feed)?)
    }

    /// Exibe um feed, ou todos
    pub fn show_feed(&self, feed: Option<&FeedId>) -> GateResult<()> {
        match feed {
            Some(feed) => self.cameras.enable_display(feed)?,
            None => self.cameras.show_all(),
        }
        Ok(())
    }

    /// Esconde um feed, ou todos
    pub fn hide_feed(&self, feed: Option<&FeedId>) -> GateResult<()> {
        match feed {
            Some(feed) => self.cameras.disable_display(feed)?,
            None => self.cameras.hide_all(),
        }
        Ok(())
    }

    pub fn wait_until_ready(&self, timeout: Duration) -> bool {
        self.cameras.wait_until_ready(timeout)
    }

    /// Para as câmeras; chamadas repetidas são inofensivas
    pub fn shutdown(&self) -> GateResult<()> {
        self.cameras.quit_all()?;
        info!("checkpoint shut down");
        Ok(())
    }
}

impl std::fmt::Debug for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkpoint")
            .field("state", &self.machine.state())
            .field("cameras", &self.cameras.feeds())
            .field("events", &self.logger.len())
            .finish()
    }
}
