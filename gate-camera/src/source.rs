//! Fontes de frames
//!
//! O núcleo só precisa de duas capacidades por câmera: ler o frame mais
//! recente e liberar o dispositivo. [`CameraDriver`] abre uma fonte a partir
//! do identificador do feed; a câmera sintética serve quando não há pilha de
//! vídeo disponível.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CameraError, CameraResult};
use crate::types::{FeedId, Frame, Pixel};

/// Fonte de frames de uma câmera
pub trait FrameSource: Send {
    /// Lê o próximo frame; uma falha encerra o loop de captura
    fn read_frame(&mut self) -> CameraResult<Frame>;

    /// Libera o dispositivo; chamada uma única vez, no fim do loop
    fn release(&mut self);

    /// Intervalo entre leituras determinado pela fonte
    fn frame_interval(&self) -> Duration {
        Duration::from_millis(33)
    }
}

/// Abre fontes de frames
pub trait CameraDriver: Send + Sync {
    /// Falha com [`CameraError::Unavailable`] se o dispositivo não abre
    fn open(&self, feed: &FeedId) -> CameraResult<Box<dyn FrameSource>>;
}

/// Configuração de câmera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            fps: 30,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> CameraResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::InvalidConfig("width and height must be > 0".into()));
        }
        if self.fps == 0 {
            return Err(CameraError::InvalidConfig("fps must be > 0".into()));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CÂMERA SINTÉTICA
// ═══════════════════════════════════════════════════════════════════════════════

/// Câmera sintética: gradiente que se desloca a cada frame
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
    released: bool,
}

impl SyntheticCamera {
    pub fn new(config: CameraConfig) -> CameraResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            frame_count: 0,
            released: false,
        })
    }

    /// Retorna resolução atual
    pub fn resolution(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Número de frames gerados
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn generate_frame(&self) -> Frame {
        let (width, height) = self.resolution();
        let shift = self.frame_count as u32;
        let mut pixels = Vec::with_capacity((width * height) as usize);

        // Gradiente horizontal deslocado pelo número do frame
        for y in 0..height {
            for x in 0..width {
                let intensity = (((x + shift) % width) * 255 / width) as u8;
                let tint = (y * 255 / height) as u8;
                pixels.push(Pixel::new(intensity, intensity.saturating_sub(tint / 3), tint));
            }
        }

        Frame {
            width,
            height,
            pixels,
            sequence: self.frame_count,
        }
    }
}

impl FrameSource for SyntheticCamera {
    fn read_frame(&mut self) -> CameraResult<Frame> {
        if self.released {
            return Err(CameraError::ReadFailed("device released".into()));
        }
        let frame = self.generate_frame();
        self.frame_count += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.config.fps as f64)
    }
}

/// Driver que abre câmeras sintéticas para qualquer feed
///
/// Feeds marcados como offline falham na abertura, simulando dispositivo
/// ausente.
#[derive(Debug, Clone, Default)]
pub struct SyntheticDriver {
    config: CameraConfig,
    offline: BTreeSet<FeedId>,
}

impl SyntheticDriver {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            offline: BTreeSet::new(),
        }
    }

    pub fn with_offline(mut self, feed: FeedId) -> Self {
        self.offline.insert(feed);
        self
    }
}

impl CameraDriver for SyntheticDriver {
    fn open(&self, feed: &FeedId) -> CameraResult<Box<dyn FrameSource>> {
        if self.offline.contains(feed) {
            return Err(CameraError::Unavailable {
                feed: feed.clone(),
                reason: "device is offline".into(),
            });
        }
        let camera = SyntheticCamera::new(self.config.clone()).map_err(|err| CameraError::Unavailable {
            feed: feed.clone(),
            reason: err.to_string(),
        })?;
        Ok(Box::new(camera))
    }
}
