//! Tipos de dados de câmera

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CameraError;

/// Identificador estável de uma câmera: índice de dispositivo ou URI
///
/// A ordem (`Ord`) põe índices antes de URIs, índices em ordem numérica.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedId {
    Index(u32),
    Uri(String),
}

impl FeedId {
    /// Nome usável como arquivo, distinto para cada feed
    ///
    /// Índices viram seus dígitos. Em URIs, todo byte fora de `[A-Za-z0-9-]`
    /// (inclusive `_`) vira `_` seguido de dois dígitos hex minúsculos. Uma URI
    /// só de dígitos (ou vazia) ganha o prefixo `_u`, que nenhum escape produz.
    pub fn file_stem(&self) -> String {
        match self {
            FeedId::Index(index) => index.to_string(),
            FeedId::Uri(uri) => {
                let mut stem = String::with_capacity(uri.len() + 2);
                if uri.bytes().all(|b| b.is_ascii_digit()) {
                    stem.push_str("_u");
                }
                for b in uri.bytes() {
                    if b.is_ascii_alphanumeric() || b == b'-' {
                        stem.push(b as char);
                    } else {
                        stem.push_str(&format!("_{:02x}", b));
                    }
                }
                stem
            }
        }
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedId::Index(index) => write!(f, "{}", index),
            FeedId::Uri(uri) => f.write_str(uri),
        }
    }
}

impl FromStr for FeedId {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CameraError::InvalidFeed(s.to_string()));
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse::<u32>()
                .map(FeedId::Index)
                .map_err(|_| CameraError::InvalidFeed(s.to_string()));
        }
        Ok(FeedId::Uri(s.to_string()))
    }
}

impl From<u32> for FeedId {
    fn from(index: u32) -> Self {
        FeedId::Index(index)
    }
}

/// Pixel RGB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn gray(value: u8) -> Self {
        Self::new(value, value, value)
    }

    /// Retorna a intensidade média (grayscale)
    pub fn intensity(&self) -> u8 {
        ((self.r as u32 + self.g as u32 + self.b as u32) / 3) as u8
    }
}

/// Frame capturado
///
/// Imutável depois de publicado no holder; leitores recebem `Arc<Frame>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Pixel>,
    /// Número de sequência atribuído pela fonte
    pub sequence: u64,
}

impl Frame {
    /// Cria frame preenchido com um único pixel
    pub fn filled(width: u32, height: u32, pixel: Pixel, sequence: u64) -> Self {
        Self {
            width,
            height,
            pixels: vec![pixel; (width * height) as usize],
            sequence,
        }
    }

    /// Cria frame preto
    pub fn black(width: u32, height: u32) -> Self {
        Self::filled(width, height, Pixel::gray(0), 0)
    }

    /// Retorna pixel na posição (x, y)
    pub fn get(&self, x: u32, y: u32) -> Option<&Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize)
    }

    /// Número de pixels bate com a resolução
    pub fn is_complete(&self) -> bool {
        self.pixels.len() == (self.width as usize) * (self.height as usize)
    }

    /// Intensidade média do frame
    pub fn avg_intensity(&self) -> u8 {
        if self.pixels.is_empty() {
            return 0;
        }
        let sum: u64 = self.pixels.iter().map(|p| p.intensity() as u64).sum();
        (sum / self.pixels.len() as u64) as u8
    }

    /// Bytes RGB intercalados, linha a linha
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| [p.r, p.g, p.b]).collect()
    }
}
