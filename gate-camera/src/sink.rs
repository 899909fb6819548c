//! Destino das imagens capturadas

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{CameraError, CameraResult};
use crate::types::{FeedId, Frame};

/// Persiste um frame em um caminho
pub trait ImageSink: Send + Sync {
    fn write_image(&self, frame: &Frame, path: &Path) -> CameraResult<()>;
}

/// Nome do arquivo de uma câmera dentro da pasta de captura
pub fn image_file_name(feed: &FeedId) -> String {
    format!("{}.png", feed.file_stem())
}

/// Grava frames como PNG RGB de 8 bits
#[derive(Debug, Clone, Copy, Default)]
pub struct PngSink;

impl ImageSink for PngSink {
    fn write_image(&self, frame: &Frame, path: &Path) -> CameraResult<()> {
        if !frame.is_complete() {
            return Err(CameraError::WriteFailed(format!(
                "frame {} has {} pixels, expected {}x{}",
                frame.sequence,
                frame.pixels.len(),
                frame.width,
                frame.height
            )));
        }

        let fail = |err: &dyn std::fmt::Display| CameraError::WriteFailed(format!("{}: {}", path.display(), err));

        let file = File::create(path).map_err(|e| fail(&e))?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), frame.width, frame.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(|e| fail(&e))?;
        writer.write_image_data(&frame.to_rgb_bytes()).map_err(|e| fail(&e))?;
        writer.finish().map_err(|e| fail(&e))?;
        Ok(())
    }
}
