//! Finding and decoding the source images.

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::foundation::error::{FramegifError, FramegifResult};

/// Expand a glob pattern into a lexicographically sorted list of files.
///
/// The sort defines playback order. Matching nothing is a configuration error.
pub fn discover_sources(pattern: &str) -> FramegifResult<Vec<PathBuf>> {
    if pattern.trim().is_empty() {
        return Err(FramegifError::configuration(
            "source pattern must be non-empty",
        ));
    }

    let paths = glob::glob(pattern).map_err(|e| {
        FramegifError::configuration(format!("invalid source pattern '{pattern}': {e}"))
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("skipping unreadable path while globbing: {e}"),
        }
    }

    if files.is_empty() {
        return Err(FramegifError::configuration(format!(
            "no source images found via pattern '{pattern}'"
        )));
    }

    files.sort();
    Ok(files)
}

/// Turns a source path into an RGBA image.
pub trait FrameDecoder: Sync {
    fn decode(&self, path: &Path) -> FramegifResult<RgbaImage>;
}

/// Decodes any raster format the `image` crate recognizes, sniffing the content.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileDecoder;

impl FrameDecoder for ImageFileDecoder {
    fn decode(&self, path: &Path) -> FramegifResult<RgbaImage> {
        let reader = image::ImageReader::open(path)
            .map_err(|e| FramegifError::decode(format!("open '{}': {e}", path.display())))?
            .with_guessed_format()
            .map_err(|e| FramegifError::decode(format!("read '{}': {e}", path.display())))?;
        let img = reader
            .decode()
            .map_err(|e| FramegifError::decode(format!("decode '{}': {e}", path.display())))?;
        Ok(img.to_rgba8())
    }
}
