use std::{fs::File, io::BufReader, io::Read, path::Path, path::PathBuf};

use crate::{
    foundation::core::{CropRect, Extent, Flip, LoopCount, Rgb8, Rotation},
    foundation::error::{FramegifError, FramegifResult},
    pipeline::Threading,
};

/// Settings for one run, built once and passed by reference everywhere.
///
/// Deserializes from JSON with every field optional; missing fields take the defaults below.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Left edge of the crop rectangle in source pixels.
    pub crop_left: u32,
    /// Top edge of the crop rectangle in source pixels.
    pub crop_top: u32,
    pub crop_width: Extent,
    pub crop_height: Extent,
    /// Resize factor applied after cropping. `1.0` skips resampling.
    pub scale: f64,
    pub rotate: Rotation,
    pub flip: Flip,
    /// Delay between frames in hundredths of a second.
    pub delay: u16,
    pub loop_count: LoopCount,
    /// Glob pattern selecting the source images.
    pub source_pattern: String,
    pub destination: PathBuf,
    pub verbose: bool,
    /// Color that translucent source pixels are flattened onto.
    pub background: Rgb8,
    pub threading: Threading,
    /// Replace `destination` if it already exists.
    pub overwrite: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crop_left: 0,
            crop_top: 0,
            crop_width: Extent::Full,
            crop_height: Extent::Full,
            scale: 1.0,
            rotate: Rotation::None,
            flip: Flip::None,
            delay: 3,
            loop_count: LoopCount::INFINITE,
            source_pattern: "*.jpg".to_string(),
            destination: PathBuf::from("movie.gif"),
            verbose: false,
            background: Rgb8([0, 0, 0]),
            threading: Threading::default(),
            overwrite: true,
        }
    }
}

impl Config {
    pub fn crop_rect(&self) -> CropRect {
        CropRect {
            left: self.crop_left,
            top: self.crop_top,
            width: self.crop_width,
            height: self.crop_height,
        }
    }

    pub fn validate(&self) -> FramegifResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(FramegifError::configuration(format!(
                "scale must be a positive finite number, got {}",
                self.scale
            )));
        }
        if self.delay == 0 {
            return Err(FramegifError::configuration(
                "delay must be > 0 hundredths of a second",
            ));
        }
        if self.source_pattern.trim().is_empty() {
            return Err(FramegifError::configuration(
                "source pattern must be non-empty",
            ));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(FramegifError::configuration(
                "destination path must be non-empty",
            ));
        }
        if self.threading.threads == Some(0) {
            return Err(FramegifError::configuration(
                "threads must be >= 1 when set",
            ));
        }
        Ok(())
    }

    pub fn from_json_reader(reader: impl Read) -> FramegifResult<Self> {
        let config: Self = serde_json::from_reader(reader)
            .map_err(|e| FramegifError::configuration(format!("parse settings JSON: {e}")))?;
        Ok(config)
    }

    /// Load a JSON settings file. The result is not validated yet.
    pub fn load(path: &Path) -> FramegifResult<Self> {
        let f = File::open(path).map_err(|e| {
            FramegifError::configuration(format!("open settings '{}': {e}", path.display()))
        })?;
        Self::from_json_reader(BufReader::new(f)).map_err(|e| match e {
            FramegifError::Configuration(msg) => {
                FramegifError::configuration(format!("{msg} (in '{}')", path.display()))
            }
            other => other,
        })
    }
}
