//! Pure geometric operations on a single RGBA image.
//!
//! Every function takes the image by value and returns the result, so the no-op paths hand the
//! input back without copying pixels.

use image::{RgbaImage, imageops};

use crate::foundation::{
    core::{CropRect, Flip, Rotation},
    error::{FramegifError, FramegifResult},
};

/// Extract `rect` from `img`. The default (full) rectangle returns `img` unchanged.
pub fn crop(img: RgbaImage, rect: CropRect) -> FramegifResult<RgbaImage> {
    if rect.is_full() {
        return Ok(img);
    }

    let r = rect.resolve(img.width(), img.height())?;
    tracing::debug!(
        "crop ({},{})->({},{})",
        r.left,
        r.top,
        r.right(),
        r.bottom()
    );
    Ok(imageops::crop_imm(&img, r.left, r.top, r.width, r.height).to_image())
}

/// Resize by `factor` with a Lanczos3 filter. Target dimensions are floored.
pub fn scale(img: RgbaImage, factor: f64) -> FramegifResult<RgbaImage> {
    if factor == 1.0 {
        return Ok(img);
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(FramegifError::geometry(format!(
            "scale factor must be positive and finite, got {factor}"
        )));
    }

    let (width, height) = img.dimensions();
    let new_width = scaled_dimension(width, factor);
    let new_height = scaled_dimension(height, factor);
    if new_width < 1.0 || new_height < 1.0 {
        return Err(FramegifError::geometry(format!(
            "scaling {width}x{height} by {factor} leaves no pixels"
        )));
    }
    if new_width > MAX_SCALED_DIMENSION || new_height > MAX_SCALED_DIMENSION {
        return Err(FramegifError::geometry(format!(
            "scaling {width}x{height} by {factor} exceeds {MAX_SCALED_DIMENSION} pixels per side"
        )));
    }
    let (new_width, new_height) = (new_width as u32, new_height as u32);

    tracing::debug!("scale {width}x{height} -> {new_width}x{new_height}");
    Ok(imageops::resize(
        &img,
        new_width,
        new_height,
        imageops::FilterType::Lanczos3,
    ))
}

/// Largest side a GIF frame can have.
const MAX_SCALED_DIMENSION: f64 = u16::MAX as f64;

fn scaled_dimension(dim: u32, factor: f64) -> f64 {
    (f64::from(dim) * factor).floor()
}

/// Rotate counter-clockwise by a quarter-turn multiple. Pixels are moved, never resampled.
pub fn rotate(img: RgbaImage, rotation: Rotation) -> RgbaImage {
    if rotation != Rotation::None {
        tracing::debug!("rotate {}", rotation.degrees());
    }
    match rotation {
        Rotation::None => img,
        // imageops turns clockwise.
        Rotation::Deg90 => imageops::rotate270(&img),
        Rotation::Deg180 => imageops::rotate180(&img),
        Rotation::Deg270 => imageops::rotate90(&img),
    }
}

pub fn flip(img: RgbaImage, mode: Flip) -> RgbaImage {
    if mode != Flip::None {
        tracing::debug!("flip {mode}");
    }
    match mode {
        Flip::None => img,
        Flip::Horizontal => imageops::flip_horizontal(&img),
        Flip::Vertical => imageops::flip_vertical(&img),
    }
}
