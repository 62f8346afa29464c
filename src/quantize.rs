//! Reduce a true-color frame to an indexed palette of at most 256 colors.
//!
//! Frames that already fit in 256 colors get an exact palette. Everything else is quantized with
//! NeuQuant and Floyd-Steinberg error diffusion.

use std::collections::HashMap;

use color_quant::NeuQuant;
use image::{Rgba, RgbaImage, imageops};

use crate::foundation::{
    core::Rgb8,
    error::{FramegifError, FramegifResult},
};

/// Palette capacity of a GIF color table.
pub const MAX_PALETTE_LEN: usize = 256;

/// NeuQuant sampling factor: 1 is slowest and best, 30 fastest.
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

/// A frame where every pixel is an index into `palette`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantizedFrame {
    pub width: u32,
    pub height: u32,
    /// RGB entries, at most [`MAX_PALETTE_LEN`].
    pub palette: Vec<[u8; 3]>,
    /// Row-major palette indices, `width * height` long.
    pub indices: Vec<u8>,
}

impl QuantizedFrame {
    /// Palette flattened to `r, g, b, r, g, b, ...` as GIF color tables expect.
    pub fn palette_bytes(&self) -> Vec<u8> {
        self.palette.iter().flatten().copied().collect()
    }

    /// Color of the pixel at `(x, y)`, if in bounds and indexed correctly.
    #[cfg(test)]
    pub fn color_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = *self.indices.get((y as usize) * (self.width as usize) + x as usize)?;
        self.palette.get(idx as usize).copied()
    }
}

/// Flatten onto `background`, pick a palette, dither, and index every pixel.
pub fn quantize(img: &RgbaImage, background: Rgb8) -> FramegifResult<QuantizedFrame> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(FramegifError::quantization(format!(
            "cannot quantize an empty {width}x{height} image"
        )));
    }

    let mut opaque = flatten_onto(img, background);

    if let Some(frame) = exact_palette(&opaque) {
        tracing::debug!(colors = frame.palette.len(), "exact palette");
        return Ok(frame);
    }

    let map = NeuQuantMap(NeuQuant::new(
        NEUQUANT_SAMPLE_FACTOR,
        MAX_PALETTE_LEN,
        opaque.as_raw(),
    ));
    imageops::dither(&mut opaque, &map);
    let indices = imageops::index_colors(&opaque, &map).into_raw();

    let palette: Vec<[u8; 3]> = map
        .0
        .color_map_rgb()
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    if palette.is_empty() || palette.len() > MAX_PALETTE_LEN {
        return Err(FramegifError::quantization(format!(
            "quantizer produced {} palette entries",
            palette.len()
        )));
    }

    Ok(QuantizedFrame {
        width,
        height,
        palette,
        indices,
    })
}

/// Palette built from the image's own colors, or `None` when it has more than 256 of them.
fn exact_palette(img: &RgbaImage) -> Option<QuantizedFrame> {
    let mut lookup = HashMap::<[u8; 3], u8>::new();
    let mut palette = Vec::<[u8; 3]>::new();
    let mut indices = Vec::with_capacity(img.as_raw().len() / 4);

    for p in img.pixels() {
        let rgb = [p.0[0], p.0[1], p.0[2]];
        let idx = match lookup.get(&rgb) {
            Some(&idx) => idx,
            None => {
                if palette.len() == MAX_PALETTE_LEN {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push(rgb);
                lookup.insert(rgb, idx);
                idx
            }
        };
        indices.push(idx);
    }

    Some(QuantizedFrame {
        width: img.width(),
        height: img.height(),
        palette,
        indices,
    })
}

/// Composite straight-alpha RGBA over an opaque background.
fn flatten_onto(img: &RgbaImage, background: Rgb8) -> RgbaImage {
    let [bg_r, bg_g, bg_b] = background.0.map(u16::from);
    let mut out = img.clone();

    for px in out.pixels_mut() {
        let a = u16::from(px.0[3]);
        if a == 255 {
            continue;
        }
        let inv = 255 - a;
        let blend = |c: u8, bg: u16| (mul_div255(u16::from(c), a) + mul_div255(bg, inv)).min(255);
        *px = Rgba([
            blend(px.0[0], bg_r) as u8,
            blend(px.0[1], bg_g) as u8,
            blend(px.0[2], bg_b) as u8,
            255,
        ]);
    }

    out
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Adapts a trained NeuQuant network to the `imageops` dithering API.
struct NeuQuantMap(NeuQuant);

impl imageops::ColorMap for NeuQuantMap {
    type Color = Rgba<u8>;

    fn index_of(&self, color: &Rgba<u8>) -> usize {
        self.0.index_of(&color.0)
    }

    fn lookup(&self, index: usize) -> Option<Rgba<u8>> {
        self.0.lookup(index).map(Rgba)
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Rgba<u8>) {
        self.0.map_pixel(&mut color.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                (x * 255 / (width - 1)) as u8,
                (y * 255 / (height - 1)) as u8,
                ((x + y) * 127 / (width + height - 2)) as u8,
                255,
            ])
        })
    }

    fn nearest_distance(palette: &[[u8; 3]], c: [u8; 3]) -> u32 {
        palette
            .iter()
            .map(|p| {
                p.iter()
                    .zip(c.iter())
                    .map(|(a, b)| (i32::from(*a) - i32::from(*b)).unsigned_abs())
                    .sum::<u32>()
            })
            .min()
            .unwrap_or(u32::MAX)
    }

    #[test]
    fn solid_image_gets_exact_single_entry_palette() {
        let img = RgbaImage::from_pixel(10, 4, Rgba([12, 200, 77, 255]));
        let q = quantize(&img, Rgb8::default()).unwrap();
        assert_eq!(q.palette, vec![[12, 200, 77]]);
        assert_eq!(q.indices.len(), 40);
        assert!(q.indices.iter().all(|&i| i == 0));
        assert_eq!(q.color_at(9, 3), Some([12, 200, 77]));
        assert_eq!(q.color_at(10, 0), None);
    }

    #[test]
    fn few_colors_are_preserved_exactly() {
        let colors = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [9, 9, 9]];
        let img = RgbaImage::from_fn(8, 8, |x, y| {
            let c = colors[((x / 4) + 2 * (y / 4)) as usize];
            Rgba([c[0], c[1], c[2], 255])
        });
        let q = quantize(&img, Rgb8::default()).unwrap();
        assert_eq!(q.palette.len(), 4);
        for y in 0..8 {
            for x in 0..8 {
                let p = img.get_pixel(x, y).0;
                assert_eq!(q.color_at(x, y), Some([p[0], p[1], p[2]]));
            }
        }
    }

    #[test]
    fn many_colors_fit_in_256_entry_palette() {
        let img = gradient(64, 64);
        let q = quantize(&img, Rgb8::default()).unwrap();
        assert!(q.palette.len() <= MAX_PALETTE_LEN);
        assert_eq!(q.indices.len(), 64 * 64);
        assert!(q.indices.iter().all(|&i| (i as usize) < q.palette.len()));
        assert_eq!(q.palette_bytes().len(), q.palette.len() * 3);
    }

    #[test]
    fn quantized_palette_covers_the_gradient() {
        let img = gradient(64, 64);
        let q = quantize(&img, Rgb8::default()).unwrap();
        let total: u64 = img
            .pixels()
            .map(|p| u64::from(nearest_distance(&q.palette, [p.0[0], p.0[1], p.0[2]])))
            .sum();
        let mean = total / (64 * 64);
        assert!(mean <= 32, "mean distance to nearest palette entry: {mean}");
    }

    #[test]
    fn dithering_preserves_average_color() {
        let img = gradient(64, 64);
        let q = quantize(&img, Rgb8::default()).unwrap();

        let mut source = [0u64; 3];
        let mut indexed = [0u64; 3];
        for (p, &i) in img.pixels().zip(&q.indices) {
            let c = q.palette[usize::from(i)];
            for ch in 0..3 {
                source[ch] += u64::from(p.0[ch]);
                indexed[ch] += u64::from(c[ch]);
            }
        }

        let n = 64 * 64;
        for ch in 0..3 {
            let (want, got) = (source[ch] / n, indexed[ch] / n);
            assert!(
                want.abs_diff(got) <= 8,
                "channel {ch} mean drifted: {want} -> {got}"
            );
        }
    }

    #[test]
    fn quantize_is_deterministic() {
        let img = gradient(40, 30);
        let a = quantize(&img, Rgb8::default()).unwrap();
        let b = quantize(&img, Rgb8::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn translucent_pixels_flatten_onto_background() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 128]));
        let q = quantize(&img, Rgb8([0, 0, 255])).unwrap();
        assert_eq!(q.palette, vec![[128, 0, 127]]);

        let transparent = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 0]));
        let q = quantize(&transparent, Rgb8([1, 2, 3])).unwrap();
        assert_eq!(q.palette, vec![[1, 2, 3]]);
    }

    #[test]
    fn empty_image_is_quantization_error() {
        let img = RgbaImage::new(0, 5);
        assert!(matches!(
            quantize(&img, Rgb8::default()),
            Err(FramegifError::Quantization(_))
        ));
    }
}
