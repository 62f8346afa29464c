use image::RgbaImage;

use crate::{
    config::Config,
    foundation::error::FramegifResult,
    geometry,
    quantize::{QuantizedFrame, quantize},
};

/// Transform one decoded image and quantize it for the GIF.
///
/// Pipeline:
/// 1. [`transform`] (crop, scale, rotate, flip)
/// 2. [`quantize`](crate::quantize::quantize)
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(width = image.width(), height = image.height())
)]
pub fn process_frame(config: &Config, image: RgbaImage) -> FramegifResult<QuantizedFrame> {
    let image = transform(config, image)?;
    quantize(&image, config.background)
}

/// Apply crop -> scale -> rotate -> flip.
///
/// Cropping first keeps the crop rectangle in source pixel coordinates.
pub fn transform(config: &Config, image: RgbaImage) -> FramegifResult<RgbaImage> {
    let image = geometry::crop(image, config.crop_rect())?;
    let image = geometry::scale(image, config.scale)?;
    let image = geometry::rotate(image, config.rotate);
    Ok(geometry::flip(image, config.flip))
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use image::Rgba;

    use super::*;
    use crate::foundation::{
        core::{CropRect, Extent, Flip, Rotation},
        error::FramegifError,
    };

    fn px(n: u32) -> Extent {
        Extent::Pixels(NonZeroU32::new(n).unwrap())
    }

    /// Red encodes `2x`, green encodes `2y`.
    fn ramp(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 2) as u8, (y * 2) as u8, 0, 255])
        })
    }

    fn region_config() -> Config {
        Config {
            crop_left: 10,
            crop_top: 10,
            crop_width: px(50),
            crop_height: px(50),
            scale: 2.0,
            ..Config::default()
        }
    }

    fn near(actual: u8, expected: u8, tolerance: u8) -> bool {
        actual.abs_diff(expected) <= tolerance
    }

    #[test]
    fn crop_happens_before_scale() {
        let src = ramp(120, 120);
        let out = transform(&region_config(), src).unwrap();

        assert_eq!(out.dimensions(), (100, 100));
        let first = out.get_pixel(0, 0).0;
        assert!(near(first[0], 20, 4), "red {} should be ~20", first[0]);
        assert!(near(first[1], 20, 4), "green {} should be ~20", first[1]);
        let last = out.get_pixel(99, 99).0;
        assert!(near(last[0], 118, 4), "red {} should be ~118", last[0]);
    }

    #[test]
    fn scale_then_crop_sees_a_different_region() {
        let src = ramp(120, 120);
        let cfg = region_config();

        let crop_first = transform(&cfg, src.clone()).unwrap();

        let scaled = geometry::scale(src, cfg.scale).unwrap();
        let scale_first = geometry::crop(scaled, cfg.crop_rect()).unwrap();

        assert_ne!(crop_first.dimensions(), scale_first.dimensions());
        assert_eq!(scale_first.dimensions(), (50, 50));
        let a = crop_first.get_pixel(0, 0).0[0];
        let b = scale_first.get_pixel(0, 0).0[0];
        assert!(
            a.abs_diff(b) >= 6,
            "regions should start at different source pixels ({a} vs {b})"
        );
    }

    #[test]
    fn rotate_follows_scale_and_flip_comes_last() {
        let src = ramp(40, 20);
        let cfg = Config {
            scale: 0.5,
            rotate: Rotation::Deg90,
            flip: Flip::Vertical,
            ..Config::default()
        };
        let out = transform(&cfg, src.clone()).unwrap();
        assert_eq!(out.dimensions(), (10, 20));

        let expected = geometry::flip(
            geometry::rotate(geometry::scale(src, 0.5).unwrap(), Rotation::Deg90),
            Flip::Vertical,
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn default_config_leaves_pixels_untouched() {
        let src = ramp(16, 16);
        let out = transform(&Config::default(), src.clone()).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn process_frame_returns_indexed_frame() {
        let src = RgbaImage::from_pixel(30, 20, Rgba([40, 80, 160, 255]));
        let cfg = Config {
            rotate: Rotation::Deg270,
            ..Config::default()
        };
        let frame = process_frame(&cfg, src).unwrap();
        assert_eq!((frame.width, frame.height), (20, 30));
        assert_eq!(frame.palette, vec![[40, 80, 160]]);
        assert_eq!(frame.indices.len(), 600);
    }

    #[test]
    fn geometry_errors_propagate() {
        let src = ramp(30, 30);
        let cfg = Config {
            crop_left: 25,
            crop_width: px(10),
            ..Config::default()
        };
        assert!(matches!(
            process_frame(&cfg, src),
            Err(FramegifError::Geometry(_))
        ));

        let cfg = Config {
            crop_left: 0,
            crop_top: 0,
            crop_width: px(1),
            crop_height: px(1),
            scale: 0.5,
            ..Config::default()
        };
        assert!(matches!(
            process_frame(&cfg, ramp(10, 10)),
            Err(FramegifError::Geometry(_))
        ));
    }

    #[test]
    fn crop_rect_comes_from_config_fields() {
        let cfg = region_config();
        assert_eq!(
            cfg.crop_rect(),
            CropRect {
                left: 10,
                top: 10,
                width: px(50),
                height: px(50)
            }
        );
    }
}
