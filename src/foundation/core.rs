use std::{fmt, num::NonZeroU32, str::FromStr};

use crate::foundation::error::{FramegifError, FramegifResult};

/// Width or height of a crop rectangle.
///
/// Command lines and settings files spell [`Extent::Full`] as `-1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Extent {
    /// Everything from the crop offset to the image edge.
    #[default]
    Full,
    /// An explicit pixel count.
    Pixels(NonZeroU32),
}

impl Extent {
    /// Parse the `-1` / positive-integer form.
    pub fn from_sentinel(value: i64) -> FramegifResult<Self> {
        if value == -1 {
            return Ok(Self::Full);
        }
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self::Pixels)
            .ok_or_else(|| {
                FramegifError::configuration(format!(
                    "crop extent must be -1 (full) or a positive pixel count, got {value}"
                ))
            })
    }

    pub fn as_sentinel(self) -> i64 {
        match self {
            Self::Full => -1,
            Self::Pixels(n) => i64::from(n.get()),
        }
    }

    pub fn is_full(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Pixel count given `available` pixels between the offset and the image edge.
    pub fn resolve(self, available: u32) -> u32 {
        match self {
            Self::Full => available,
            Self::Pixels(n) => n.get(),
        }
    }
}

impl TryFrom<i64> for Extent {
    type Error = FramegifError;

    fn try_from(value: i64) -> FramegifResult<Self> {
        Self::from_sentinel(value)
    }
}

impl From<Extent> for i64 {
    fn from(value: Extent) -> Self {
        value.as_sentinel()
    }
}

/// Requested crop in source-image pixel space. Extents may still be [`Extent::Full`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: Extent,
    pub height: Extent,
}

impl CropRect {
    /// `true` for the default rectangle, which leaves the image untouched.
    pub fn is_full(&self) -> bool {
        self.left == 0 && self.top == 0 && self.width.is_full() && self.height.is_full()
    }

    /// Resolve against an image of `image_width` x `image_height` pixels.
    ///
    /// Out-of-bounds rectangles are rejected, never clamped.
    pub fn resolve(&self, image_width: u32, image_height: u32) -> FramegifResult<PixelRect> {
        if self.left >= image_width || self.top >= image_height {
            return Err(FramegifError::geometry(format!(
                "crop origin ({},{}) lies outside the {image_width}x{image_height} image",
                self.left, self.top
            )));
        }

        let rect = PixelRect {
            left: self.left,
            top: self.top,
            width: self.width.resolve(image_width - self.left),
            height: self.height.resolve(image_height - self.top),
        };

        let right_edge = u64::from(rect.left) + u64::from(rect.width);
        let bottom_edge = u64::from(rect.top) + u64::from(rect.height);
        if right_edge > u64::from(image_width) || bottom_edge > u64::from(image_height) {
            return Err(FramegifError::geometry(format!(
                "crop ({},{})->({},{}) exceeds the {image_width}x{image_height} image",
                rect.left,
                rect.top,
                right_edge - 1,
                bottom_edge - 1
            )));
        }

        Ok(rect)
    }
}

/// Fully resolved, in-bounds pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Inclusive right column.
    pub fn right(&self) -> u32 {
        self.left + self.width - 1
    }

    /// Inclusive bottom row.
    pub fn bottom(&self) -> u32 {
        self.top + self.height - 1
    }
}

/// Lossless rotation by a multiple of 90 degrees, counter-clockwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Rotation {
    #[default]
    None,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> FramegifResult<Self> {
        match degrees {
            0 => Ok(Self::None),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(FramegifError::configuration(format!(
                "rotate must be one of 0, 90, 180 or 270, got {other}"
            ))),
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

impl TryFrom<u32> for Rotation {
    type Error = FramegifError;

    fn try_from(value: u32) -> FramegifResult<Self> {
        Self::from_degrees(value)
    }
}

impl From<Rotation> for u32 {
    fn from(value: Rotation) -> Self {
        value.degrees()
    }
}

/// Mirror mode applied after rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flip {
    #[default]
    None,
    /// Mirror columns (left <-> right).
    Horizontal,
    /// Mirror rows (top <-> bottom).
    Vertical,
}

impl FromStr for Flip {
    type Err = FramegifError;

    fn from_str(s: &str) -> FramegifResult<Self> {
        match s {
            "none" => Ok(Self::None),
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(FramegifError::configuration(format!(
                "flip must be one of none, horizontal or vertical, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Flip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        })
    }
}

/// Opaque 8-bit RGB color, written as `RRGGBB` or `#RRGGBB`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb8(pub [u8; 3]);

impl FromStr for Rgb8 {
    type Err = FramegifError;

    fn from_str(s: &str) -> FramegifResult<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let invalid =
            || FramegifError::configuration(format!("expected an RRGGBB hex color, got '{s}'"));
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let mut out = [0u8; 3];
        for (i, channel) in out.iter_mut().enumerate() {
            *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(out))
    }
}

impl TryFrom<String> for Rgb8 {
    type Error = FramegifError;

    fn try_from(value: String) -> FramegifResult<Self> {
        value.parse()
    }
}

impl From<Rgb8> for String {
    fn from(value: Rgb8) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "{r:02x}{g:02x}{b:02x}")
    }
}

/// How many times a player repeats the animation. `0` loops forever.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LoopCount(pub u16);

impl LoopCount {
    pub const INFINITE: Self = Self(0);

    pub fn is_infinite(self) -> bool {
        self.0 == 0
    }
}
