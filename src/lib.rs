//! framegif turns a sorted set of still images (typically frames grabbed from a video) into one
//! animated GIF.
//!
//! Each source goes through the same fixed chain:
//!
//! - decode ([`FrameDecoder`])
//! - crop, scale (Lanczos3), rotate (quarter turns), flip ([`transform`])
//! - palette quantization with Floyd-Steinberg dithering ([`quantize()`])
//!
//! Surviving frames are assembled in source order into an [`Animation`] and serialized as GIF89a.
//! Per-frame failures are logged and skipped; see [`run`].
#![forbid(unsafe_code)]

mod foundation;

pub mod config;
pub mod encode;
pub mod frame;
pub mod geometry;
pub mod pipeline;
pub mod quantize;
pub mod source;

pub use crate::foundation::core::{CropRect, Extent, Flip, LoopCount, PixelRect, Rgb8, Rotation};
pub use crate::foundation::error::{FramegifError, FramegifResult};

pub use crate::config::Config;
pub use crate::encode::animation::Animation;
pub use crate::frame::{process_frame, transform};
pub use crate::pipeline::{
    RunStats, Threading, assemble_sources, process_sources, render_gif, run, run_with_pattern,
    write_output,
};
pub use crate::quantize::{MAX_PALETTE_LEN, QuantizedFrame, quantize};
pub use crate::source::{FrameDecoder, ImageFileDecoder, discover_sources};
