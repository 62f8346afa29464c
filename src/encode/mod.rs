//! Animation assembly and GIF serialization.
//!
//! Frames arrive already quantized and in playback order; this module only arranges timing and
//! container metadata around them.

/// Ordered frames plus timing and loop metadata.
pub mod animation;
/// GIF89a serialization of an [`Animation`](animation::Animation).
pub mod gif89a;
