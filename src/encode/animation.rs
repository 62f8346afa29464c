use std::io::Write;

use crate::{
    encode::gif89a,
    foundation::{
        core::LoopCount,
        error::{FramegifError, FramegifResult},
    },
    quantize::QuantizedFrame,
};

/// Complete in-memory animation, ready to serialize.
///
/// `frames` and `delays` always have the same length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Animation {
    frames: Vec<QuantizedFrame>,
    delays: Vec<u16>,
    loop_count: LoopCount,
}

impl Animation {
    /// Pair every frame with the same `delay` (hundredths of a second).
    pub fn assemble(
        frames: Vec<QuantizedFrame>,
        delay: u16,
        loop_count: LoopCount,
    ) -> FramegifResult<Self> {
        if frames.is_empty() {
            return Err(FramegifError::encoding("no frames to encode"));
        }
        if delay == 0 {
            return Err(FramegifError::encoding("frame delay must be > 0"));
        }

        let delays = vec![delay; frames.len()];
        Ok(Self {
            frames,
            delays,
            loop_count,
        })
    }

    pub fn frames(&self) -> &[QuantizedFrame] {
        &self.frames
    }

    /// Per-frame delays in hundredths of a second.
    pub fn delays(&self) -> &[u16] {
        &self.delays
    }

    pub fn loop_count(&self) -> LoopCount {
        self.loop_count
    }

    /// Write the animation as a GIF89a stream.
    pub fn encode<W: Write>(&self, writer: W) -> FramegifResult<()> {
        gif89a::write_animation(self, writer)
    }

    pub fn encode_to_vec(&self) -> FramegifResult<Vec<u8>> {
        let mut out = Vec::new();
        self.encode(&mut out)?;
        Ok(out)
    }
}
