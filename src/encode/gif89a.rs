use std::{borrow::Cow, io::Write};

use crate::{
    encode::animation::Animation,
    foundation::{
        core::LoopCount,
        error::{FramegifError, FramegifResult},
    },
    quantize::{MAX_PALETTE_LEN, QuantizedFrame},
};

/// Serialize `anim` as GIF89a.
///
/// Layout:
/// - logical screen sized to the widest and tallest frames, global color table = first frame's
///   palette
/// - NETSCAPE2.0 application extension carrying the loop count
/// - per frame: graphic control extension with the delay, a local color table when the frame's
///   palette differs from the global one, then the LZW-compressed indices
///
/// Every frame is validated before any byte is written.
pub fn write_animation<W: Write>(anim: &Animation, writer: W) -> FramegifResult<()> {
    let first = anim
        .frames()
        .first()
        .ok_or_else(|| FramegifError::encoding("no frames to encode"))?;

    let (mut screen_width, mut screen_height) = (0u16, 0u16);
    for (i, frame) in anim.frames().iter().enumerate() {
        let (width, height) = validate_frame(i, frame)?;
        screen_width = screen_width.max(width);
        screen_height = screen_height.max(height);
    }

    let global_palette = first.palette_bytes();
    let mut encoder = gif::Encoder::new(writer, screen_width, screen_height, &global_palette)
        .map_err(|e| FramegifError::encoding(format!("write gif header: {e}")))?;
    encoder
        .set_repeat(repeat_for(anim.loop_count()))
        .map_err(|e| FramegifError::encoding(format!("write loop extension: {e}")))?;

    for (i, (frame, delay)) in anim.frames().iter().zip(anim.delays()).enumerate() {
        let mut out = gif::Frame::default();
        out.width = frame.width as u16;
        out.height = frame.height as u16;
        out.delay = *delay;
        if frame.palette != first.palette {
            out.palette = Some(frame.palette_bytes());
        }
        out.buffer = Cow::Borrowed(frame.indices.as_slice());

        encoder
            .write_frame(&out)
            .map_err(|e| FramegifError::encoding(format!("write frame {i}: {e}")))?;
    }

    Ok(())
}

fn repeat_for(loop_count: LoopCount) -> gif::Repeat {
    if loop_count.is_infinite() {
        gif::Repeat::Infinite
    } else {
        gif::Repeat::Finite(loop_count.0)
    }
}

fn dimension_u16(value: u32, what: &str, index: usize) -> FramegifResult<u16> {
    match u16::try_from(value) {
        Ok(0) | Err(_) => Err(FramegifError::encoding(format!(
            "frame {index} {what} {value} is outside 1..=65535"
        ))),
        Ok(v) => Ok(v),
    }
}

/// Check one frame and return its dimensions as GIF fields.
fn validate_frame(index: usize, frame: &QuantizedFrame) -> FramegifResult<(u16, u16)> {
    let width = dimension_u16(frame.width, "width", index)?;
    let height = dimension_u16(frame.height, "height", index)?;

    if frame.palette.is_empty() || frame.palette.len() > MAX_PALETTE_LEN {
        return Err(FramegifError::encoding(format!(
            "frame {index} palette has {} entries, expected 1..={MAX_PALETTE_LEN}",
            frame.palette.len()
        )));
    }

    let expected = usize::from(width) * usize::from(height);
    if frame.indices.len() != expected {
        return Err(FramegifError::encoding(format!(
            "frame {index} has {} indices, expected {expected}",
            frame.indices.len()
        )));
    }

    if let Some(bad) = frame
        .indices
        .iter()
        .find(|&&i| usize::from(i) >= frame.palette.len())
    {
        return Err(FramegifError::encoding(format!(
            "frame {index} references palette entry {bad} of {}",
            frame.palette.len()
        )));
    }

    Ok((width, height))
}
