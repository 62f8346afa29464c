use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::{
    config::Config,
    encode::animation::Animation,
    foundation::error::{FramegifError, FramegifResult},
    frame::process_frame,
    quantize::QuantizedFrame,
    source::{FrameDecoder, ImageFileDecoder, discover_sources},
};

/// Worker-pool settings for per-frame decode + transform + quantize.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Threading {
    pub parallel: bool,
    /// Rayon worker count; `None` uses the available parallelism.
    pub threads: Option<usize>,
}

impl Default for Threading {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Sources handed to the pipeline.
    pub sources: usize,
    /// Frames that made it into the animation.
    pub encoded: usize,
    /// Sources dropped after a decode, geometry or quantization failure.
    pub skipped: usize,
}

/// Decode and process every source, keeping survivors in source order.
///
/// Frame-local failures (decode, geometry, quantization) are logged and skipped; any other error
/// aborts the run. Each source owns one output slot, so parallel runs produce the same sequence
/// as sequential ones.
pub fn process_sources(
    config: &Config,
    sources: &[PathBuf],
    decoder: &dyn FrameDecoder,
) -> FramegifResult<(Vec<QuantizedFrame>, RunStats)> {
    config.validate()?;
    let total = sources.len();

    let slots: Vec<FramegifResult<Option<QuantizedFrame>>> = if config.threading.parallel {
        let pool = build_thread_pool(config.threading.threads)?;
        pool.install(|| {
            sources
                .par_iter()
                .enumerate()
                .map(|(i, path)| process_source(config, decoder, i, total, path))
                .collect()
        })
    } else {
        sources
            .iter()
            .enumerate()
            .map(|(i, path)| process_source(config, decoder, i, total, path))
            .collect()
    };
    let slots = slots.into_iter().collect::<FramegifResult<Vec<_>>>()?;

    let frames: Vec<QuantizedFrame> = slots.into_iter().flatten().collect();
    let stats = RunStats {
        sources: total,
        encoded: frames.len(),
        skipped: total - frames.len(),
    };
    Ok((frames, stats))
}

fn process_source(
    config: &Config,
    decoder: &dyn FrameDecoder,
    index: usize,
    total: usize,
    path: &Path,
) -> FramegifResult<Option<QuantizedFrame>> {
    tracing::debug!("processing image {} of {}: {}", index + 1, total, path.display());

    let result = decoder
        .decode(path)
        .and_then(|image| process_frame(config, image));
    match result {
        Ok(frame) => Ok(Some(frame)),
        Err(e) if e.is_frame_local() => {
            tracing::warn!("skipping {}: {e}", path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Process `sources` and assemble the survivors into an [`Animation`].
///
/// Fails with an encoding error when every source was skipped.
pub fn assemble_sources(
    config: &Config,
    sources: &[PathBuf],
    decoder: &dyn FrameDecoder,
) -> FramegifResult<(Animation, RunStats)> {
    let (frames, stats) = process_sources(config, sources, decoder)?;
    if frames.is_empty() {
        return Err(FramegifError::encoding(format!(
            "no frames to encode: all {} source images failed",
            stats.sources
        )));
    }
    let anim = Animation::assemble(frames, config.delay, config.loop_count)?;
    Ok((anim, stats))
}

/// Process, assemble and serialize, returning the GIF bytes.
pub fn render_gif(
    config: &Config,
    sources: &[PathBuf],
    decoder: &dyn FrameDecoder,
) -> FramegifResult<(Vec<u8>, RunStats)> {
    let (anim, stats) = assemble_sources(config, sources, decoder)?;
    let bytes = anim.encode_to_vec()?;
    Ok((bytes, stats))
}

/// Render `sources` and write the GIF to `config.destination`.
///
/// The destination is only touched once the whole animation has been encoded.
pub fn run(
    config: &Config,
    sources: &[PathBuf],
    decoder: &dyn FrameDecoder,
) -> FramegifResult<RunStats> {
    let (bytes, stats) = render_gif(config, sources, decoder)?;
    tracing::info!(
        frames = stats.encoded,
        skipped = stats.skipped,
        "writing {}",
        config.destination.display()
    );
    write_output(&config.destination, &bytes, config.overwrite)?;
    Ok(stats)
}

/// Discover sources with `config.source_pattern` and [`run`] them through the file decoder.
pub fn run_with_pattern(config: &Config) -> FramegifResult<RunStats> {
    config.validate()?;
    let sources = discover_sources(&config.source_pattern)?;
    tracing::info!("found {} images to process", sources.len());
    run(config, &sources, &ImageFileDecoder)
}

/// Write `bytes` to `path` via a sibling temp file and a rename.
pub fn write_output(path: &Path, bytes: &[u8], overwrite: bool) -> FramegifResult<()> {
    ensure_parent_dir(path)?;
    if !overwrite && path.exists() {
        return Err(FramegifError::encoding(format!(
            "output file '{}' already exists",
            path.display()
        )));
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| {
            FramegifError::encoding(format!("output path '{}' has no file name", path.display()))
        })?
        .to_string_lossy();
    let tmp = path.with_file_name(format!(".{file_name}.tmp-{}", std::process::id()));
    let mut guard = TempFileGuard(Some(tmp.clone()));

    std::fs::write(&tmp, bytes)
        .map_err(|e| FramegifError::encoding(format!("write '{}': {e}", tmp.display())))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        FramegifError::encoding(format!(
            "move '{}' into place at '{}': {e}",
            tmp.display(),
            path.display()
        ))
    })?;

    guard.0 = None;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> FramegifResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            FramegifError::encoding(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> FramegifResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FramegifError::configuration(
            "threads must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    let pool = builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build rayon thread pool: {e}"))?;
    Ok(pool)
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
