use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Convert alphabetically sorted images (e.g. video frame grabs) into an animated GIF.
///
/// Images are cropped, scaled, rotated and flipped, in that order, before being quantized to a
/// 256-color palette.
#[derive(Parser, Debug)]
#[command(name = "framegif", version, allow_negative_numbers = true)]
struct Cli {
    /// JSON settings file; flags given on the command line override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Glob pattern for source images [default: *.jpg].
    #[arg(long)]
    src: Option<String>,

    /// Destination filename for the animated GIF [default: movie.gif].
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Left coordinate for the crop to start [default: 0].
    #[arg(long)]
    cropleft: Option<u32>,

    /// Top coordinate for the crop to start [default: 0].
    #[arg(long)]
    croptop: Option<u32>,

    /// Width of the cropped image, -1 for full width [default: -1].
    #[arg(long)]
    cropwidth: Option<i64>,

    /// Height of the cropped image, -1 for full height [default: -1].
    #[arg(long)]
    cropheight: Option<i64>,

    /// Scaling factor applied after cropping [default: 1.0].
    #[arg(long)]
    scale: Option<f64>,

    /// Counter-clockwise rotation: 0, 90, 180 or 270 [default: 0].
    #[arg(long)]
    rotate: Option<u32>,

    /// Flip mode: none, horizontal or vertical [default: none].
    #[arg(long)]
    flip: Option<String>,

    /// Delay between frames in hundredths of a second [default: 3].
    #[arg(long)]
    delay: Option<u16>,

    /// Number of times to repeat the animation, 0 loops forever [default: 0].
    #[arg(long)]
    loop_count: Option<u16>,

    /// Background for translucent pixels as RRGGBB hex [default: 000000].
    #[arg(long)]
    background: Option<String>,

    /// Worker threads for frame processing [default: available parallelism].
    #[arg(long)]
    threads: Option<usize>,

    /// Process frames one at a time on the main thread.
    #[arg(long)]
    sequential: bool,

    /// Refuse to replace an existing destination file.
    #[arg(long)]
    no_overwrite: bool,

    /// Show per-frame progress messages.
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    init_tracing(config.verbose);

    config.validate().context("invalid settings")?;

    let stats = framegif::run_with_pattern(&config)
        .with_context(|| format!("create animated gif '{}'", config.destination.display()))?;

    eprintln!(
        "wrote {} ({} frames, {} skipped)",
        config.destination.display(),
        stats.encoded,
        stats.skipped
    );
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<framegif::Config> {
    let mut config = match &cli.config {
        Some(path) => framegif::Config::load(path)?,
        None => framegif::Config::default(),
    };

    if let Some(src) = &cli.src {
        config.source_pattern = src.clone();
    }
    if let Some(dest) = &cli.dest {
        config.destination = dest.clone();
    }
    if let Some(v) = cli.cropleft {
        config.crop_left = v;
    }
    if let Some(v) = cli.croptop {
        config.crop_top = v;
    }
    if let Some(v) = cli.cropwidth {
        config.crop_width = framegif::Extent::from_sentinel(v).context("--cropwidth")?;
    }
    if let Some(v) = cli.cropheight {
        config.crop_height = framegif::Extent::from_sentinel(v).context("--cropheight")?;
    }
    if let Some(v) = cli.scale {
        config.scale = v;
    }
    if let Some(v) = cli.rotate {
        config.rotate = framegif::Rotation::from_degrees(v)?;
    }
    if let Some(v) = &cli.flip {
        config.flip = v.parse()?;
    }
    if let Some(v) = cli.delay {
        config.delay = v;
    }
    if let Some(v) = cli.loop_count {
        config.loop_count = framegif::LoopCount(v);
    }
    if let Some(v) = &cli.background {
        config.background = v.parse().context("--background")?;
    }
    if let Some(v) = cli.threads {
        config.threading.threads = Some(v);
    }
    if cli.sequential {
        config.threading.parallel = false;
    }
    if cli.no_overwrite {
        config.overwrite = false;
    }
    if cli.verbose {
        config.verbose = true;
    }

    Ok(config)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
