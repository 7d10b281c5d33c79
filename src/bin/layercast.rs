use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use layercast::{
    EncoderStrategy, Fps, FrameIndex, LayerSource, LengthPolicy, RenderJob, RenderProgress,
};

#[derive(Parser, Debug)]
#[command(name = "layercast", version, about = "Composite PNG layer sequences into an MP4")]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Composite a single frame as a PNG.
    Frame(FrameArgs),
    /// Report layer kinds, frame count and canvas size.
    Probe(ProbeArgs),
}

#[derive(Args, Debug)]
struct StackArgs {
    /// Layer directory or still PNG, bottom layer first. Repeat for each layer.
    #[arg(long = "layer", value_name = "PATH")]
    layers: Vec<PathBuf>,

    /// JSON render job; explicit flags override its values.
    #[arg(long, value_name = "FILE")]
    job: Option<PathBuf>,

    /// Repeat the last frame of shorter sequences instead of failing.
    #[arg(long)]
    pad: bool,
}

#[derive(Args, Debug)]
struct EffectArgs {
    /// Gaussian blur sigma in pixels (0 disables blur).
    #[arg(long)]
    blur: Option<f32>,

    /// Layer index the blur applies to. Repeatable.
    #[arg(long = "blur-layer", value_name = "K")]
    blur_layers: Vec<usize>,

    /// Fog opacity, 0-255 (0 disables fog).
    #[arg(long)]
    fog: Option<u8>,

    /// Layer index the fog applies to. Repeatable.
    #[arg(long = "fog-layer", value_name = "K")]
    fog_layers: Vec<usize>,

    /// Fog color as RRGGBB.
    #[arg(long = "fog-color", value_name = "RRGGBB", value_parser = layercast::parse_hex_rgb)]
    fog_color: Option<[u8; 3]>,

    /// Blend opacity for one layer, e.g. `1=0.5`. Repeatable.
    #[arg(long = "opacity", value_name = "K=F", value_parser = layercast::parse_layer_opacity)]
    opacity: Vec<(usize, f32)>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    stack: StackArgs,

    #[command(flatten)]
    effects: EffectArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Frame rate, e.g. `30` or `30000/1001`.
    #[arg(long)]
    fps: Option<Fps>,

    /// How frames reach ffmpeg.
    #[arg(long, value_enum)]
    encoder: Option<EncoderChoice>,

    /// Worker count for the segmented encoder (defaults to available cores).
    #[arg(long)]
    workers: Option<usize>,

    /// Background the composite is flattened over, as RRGGBB.
    #[arg(long, value_name = "RRGGBB", value_parser = layercast::parse_hex_rgb)]
    bg: Option<[u8; 3]>,

    /// x264 constant rate factor (0-51).
    #[arg(long)]
    crf: Option<u8>,

    /// Fail instead of replacing an existing output file.
    #[arg(long)]
    no_overwrite: bool,

    /// Composite frames on a thread pool (frames and pipe encoders).
    #[arg(long)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size (parallel mode only).
    #[arg(long)]
    chunk_size: Option<usize>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    stack: StackArgs,

    #[command(flatten)]
    effects: EffectArgs,

    /// Frame index (0-based).
    #[arg(long, default_value_t = 0)]
    index: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    #[command(flatten)]
    stack: StackArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EncoderChoice {
    /// Temporary PNG sequence, then one ffmpeg encode.
    Frames,
    /// One ffmpeg process fed through stdin.
    Pipe,
    /// Parallel segment encoders joined with the concat demuxer.
    Segmented,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_job(stack: &StackArgs) -> anyhow::Result<RenderJob> {
    let mut job = match &stack.job {
        Some(path) => RenderJob::from_path(path)?,
        None => RenderJob::default(),
    };
    if !stack.layers.is_empty() {
        job.layers = stack.layers.clone();
    }
    if stack.pad {
        job.length_policy = LengthPolicy::PadLast;
    }
    if job.layers.is_empty() {
        anyhow::bail!("no layers given: pass --layer (bottom first) or a --job file");
    }
    Ok(job)
}

fn apply_effects(job: &mut RenderJob, args: &EffectArgs) {
    let fx = &mut job.effects;
    if let Some(blur) = args.blur {
        fx.blur = blur;
    }
    if !args.blur_layers.is_empty() {
        fx.blur_layers = args.blur_layers.clone();
    }
    if let Some(fog) = args.fog {
        fx.fog = fog;
    }
    if !args.fog_layers.is_empty() {
        fx.fog_layers = args.fog_layers.clone();
    }
    if let Some(color) = args.fog_color {
        fx.fog_color = color;
    }
    fx.layer_opacity.extend(args.opacity.iter().copied());
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(4, |n| n.get())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut job = load_job(&args.stack)?;
    apply_effects(&mut job, &args.effects);

    if let Some(out) = args.out {
        job.out = Some(out);
    }
    if let Some(fps) = args.fps {
        job.fps = fps;
    }
    job.encoder = match (args.encoder, job.encoder) {
        (Some(EncoderChoice::Frames), _) => EncoderStrategy::Frames,
        (Some(EncoderChoice::Pipe), _) => EncoderStrategy::Pipe,
        (Some(EncoderChoice::Segmented), EncoderStrategy::Segmented { workers }) => {
            EncoderStrategy::Segmented {
                workers: args.workers.unwrap_or(workers),
            }
        }
        (Some(EncoderChoice::Segmented), _) => EncoderStrategy::Segmented {
            workers: args.workers.unwrap_or_else(default_workers),
        },
        (None, EncoderStrategy::Segmented { workers }) => EncoderStrategy::Segmented {
            workers: args.workers.unwrap_or(workers),
        },
        (None, current) => current,
    };
    if let Some(workers) = args.workers
        && !matches!(job.encoder, EncoderStrategy::Segmented { .. })
    {
        tracing::warn!(
            workers,
            encoder = ?job.encoder,
            "--workers only applies to the segmented encoder; ignoring it"
        );
    }
    if let Some([r, g, b]) = args.bg {
        job.bg_rgba = [r, g, b, 255];
    }
    if args.crf.is_some() {
        job.crf = args.crf;
    }
    if args.no_overwrite {
        job.overwrite = false;
    }
    if args.parallel {
        job.threading.parallel = true;
    }
    if args.threads.is_some() {
        job.threading.threads = args.threads;
    }
    if let Some(chunk_size) = args.chunk_size {
        job.threading.chunk_size = chunk_size;
    }

    let out = job
        .out
        .clone()
        .context("no output path: pass --out or set \"out\" in the job file")?;
    let compositor = job.compositor()?;

    let last_decile = AtomicU64::new(0);
    let report = |p: RenderProgress| {
        let decile = p.frames_done * 10 / p.frames_total.max(1);
        if decile > last_decile.fetch_max(decile, Ordering::Relaxed) {
            tracing::info!(
                done = p.frames_done,
                total = p.frames_total,
                "{:.0}% composited",
                p.percent()
            );
        }
    };

    let stats = layercast::render_to_mp4(&compositor, &out, &job.mp4_opts(), Some(&report))?;

    eprintln!(
        "wrote {} ({} frames, {} segment(s), render time {:.2}s)",
        out.display(),
        stats.frames_total,
        stats.segments,
        stats.elapsed.as_secs_f64()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut job = load_job(&args.stack)?;
    apply_effects(&mut job, &args.effects);
    let compositor = job.compositor()?;

    let frame = layercast::render_frame(&compositor, FrameIndex(args.index))?;
    frame
        .save_png(&args.out)
        .with_context(|| format!("write preview frame {}", args.index))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let job = load_job(&args.stack)?;
    let stack = job.frame_stack()?;

    for (i, layer) in stack.layers().iter().enumerate() {
        match layer {
            LayerSource::Sequence { dir, frames } => {
                println!("layer {i}: sequence '{}' ({} frames)", dir.display(), frames.len());
            }
            LayerSource::Still { path } => println!("layer {i}: still '{}'", path.display()),
        }
    }
    let canvas = stack.canvas();
    println!("frames: {}", stack.frame_count());
    println!("canvas: {}x{}", canvas.width, canvas.height);
    println!(
        "duration: {:.2}s at {} fps",
        job.fps.frames_to_secs(stack.frame_count()),
        job.fps.ffmpeg_arg()
    );
    Ok(())
}
