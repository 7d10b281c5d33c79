use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::{
    encode::concat::concat_segments,
    encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts},
    encode::png_seq::{PngSequenceSink, encode_png_sequence},
    encode::sink::{FrameSink, SinkConfig},
    encode::{check_overwrite, require_ffmpeg},
    foundation::core::{Canvas, Fps, FrameIndex, FrameRange},
    foundation::error::{LayercastError, LayercastResult},
    render::compositor::Compositor,
    render::frame::FrameRGBA,
};

/// Composite a single frame.
pub fn render_frame(compositor: &Compositor, frame: FrameIndex) -> LayercastResult<FrameRGBA> {
    compositor.composite_frame(frame)
}

/// Threading and chunking controls for in-process frame production.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderThreading {
    /// Composite frames on a rayon pool when `true`.
    pub parallel: bool,
    /// Frames composited per parallel batch before they are handed on in order.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

/// Aggregated counters for one render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames the output sinks accepted.
    pub frames_total: u64,
    /// Independent output segments (1 unless segmented).
    pub segments: usize,
    /// Wall-clock time of the render.
    pub elapsed: Duration,
}

/// Progress snapshot passed to progress callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderProgress {
    /// Frames finished so far.
    pub frames_done: u64,
    /// Frames in the whole render.
    pub frames_total: u64,
}

impl RenderProgress {
    /// Completion in percent.
    pub fn percent(&self) -> f64 {
        if self.frames_total == 0 {
            return 100.0;
        }
        (self.frames_done as f64) * 100.0 / (self.frames_total as f64)
    }
}

/// Progress callback; may be invoked from worker threads.
pub type ProgressFn<'a> = Option<&'a (dyn Fn(RenderProgress) + Sync)>;

struct ProgressTracker<'a> {
    done: AtomicU64,
    total: u64,
    callback: ProgressFn<'a>,
}

impl<'a> ProgressTracker<'a> {
    fn new(total: u64, callback: ProgressFn<'a>) -> Self {
        Self {
            done: AtomicU64::new(0),
            total,
            callback,
        }
    }

    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(cb) = self.callback {
            cb(RenderProgress {
                frames_done: done,
                frames_total: self.total,
            });
        }
    }

    fn frames_done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}

/// How composited frames reach the MP4 encoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EncoderStrategy {
    /// Write a temporary PNG sequence, then encode it with one ffmpeg image2 run.
    Frames,
    /// Stream raw frames into a single ffmpeg process.
    #[default]
    Pipe,
    /// Split the timeline into contiguous slices, encode each on its own worker and ffmpeg
    /// process, then concatenate the segments in order.
    Segmented {
        /// Number of slices / concurrent encoders.
        workers: usize,
    },
}

/// Options for [`render_to_mp4`].
#[derive(Clone, Debug)]
pub struct RenderToMp4Opts {
    /// Output frame rate.
    pub fps: Fps,
    /// Encoder driver to use.
    pub strategy: EncoderStrategy,
    /// Whether to overwrite `out_path` if it already exists.
    pub overwrite: bool,
    /// Background color to flatten alpha over (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// Optional x264 constant rate factor.
    pub crf: Option<u8>,
    /// Threading for in-process compositing (`Frames` and `Pipe`).
    pub threading: RenderThreading,
}

impl Default for RenderToMp4Opts {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            strategy: EncoderStrategy::default(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
            crf: None,
            threading: RenderThreading::default(),
        }
    }
}

/// Composite `range` into memory and return the frames in order.
///
/// Parallel output is identical to sequential output.
pub fn render_frames_with_stats(
    compositor: &Compositor,
    range: FrameRange,
    threading: &RenderThreading,
) -> LayercastResult<(Vec<FrameRGBA>, RenderStats)> {
    let started = Instant::now();
    check_range(compositor, range)?;

    let mut sink = CollectSink::default();
    let cfg = sink_config(compositor.canvas(), Fps::default());
    sink.begin(cfg)?;
    let tracker = ProgressTracker::new(range.len_frames(), None);
    let pool = maybe_pool(threading)?;
    feed_sink(
        compositor,
        range,
        &mut sink,
        pool.as_ref().map(|p| (p, threading.chunk_size)),
        &tracker,
    )?;
    sink.end()?;

    Ok((sink.frames, stats_for(&tracker, 1, started)))
}

/// Composite `range` in order and push every frame into `sink`.
pub fn render_to_sink(
    compositor: &Compositor,
    range: FrameRange,
    fps: Fps,
    sink: &mut dyn FrameSink,
    threading: &RenderThreading,
    progress: ProgressFn<'_>,
) -> LayercastResult<RenderStats> {
    let started = Instant::now();
    check_range(compositor, range)?;

    let pool = maybe_pool(threading)?;
    let tracker = ProgressTracker::new(range.len_frames(), progress);

    sink.begin(sink_config(compositor.canvas(), fps))?;
    feed_sink(
        compositor,
        range,
        sink,
        pool.as_ref().map(|p| (p, threading.chunk_size)),
        &tracker,
    )?;
    sink.end()?;

    Ok(stats_for(&tracker, 1, started))
}

/// Split `range` into at most `workers` contiguous slices and render each slice on its own
/// thread into a sink produced by `make_sink(slice_index, slice)`.
///
/// Sinks are returned in slice order, so slice `i`'s frames precede slice `i + 1`'s. Workers
/// share no mutable state; the first failing slice (in slice order) is reported after all
/// workers have joined.
pub fn render_segmented<S, F>(
    compositor: &Compositor,
    range: FrameRange,
    fps: Fps,
    workers: usize,
    make_sink: F,
    progress: ProgressFn<'_>,
) -> LayercastResult<(Vec<S>, RenderStats)>
where
    S: FrameSink,
    F: Fn(usize, FrameRange) -> LayercastResult<S> + Sync,
{
    let started = Instant::now();
    check_range(compositor, range)?;
    let slices = range.split_contiguous(workers)?;
    let cfg = sink_config(compositor.canvas(), fps);
    let tracker = ProgressTracker::new(range.len_frames(), progress);

    tracing::info!(
        segments = slices.len(),
        frames = range.len_frames(),
        "rendering segments"
    );

    let results: Vec<LayercastResult<S>> = std::thread::scope(|scope| {
        let handles: Vec<_> = slices
            .iter()
            .enumerate()
            .map(|(index, &slice)| {
                let make_sink = &make_sink;
                let tracker = &tracker;
                let cfg = cfg.clone();
                scope.spawn(move || -> LayercastResult<S> {
                    let _span = tracing::info_span!(
                        "segment",
                        index,
                        start = slice.start.0,
                        end = slice.end.0
                    )
                    .entered();
                    let mut sink = make_sink(index, slice)?;
                    sink.begin(cfg)?;
                    feed_sink(compositor, slice, &mut sink, None, tracker)?;
                    sink.end()?;
                    tracing::debug!("segment finished");
                    Ok(sink)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(LayercastError::encode("segment worker panicked")))
            })
            .collect()
    });

    let sinks = results.into_iter().collect::<LayercastResult<Vec<S>>>()?;
    let stats = stats_for(&tracker, sinks.len(), started);
    Ok((sinks, stats))
}

/// Composite `range` and write it as `frame_00000.png`.. (opaque RGB) into `dir`.
///
/// Frame files are numbered from 0 regardless of `range.start`.
pub fn render_png_sequence(
    compositor: &Compositor,
    range: FrameRange,
    dir: &Path,
    bg_rgba: [u8; 4],
    threading: &RenderThreading,
    progress: ProgressFn<'_>,
) -> LayercastResult<RenderStats> {
    let mut sink = PngSequenceSink::new(dir, bg_rgba);
    render_to_sink(
        compositor,
        range,
        Fps::default(),
        &mut sink,
        threading,
        progress,
    )
}

/// Render every frame of the compositor to an MP4 via the system `ffmpeg` binary.
///
/// `ffmpeg` must be installed and on `PATH`; this is checked before any frame is composited.
pub fn render_to_mp4(
    compositor: &Compositor,
    out_path: impl Into<PathBuf>,
    opts: &RenderToMp4Opts,
    progress: ProgressFn<'_>,
) -> LayercastResult<RenderStats> {
    let started = Instant::now();
    let out_path = out_path.into();
    let range = FrameRange::from_len(compositor.frame_count());

    check_range(compositor, range)?;
    check_output_canvas(compositor.canvas())?;
    check_overwrite(&out_path, opts.overwrite)?;
    require_ffmpeg()?;

    tracing::info!(
        out = %out_path.display(),
        frames = range.len_frames(),
        strategy = ?opts.strategy,
        "rendering mp4"
    );

    let sink_opts = |path: PathBuf, overwrite: bool| FfmpegSinkOpts {
        out_path: path,
        overwrite,
        bg_rgba: opts.bg_rgba,
        crf: opts.crf,
    };

    let mut stats = match opts.strategy {
        EncoderStrategy::Pipe => {
            let mut sink = FfmpegSink::new(sink_opts(out_path.clone(), opts.overwrite));
            let mut stats = render_to_sink(
                compositor,
                range,
                opts.fps,
                &mut sink,
                &opts.threading,
                progress,
            )?;
            stats.frames_total = sink.frames_written();
            stats
        }
        EncoderStrategy::Segmented { workers } => {
            let tmp = TempDirGuard::create("segments")?;
            let (sinks, mut stats) = render_segmented(
                compositor,
                range,
                opts.fps,
                workers,
                |index, _slice| {
                    let path = tmp.path().join(format!("segment_{index:03}.mp4"));
                    Ok(FfmpegSink::new(sink_opts(path, true)))
                },
                progress,
            )?;
            stats.frames_total = sinks.iter().map(FfmpegSink::frames_written).sum();
            let segments: Vec<PathBuf> =
                sinks.iter().map(|s| s.out_path().to_path_buf()).collect();
            concat_segments(
                &segments,
                &tmp.path().join("concat.txt"),
                &out_path,
                opts.overwrite,
            )?;
            stats
        }
        EncoderStrategy::Frames => {
            let tmp = TempDirGuard::create("frames")?;
            let stats = render_png_sequence(
                compositor,
                range,
                tmp.path(),
                opts.bg_rgba,
                &opts.threading,
                progress,
            )?;
            encode_png_sequence(tmp.path(), opts.fps, &out_path, opts.overwrite, opts.crf)?;
            stats
        }
    };

    stats.elapsed = started.elapsed();
    tracing::info!(
        out = %out_path.display(),
        frames = stats.frames_total,
        segments = stats.segments,
        elapsed_secs = stats.elapsed.as_secs_f64(),
        "mp4 written"
    );
    Ok(stats)
}

fn feed_sink<K: FrameSink + ?Sized>(
    compositor: &Compositor,
    range: FrameRange,
    sink: &mut K,
    pool: Option<(&rayon::ThreadPool, usize)>,
    tracker: &ProgressTracker<'_>,
) -> LayercastResult<()> {
    let Some((pool, chunk_size)) = pool else {
        for idx in range.iter() {
            let frame = compositor.composite_frame(idx)?;
            sink.push_frame(idx, &frame)?;
            tracker.tick();
        }
        return Ok(());
    };

    let chunk_size = normalized_chunk_size(chunk_size);
    let mut chunk_start = range.start.0;
    while chunk_start < range.end.0 {
        let chunk_end = (chunk_start + chunk_size).min(range.end.0);
        let chunk: Vec<FrameIndex> = (chunk_start..chunk_end).map(FrameIndex).collect();
        let frames: Vec<LayercastResult<FrameRGBA>> = pool.install(|| {
            chunk
                .par_iter()
                .map(|&idx| compositor.composite_frame(idx))
                .collect()
        });
        for (idx, frame) in chunk.into_iter().zip(frames) {
            sink.push_frame(idx, &frame?)?;
            tracker.tick();
        }
        chunk_start = chunk_end;
    }
    Ok(())
}

fn check_range(compositor: &Compositor, range: FrameRange) -> LayercastResult<()> {
    if range.is_empty() {
        return Err(LayercastError::validation("render range must be non-empty"));
    }
    if range.end.0 > compositor.frame_count() {
        return Err(LayercastError::validation(format!(
            "render range ends at {} but the sequence has {} frames",
            range.end.0,
            compositor.frame_count()
        )));
    }
    Ok(())
}

fn check_output_canvas(canvas: Canvas) -> LayercastResult<()> {
    if !canvas.width.is_multiple_of(2) || !canvas.height.is_multiple_of(2) {
        return Err(LayercastError::validation(format!(
            "frame size {}x{} must be even (required for yuv420p mp4 output)",
            canvas.width, canvas.height
        )));
    }
    Ok(())
}

fn sink_config(canvas: Canvas, fps: Fps) -> SinkConfig {
    SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps,
    }
}

fn maybe_pool(threading: &RenderThreading) -> LayercastResult<Option<rayon::ThreadPool>> {
    if !threading.parallel {
        return Ok(None);
    }
    build_thread_pool(threading.threads).map(Some)
}

fn build_thread_pool(threads: Option<usize>) -> LayercastResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(LayercastError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| LayercastError::encode(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    chunk_size.max(1) as u64
}

fn stats_for(tracker: &ProgressTracker<'_>, segments: usize, started: Instant) -> RenderStats {
    RenderStats {
        frames_total: tracker.frames_done(),
        segments,
        elapsed: started.elapsed(),
    }
}

/// Sink that keeps frames in order without cloning the index alongside.
#[derive(Default)]
struct CollectSink {
    frames: Vec<FrameRGBA>,
}

impl FrameSink for CollectSink {
    fn begin(&mut self, _cfg: SinkConfig) -> LayercastResult<()> {
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &FrameRGBA) -> LayercastResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> LayercastResult<()> {
        Ok(())
    }
}

/// Scratch directory removed on drop, on success and failure alike.
struct TempDirGuard(PathBuf);

impl TempDirGuard {
    fn create(label: &str) -> LayercastResult<Self> {
        let path = std::env::temp_dir().join(format!(
            "layercast_{label}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        std::fs::create_dir_all(&path).map_err(|e| {
            LayercastError::encode(format!("create temp dir '{}': {e}", path.display()))
        })?;
        Ok(Self(path))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
