use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{
    encode::sink::{FrameSink, SinkConfig},
    encode::{check_overwrite, ensure_parent_dir, push_h264_output_args, require_ffmpeg, run_ffmpeg},
    foundation::core::{Fps, FrameIndex},
    foundation::error::{LayercastError, LayercastResult},
    render::frame::FrameRGBA,
};

/// printf-style pattern shared by the writer and the ffmpeg image2 reader.
pub const FRAME_PATTERN: &str = "frame_%05d.png";

/// Path of the `ordinal`-th frame inside `dir`.
pub fn frame_file(dir: &Path, ordinal: u64) -> PathBuf {
    dir.join(format!("frame_{ordinal:05}.png"))
}

/// Sink writing opaque RGB PNGs named by [`FRAME_PATTERN`] into a directory.
///
/// Files are numbered from 0 starting at the first pushed frame, so a sub-range still produces
/// a sequence ffmpeg's image2 demuxer can read.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    bg_rgba: [u8; 4],
    first: Option<FrameIndex>,
    last: Option<FrameIndex>,
    started: bool,
    written: u64,
}

impl PngSequenceSink {
    /// Sink writing into `dir`, flattening alpha over `bg_rgba`.
    pub fn new(dir: impl Into<PathBuf>, bg_rgba: [u8; 4]) -> Self {
        Self {
            dir: dir.into(),
            bg_rgba,
            first: None,
            last: None,
            started: false,
            written: 0,
        }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// PNG files written so far.
    pub fn frames_written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, _cfg: SinkConfig) -> LayercastResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            LayercastError::encode(format!("create frame dir '{}': {e}", self.dir.display()))
        })?;
        self.first = None;
        self.last = None;
        self.written = 0;
        self.started = true;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> LayercastResult<()> {
        if !self.started {
            return Err(LayercastError::encode("png sequence sink not started"));
        }
        if let Some(last) = self.last
            && idx <= last
        {
            return Err(LayercastError::encode(
                "png sequence sink received out-of-order frame index",
            ));
        }
        let first = *self.first.get_or_insert(idx);
        frame.save_opaque_png(&frame_file(&self.dir, idx.0 - first.0), self.bg_rgba)?;
        self.last = Some(idx);
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> LayercastResult<()> {
        self.started = false;
        tracing::debug!(dir = %self.dir.display(), frames = self.written, "png sequence written");
        Ok(())
    }
}

/// Encode the numbered PNG sequence in `dir` (starting at `frame_00000.png`) to `out_path`.
pub fn encode_png_sequence(
    dir: &Path,
    fps: Fps,
    out_path: &Path,
    overwrite: bool,
    crf: Option<u8>,
) -> LayercastResult<()> {
    ensure_parent_dir(out_path)?;
    check_overwrite(out_path, overwrite)?;
    require_ffmpeg()?;

    let mut cmd = Command::new("ffmpeg");
    cmd.arg(if overwrite { "-y" } else { "-n" });
    cmd.args(["-loglevel", "error", "-framerate", &fps.ffmpeg_arg(), "-i"])
        .arg(dir.join(FRAME_PATTERN));
    push_h264_output_args(&mut cmd, crf);
    cmd.arg(out_path);

    run_ffmpeg(cmd, "image sequence encode")
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png_seq.rs"]
mod tests;
