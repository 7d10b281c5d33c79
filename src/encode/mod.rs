use std::{
    path::Path,
    process::{Command, Stdio},
};

use crate::foundation::error::{LayercastError, LayercastResult};

pub(crate) mod concat;
pub(crate) mod ffmpeg;
pub(crate) mod png_seq;
pub(crate) mod sink;

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> LayercastResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub(crate) fn require_ffmpeg() -> LayercastResult<()> {
    if !is_ffmpeg_on_path() {
        return Err(LayercastError::encode(
            "ffmpeg is required for MP4 encoding, but was not found on PATH",
        ));
    }
    Ok(())
}

/// Refuse to clobber `out_path` unless `overwrite` is set.
pub(crate) fn check_overwrite(out_path: &Path, overwrite: bool) -> LayercastResult<()> {
    if !overwrite && out_path.exists() {
        return Err(LayercastError::validation(format!(
            "output file '{}' already exists",
            out_path.display()
        )));
    }
    Ok(())
}

/// Run a non-streaming ffmpeg command to completion, surfacing stderr on failure.
pub(crate) fn run_ffmpeg(mut cmd: Command, what: &str) -> LayercastResult<()> {
    tracing::debug!(command = ?cmd, "running ffmpeg ({what})");
    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            LayercastError::encode(format!(
                "failed to spawn ffmpeg for {what} (is it installed and on PATH?): {e}"
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LayercastError::encode(format!(
            "ffmpeg {what} exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

/// Shared x264 output arguments so every strategy produces compatible streams.
pub(crate) fn push_h264_output_args(cmd: &mut Command, crf: Option<u8>) {
    cmd.args(["-an", "-c:v", "libx264", "-pix_fmt", "yuv420p"]);
    if let Some(crf) = crf {
        cmd.args(["-crf", &crf.to_string()]);
    }
    cmd.args(["-movflags", "+faststart"]);
}
