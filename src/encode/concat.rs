use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context as _;

use crate::{
    encode::{check_overwrite, ensure_parent_dir, require_ffmpeg, run_ffmpeg},
    foundation::error::{LayercastError, LayercastResult},
};

/// Body of an ffmpeg concat-demuxer list, one `file '...'` line per segment in order.
pub fn concat_list(segments: &[PathBuf]) -> String {
    let mut out = String::new();
    for seg in segments {
        let escaped = seg.to_string_lossy().replace('\'', r"'\''");
        out.push_str(&format!("file '{escaped}'\n"));
    }
    out
}

/// Join `segments` into `out_path` without re-encoding.
///
/// All segments must share codec parameters, which holds for segments produced by one run.
pub fn concat_segments(
    segments: &[PathBuf],
    list_path: &Path,
    out_path: &Path,
    overwrite: bool,
) -> LayercastResult<()> {
    if segments.is_empty() {
        return Err(LayercastError::validation("no segments to concatenate"));
    }
    ensure_parent_dir(out_path)?;
    check_overwrite(out_path, overwrite)?;
    require_ffmpeg()?;

    // The demuxer resolves relative entries against the list file, so store absolute paths.
    let absolute = segments
        .iter()
        .map(|p| {
            std::path::absolute(p)
                .with_context(|| format!("resolve segment path '{}'", p.display()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    std::fs::write(list_path, concat_list(&absolute))
        .with_context(|| format!("write concat list '{}'", list_path.display()))?;

    let mut cmd = Command::new("ffmpeg");
    cmd.arg(if overwrite { "-y" } else { "-n" });
    cmd.args(["-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
        .arg(list_path)
        .args(["-c", "copy", "-movflags", "+faststart"])
        .arg(out_path);

    run_ffmpeg(cmd, "segment concat")
}

#[cfg(test)]
#[path = "../../tests/unit/encode/concat.rs"]
mod tests;
