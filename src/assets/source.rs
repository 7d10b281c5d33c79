use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::{
    assets::decode::probe_dimensions,
    foundation::core::{Canvas, FrameIndex},
    foundation::error::{LayercastError, LayercastResult},
};

/// How sequence layers of different lengths are reconciled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPolicy {
    /// Every sequence layer must have the same frame count.
    #[default]
    Strict,
    /// Shorter sequences repeat their last frame up to the longest sequence.
    PadLast,
}

/// One input layer: a directory of numbered PNG frames or a single still PNG.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerSource {
    /// Frames of a directory, sorted by file name.
    Sequence {
        /// Directory the frames were enumerated from.
        dir: PathBuf,
        /// Frame paths in playback order.
        frames: Vec<PathBuf>,
    },
    /// A single image shown on every frame.
    Still {
        /// Image path.
        path: PathBuf,
    },
}

impl LayerSource {
    /// Resolve a user-supplied path into a layer.
    pub fn from_path(path: impl AsRef<Path>) -> LayercastResult<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|e| {
            LayercastError::input(format!("layer path '{}': {e}", path.display()))
        })?;

        if meta.is_dir() {
            let frames = list_pngs(path)?;
            if frames.is_empty() {
                return Err(LayercastError::validation(format!(
                    "the folder '{}' contains no PNG files",
                    path.display()
                )));
            }
            return Ok(Self::Sequence {
                dir: path.to_path_buf(),
                frames,
            });
        }

        if meta.is_file() && has_png_extension(path) {
            return Ok(Self::Still {
                path: path.to_path_buf(),
            });
        }

        Err(LayercastError::validation(format!(
            "layer '{}' must be a folder or a single PNG file",
            path.display()
        )))
    }

    /// Number of distinct frames (1 for stills).
    pub fn frame_len(&self) -> u64 {
        match self {
            Self::Sequence { frames, .. } => frames.len() as u64,
            Self::Still { .. } => 1,
        }
    }

    /// Return `true` for single-image layers.
    pub fn is_still(&self) -> bool {
        matches!(self, Self::Still { .. })
    }

    /// Path the layer was created from.
    pub fn origin(&self) -> &Path {
        match self {
            Self::Sequence { dir, .. } => dir,
            Self::Still { path } => path,
        }
    }

    /// Path backing `frame`; sequences clamp to their last frame.
    fn path_at(&self, frame: FrameIndex) -> &Path {
        match self {
            Self::Sequence { frames, .. } => {
                let last = frames.len().saturating_sub(1);
                let idx = usize::try_from(frame.0).map_or(last, |i| i.min(last));
                &frames[idx]
            }
            Self::Still { path } => path,
        }
    }

    fn all_paths(&self) -> Vec<&Path> {
        match self {
            Self::Sequence { frames, .. } => frames.iter().map(PathBuf::as_path).collect(),
            Self::Still { path } => vec![path.as_path()],
        }
    }
}

/// The ordered layer stack of one run, validated for length and frame size.
///
/// Layer 0 is the bottom (background) layer.
#[derive(Clone, Debug)]
pub struct FrameStack {
    layers: Vec<LayerSource>,
    frame_count: u64,
    canvas: Canvas,
}

impl FrameStack {
    /// Validate `layers` under `policy` and probe every frame header for a consistent size.
    ///
    /// All checks happen here, before any frame is composited or encoded.
    pub fn new(layers: Vec<LayerSource>, policy: LengthPolicy) -> LayercastResult<Self> {
        let Some(bottom) = layers.first() else {
            return Err(LayercastError::validation("at least one layer is required"));
        };
        for layer in &layers {
            if let LayerSource::Sequence { dir, frames } = layer
                && frames.is_empty()
            {
                return Err(LayercastError::validation(format!(
                    "the folder '{}' contains no PNG files",
                    dir.display()
                )));
            }
        }

        let sequence_lens: Vec<(usize, u64)> = layers
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.is_still())
            .map(|(i, l)| (i, l.frame_len()))
            .collect();

        let frame_count = match sequence_lens.iter().map(|&(_, n)| n).max() {
            None => 1,
            Some(longest) => {
                if policy == LengthPolicy::Strict
                    && let Some(&(idx, n)) = sequence_lens.iter().find(|&&(_, n)| n != longest)
                {
                    let (long_idx, _) = sequence_lens
                        .iter()
                        .find(|&&(_, n)| n == longest)
                        .copied()
                        .unwrap_or((0, longest));
                    return Err(LayercastError::validation(format!(
                        "layer {idx} has {n} frames but layer {long_idx} has {longest}; \
                         sequences must have matching length"
                    )));
                }
                longest
            }
        };

        let canvas = probe_dimensions(bottom.path_at(FrameIndex(0)))?;
        if canvas.width == 0 || canvas.height == 0 {
            return Err(LayercastError::validation("frame dimensions must be non-zero"));
        }

        verify_dimensions(&layers, canvas)?;

        tracing::debug!(
            layers = layers.len(),
            frame_count,
            width = canvas.width,
            height = canvas.height,
            "frame stack resolved"
        );

        Ok(Self {
            layers,
            frame_count,
            canvas,
        })
    }

    /// Resolve each path with [`LayerSource::from_path`] and build the stack.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P], policy: LengthPolicy) -> LayercastResult<Self> {
        let layers = paths
            .iter()
            .map(LayerSource::from_path)
            .collect::<LayercastResult<Vec<_>>>()?;
        Self::new(layers, policy)
    }

    /// Layers bottom to top.
    pub fn layers(&self) -> &[LayerSource] {
        &self.layers
    }

    /// Number of output frames.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Shared frame size of every layer.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Per-layer paths for `frame`, bottom to top.
    pub fn paths_for(&self, frame: FrameIndex) -> LayercastResult<Vec<&Path>> {
        if frame.0 >= self.frame_count {
            return Err(LayercastError::validation(format!(
                "frame {} out of range (frame count {})",
                frame.0, self.frame_count
            )));
        }
        Ok(self.layers.iter().map(|l| l.path_at(frame)).collect())
    }

    pub(crate) fn layer_path(&self, layer: usize, frame: FrameIndex) -> &Path {
        self.layers[layer].path_at(frame)
    }
}

fn verify_dimensions(layers: &[LayerSource], canvas: Canvas) -> LayercastResult<()> {
    let paths: Vec<&Path> = layers.iter().flat_map(LayerSource::all_paths).collect();
    paths.par_iter().try_for_each(|path| {
        let dims = probe_dimensions(path)?;
        if dims != canvas {
            return Err(LayercastError::validation(format!(
                "'{}' is {}x{}, expected {}x{}; all frames must share one size",
                path.display(),
                dims.width,
                dims.height,
                canvas.width,
                canvas.height
            )));
        }
        Ok(())
    })
}

fn list_pngs(dir: &Path) -> LayercastResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| LayercastError::input(format!("read dir '{}': {e}", dir.display())))?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| LayercastError::input(format!("read dir '{}': {e}", dir.display())))?;
        let path = entry.path();
        if path.is_file() && has_png_extension(&path) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

fn has_png_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
