use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::{
    assets::source::{FrameStack, LayerSource, LengthPolicy},
    effects::EffectConfig,
    foundation::core::Fps,
    foundation::error::{LayercastError, LayercastResult},
    render::compositor::Compositor,
    render::pipeline::{EncoderStrategy, RenderThreading, RenderToMp4Opts},
};

/// Highest x264 constant rate factor accepted.
pub const MAX_CRF: u8 = 51;

/// A complete render description, loadable from a JSON job file.
///
/// Every field has a default so job files only need to name what they change.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderJob {
    /// Layer sources, bottom layer first.
    pub layers: Vec<PathBuf>,
    /// Output MP4 (or PNG for single-frame previews).
    pub out: Option<PathBuf>,
    /// Output frame rate.
    pub fps: Fps,
    /// Blur, fog and per-layer opacity.
    pub effects: EffectConfig,
    /// How differing sequence lengths are handled.
    pub length_policy: LengthPolicy,
    /// How frames reach ffmpeg.
    pub encoder: EncoderStrategy,
    /// Replace an existing output file.
    pub overwrite: bool,
    /// Background the composite is flattened over (straight RGBA).
    pub bg_rgba: [u8; 4],
    /// Optional x264 constant rate factor.
    pub crf: Option<u8>,
    /// In-process compositing threads.
    pub threading: RenderThreading,
}

impl Default for RenderJob {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            out: None,
            fps: Fps::default(),
            effects: EffectConfig::default(),
            length_policy: LengthPolicy::default(),
            encoder: EncoderStrategy::default(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
            crf: None,
            threading: RenderThreading::default(),
        }
    }
}

impl RenderJob {
    /// Load a job from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> LayercastResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            LayercastError::input(format!("open job file '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            LayercastError::serde(format!("parse job file '{}': {e}", path.display()))
        })
    }

    /// Parse a job from a JSON string.
    pub fn from_json(json: &str) -> LayercastResult<Self> {
        serde_json::from_str(json).map_err(|e| LayercastError::serde(format!("parse job: {e}")))
    }

    /// Pretty JSON form, suitable for writing back as a job file.
    pub fn to_json(&self) -> LayercastResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LayercastError::serde(format!("serialize job: {e}")))
    }

    /// Check the job without touching the file system.
    pub fn validate(&self) -> LayercastResult<()> {
        self.validate_settings()?;
        self.effects.validate(self.layers.len())
    }

    /// Everything [`RenderJob::validate`] checks except the effect settings.
    fn validate_settings(&self) -> LayercastResult<()> {
        if self.layers.is_empty() {
            return Err(LayercastError::validation("at least one layer is required"));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(LayercastError::validation(format!(
                "fps must be positive, got {}",
                self.fps.ffmpeg_arg()
            )));
        }
        if let EncoderStrategy::Segmented { workers } = self.encoder
            && workers == 0
        {
            return Err(LayercastError::validation(
                "segmented encoder needs at least one worker",
            ));
        }
        if self.threading.threads == Some(0) {
            return Err(LayercastError::validation(
                "render threading 'threads' must be >= 1 when set",
            ));
        }
        if let Some(crf) = self.crf
            && crf > MAX_CRF
        {
            return Err(LayercastError::validation(format!(
                "crf must be within 0..={MAX_CRF}, got {crf}"
            )));
        }
        Ok(())
    }

    /// Resolve the layer paths into a validated [`FrameStack`].
    pub fn frame_stack(&self) -> LayercastResult<FrameStack> {
        let layers = self
            .layers
            .iter()
            .map(LayerSource::from_path)
            .collect::<LayercastResult<Vec<_>>>()?;
        FrameStack::new(layers, self.length_policy)
    }

    /// Validate the job and build a ready [`Compositor`].
    pub fn compositor(&self) -> LayercastResult<Compositor> {
        // Effects are checked by `Compositor::new` once the stack is known.
        self.validate_settings()?;
        Compositor::new(self.frame_stack()?, self.effects.clone())
    }

    /// Encoder options carried by this job.
    pub fn mp4_opts(&self) -> RenderToMp4Opts {
        RenderToMp4Opts {
            fps: self.fps,
            strategy: self.encoder,
            overwrite: self.overwrite,
            bg_rgba: self.bg_rgba,
            crf: self.crf,
            threading: self.threading.clone(),
        }
    }
}

/// Parse `RRGGBB` (optionally prefixed with `#`) into an RGB triple.
pub fn parse_hex_rgb(s: &str) -> LayercastResult<[u8; 3]> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(LayercastError::validation(format!(
            "color '{s}' must be six hex digits (RRGGBB)"
        )));
    }
    let mut out = [0u8; 3];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| {
            LayercastError::validation(format!("color '{s}' must be six hex digits (RRGGBB)"))
        })?;
    }
    Ok(out)
}

/// Parse a `LAYER=OPACITY` assignment such as `1=0.5`.
pub fn parse_layer_opacity(s: &str) -> LayercastResult<(usize, f32)> {
    let bad = || LayercastError::validation(format!("opacity '{s}' must look like LAYER=VALUE"));
    let (layer, value) = s.split_once('=').ok_or_else(bad)?;
    let layer = layer.trim().parse::<usize>().map_err(|_| bad())?;
    let value = value.trim().parse::<f32>().map_err(|_| bad())?;
    Ok((layer, value))
}

#[cfg(test)]
#[path = "../tests/unit/config/job.rs"]
mod tests;
