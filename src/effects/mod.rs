use std::collections::BTreeMap;

use crate::{
    effects::blur::MAX_BLUR_SIGMA,
    foundation::error::{LayercastError, LayercastResult},
};

pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod fog;

/// Effects applied uniformly to every frame of the selected layers.
///
/// Layer indices are 0-based, bottom layer first.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Gaussian blur sigma in pixels (0 = off).
    pub blur: f32,
    /// Layers the blur applies to.
    pub blur_layers: Vec<usize>,
    /// Fog opacity (0 = off, 255 = fully opaque fog).
    pub fog: u8,
    /// Fog color (straight RGB).
    pub fog_color: [u8; 3],
    /// Layers the fog applies to.
    pub fog_layers: Vec<usize>,
    /// Per-layer blend opacity in `0.0..=1.0`; unlisted layers blend at 1.0.
    pub layer_opacity: BTreeMap<usize, f32>,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            blur: 0.0,
            blur_layers: Vec::new(),
            fog: 0,
            fog_color: [255, 255, 255],
            fog_layers: Vec::new(),
            layer_opacity: BTreeMap::new(),
        }
    }
}

impl EffectConfig {
    /// Check values and layer references against a stack of `layer_count` layers.
    pub fn validate(&self, layer_count: usize) -> LayercastResult<()> {
        if !self.blur.is_finite() || !(0.0..=MAX_BLUR_SIGMA).contains(&self.blur) {
            return Err(LayercastError::validation(format!(
                "blur must be within 0..={MAX_BLUR_SIGMA}, got {}",
                self.blur
            )));
        }

        let check_layers = |what: &str, layers: &[usize]| {
            match layers.iter().find(|&&l| l >= layer_count) {
                Some(bad) => Err(LayercastError::validation(format!(
                    "{what} layer {bad} does not exist ({layer_count} layers, 0-based)"
                ))),
                None => Ok(()),
            }
        };
        check_layers("blur", &self.blur_layers)?;
        check_layers("fog", &self.fog_layers)?;

        for (&layer, &opacity) in &self.layer_opacity {
            if layer >= layer_count {
                return Err(LayercastError::validation(format!(
                    "opacity layer {layer} does not exist ({layer_count} layers, 0-based)"
                )));
            }
            if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
                return Err(LayercastError::validation(format!(
                    "opacity for layer {layer} must be within 0.0..=1.0, got {opacity}"
                )));
            }
        }

        if self.blur > 0.0 && self.blur_layers.is_empty() {
            tracing::warn!("blur is set but no blur layers are selected");
        }
        if self.fog > 0 && self.fog_layers.is_empty() {
            tracing::warn!("fog is set but no fog layers are selected");
        }
        Ok(())
    }

    /// Return `true` when `layer` gets a non-trivial blur.
    pub fn blurs(&self, layer: usize) -> bool {
        self.blur > 0.0 && self.blur_layers.contains(&layer)
    }

    /// Return `true` when `layer` gets a non-trivial fog.
    pub fn fogs(&self, layer: usize) -> bool {
        self.fog > 0 && self.fog_layers.contains(&layer)
    }

    /// Blend opacity for `layer`.
    pub fn opacity(&self, layer: usize) -> f32 {
        self.layer_opacity.get(&layer).copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/config.rs"]
mod tests;
