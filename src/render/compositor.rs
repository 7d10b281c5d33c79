use std::borrow::Cow;

use crate::{
    assets::decode::decode_png,
    assets::source::FrameStack,
    effects::EffectConfig,
    effects::{blur::gaussian_blur_rgba8_premul, composite::over_in_place, fog::fog_in_place},
    foundation::core::{Canvas, FrameIndex},
    foundation::error::LayercastResult,
    render::frame::FrameRGBA,
};

/// Stateless per-frame compositor over a validated [`FrameStack`].
///
/// Each frame is built bottom-up: decode layer, blur and fog it when selected, then blend it
/// over the accumulator. Still layers are decoded and processed once up front.
#[derive(Debug)]
pub struct Compositor {
    stack: FrameStack,
    effects: EffectConfig,
    stills: Vec<Option<FrameRGBA>>,
}

impl Compositor {
    /// Validate `effects` against `stack` and prepare still layers.
    pub fn new(stack: FrameStack, effects: EffectConfig) -> LayercastResult<Self> {
        effects.validate(stack.layers().len())?;

        let canvas = stack.canvas();
        let mut stills = Vec::with_capacity(stack.layers().len());
        for (layer, source) in stack.layers().iter().enumerate() {
            if !source.is_still() {
                stills.push(None);
                continue;
            }
            let decoded = decode_png(source.origin())?;
            decoded.check_canvas(canvas, &format!("layer {layer} still"))?;
            stills.push(Some(apply_layer_effects(decoded, layer, &effects)?));
        }

        Ok(Self {
            stack,
            effects,
            stills,
        })
    }

    /// Underlying layer stack.
    pub fn stack(&self) -> &FrameStack {
        &self.stack
    }

    /// Effect settings in use.
    pub fn effects(&self) -> &EffectConfig {
        &self.effects
    }

    /// Output frame size.
    pub fn canvas(&self) -> Canvas {
        self.stack.canvas()
    }

    /// Number of frames this compositor produces.
    pub fn frame_count(&self) -> u64 {
        self.stack.frame_count()
    }

    /// Composite frame `frame` into a premultiplied RGBA8 buffer.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn composite_frame(&self, frame: FrameIndex) -> LayercastResult<FrameRGBA> {
        // Validates the index.
        self.stack.paths_for(frame)?;

        let canvas = self.canvas();
        let mut acc = FrameRGBA::transparent(canvas);
        for (layer, still) in self.stills.iter().enumerate() {
            let pixels: Cow<'_, FrameRGBA> = match still {
                Some(ready) => Cow::Borrowed(ready),
                None => {
                    let path = self.stack.layer_path(layer, frame);
                    let decoded = decode_png(path)?;
                    decoded.check_canvas(canvas, &format!("'{}'", path.display()))?;
                    Cow::Owned(apply_layer_effects(decoded, layer, &self.effects)?)
                }
            };
            over_in_place(&mut acc.data, &pixels.data, self.effects.opacity(layer))?;
        }
        Ok(acc)
    }
}

fn apply_layer_effects(
    mut frame: FrameRGBA,
    layer: usize,
    effects: &EffectConfig,
) -> LayercastResult<FrameRGBA> {
    if effects.blurs(layer) {
        frame.data =
            gaussian_blur_rgba8_premul(&frame.data, frame.width, frame.height, effects.blur)?;
    }
    if effects.fogs(layer) {
        fog_in_place(&mut frame.data, effects.fog_color, effects.fog);
    }
    Ok(frame)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
