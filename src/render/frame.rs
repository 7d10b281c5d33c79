use std::path::Path;

use anyhow::Context as _;

use crate::{
    effects::composite::{flatten_premul_over_bg, unpremultiply_rgba8_in_place},
    foundation::core::Canvas,
    foundation::error::{LayercastError, LayercastResult},
};

/// A frame as RGBA8 pixels.
///
/// Frames flowing through the compositor are **premultiplied alpha**. The `premultiplied` flag
/// keeps that explicit at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent premultiplied frame of the given size.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; canvas.rgba_len()],
            premultiplied: true,
        }
    }

    /// Frame dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    pub(crate) fn check_canvas(&self, expected: Canvas, what: &str) -> LayercastResult<()> {
        if self.canvas() != expected {
            return Err(LayercastError::validation(format!(
                "{what} is {}x{}, expected {}x{}",
                self.width, self.height, expected.width, expected.height
            )));
        }
        if self.data.len() != expected.rgba_len() {
            return Err(LayercastError::validation(format!(
                "{what} data size mismatch with width*height*4"
            )));
        }
        Ok(())
    }

    /// Write the frame as an RGBA PNG with straight alpha.
    pub fn save_png(&self, path: &Path) -> LayercastResult<()> {
        let mut straight = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut straight);
        }
        crate::encode::ensure_parent_dir(path)?;
        image::save_buffer_with_format(
            path,
            &straight,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }

    /// Write the frame flattened over `bg_rgba` as an opaque RGB PNG.
    pub fn save_opaque_png(&self, path: &Path, bg_rgba: [u8; 4]) -> LayercastResult<()> {
        let mut rgba = vec![0u8; self.data.len()];
        if self.premultiplied {
            flatten_premul_over_bg(&mut rgba, &self.data, bg_rgba)?;
        } else {
            let mut premul = self.data.clone();
            crate::assets::decode::premultiply_rgba8_in_place(&mut premul);
            flatten_premul_over_bg(&mut rgba, &premul, bg_rgba)?;
        }
        let rgb: Vec<u8> = rgba
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        image::save_buffer_with_format(
            path,
            &rgb,
            self.width,
            self.height,
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}
