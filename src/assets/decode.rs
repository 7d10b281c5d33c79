use std::path::Path;

use crate::{
    foundation::core::Canvas,
    foundation::error::{LayercastError, LayercastResult},
    render::frame::FrameRGBA,
};

/// Decode a PNG file into a premultiplied RGBA8 frame.
pub fn decode_png(path: &Path) -> LayercastResult<FrameRGBA> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| LayercastError::input(format!("open '{}': {e}", path.display())))?;
    let dyn_img = reader
        .decode()
        .map_err(|e| LayercastError::input(format!("decode '{}': {e}", path.display())))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);

    Ok(FrameRGBA {
        width,
        height,
        data,
        premultiplied: true,
    })
}

/// Read only the PNG header to learn the frame size.
pub fn probe_dimensions(path: &Path) -> LayercastResult<Canvas> {
    let (width, height) = image::image_dimensions(path)
        .map_err(|e| LayercastError::input(format!("probe '{}': {e}", path.display())))?;
    Ok(Canvas { width, height })
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
