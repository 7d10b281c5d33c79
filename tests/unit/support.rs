use std::path::{Path, PathBuf};

/// Fresh, empty scratch directory under `target/unit/<name>`.
pub(crate) fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write a solid-color straight-alpha RGBA PNG.
pub(crate) fn write_solid_png(path: &Path, width: u32, height: u32, rgba: [u8; 4]) {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// Write `count` solid frames named `frame_00000.png`.. into `dir`, colored by `color(i)`.
pub(crate) fn write_sequence(
    dir: &Path,
    count: u32,
    width: u32,
    height: u32,
    color: impl Fn(u32) -> [u8; 4],
) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        write_solid_png(
            &dir.join(format!("frame_{i:05}.png")),
            width,
            height,
            color(i),
        );
    }
    dir.to_path_buf()
}
