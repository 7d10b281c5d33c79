use super::*;
use crate::test_support::{scratch_dir, write_solid_png};

#[test]
fn decode_png_dimensions_and_premul() {
    let dir = scratch_dir("decode_premul");
    let path = dir.join("px.png");
    write_solid_png(&path, 3, 2, [100, 50, 200, 128]);

    let frame = decode_png(&path).unwrap();
    assert_eq!((frame.width, frame.height), (3, 2));
    assert!(frame.premultiplied);
    assert_eq!(
        &frame.data[..4],
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );

    assert_eq!(
        probe_dimensions(&path).unwrap(),
        Canvas {
            width: 3,
            height: 2
        }
    );
}

#[test]
fn missing_and_corrupt_files_are_input_errors() {
    let dir = scratch_dir("decode_errors");
    let missing = dir.join("nope.png");
    assert!(matches!(
        decode_png(&missing),
        Err(LayercastError::Input(_))
    ));

    let corrupt = dir.join("corrupt.png");
    std::fs::write(&corrupt, b"definitely not a png").unwrap();
    let err = decode_png(&corrupt).unwrap_err();
    assert!(matches!(err, LayercastError::Input(_)));
    assert!(err.to_string().contains("corrupt.png"));
}

#[test]
fn premultiply_zeroes_transparent_color() {
    let mut px = vec![200u8, 100, 50, 0, 10, 20, 30, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0, 10, 20, 30, 255]);
}
