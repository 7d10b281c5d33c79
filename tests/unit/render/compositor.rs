use super::*;
use crate::{
    assets::source::LengthPolicy,
    test_support::{scratch_dir, write_sequence, write_solid_png},
};

fn two_layer_stack(name: &str, frames: u32) -> FrameStack {
    let dir = scratch_dir(name);
    let bg = write_sequence(&dir.join("bg"), frames, 4, 2, |i| [0, 0, (i * 10) as u8, 255]);
    let fg = write_sequence(&dir.join("fg"), frames, 4, 2, |_| [255, 0, 0, 128]);
    FrameStack::from_paths(&[bg, fg], LengthPolicy::Strict).unwrap()
}

#[test]
fn foreground_blends_over_background() {
    let comp = Compositor::new(two_layer_stack("comp_blend", 2), EffectConfig::default()).unwrap();
    let frame = comp.composite_frame(FrameIndex(0)).unwrap();
    assert_eq!(frame.canvas(), comp.canvas());
    assert!(frame.premultiplied);
    // Red at 128/255 over opaque black.
    assert_eq!(&frame.data[..4], &[128, 0, 0, 255]);
}

#[test]
fn compositing_is_deterministic() {
    let effects = EffectConfig {
        blur: 1.0,
        blur_layers: vec![1],
        fog: 60,
        fog_layers: vec![0],
        ..EffectConfig::default()
    };
    let comp = Compositor::new(two_layer_stack("comp_determinism", 3), effects).unwrap();
    for f in 0..3 {
        let a = comp.composite_frame(FrameIndex(f)).unwrap();
        let b = comp.composite_frame(FrameIndex(f)).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn zero_opacity_layer_is_invisible() {
    let mut effects = EffectConfig::default();
    effects.layer_opacity.insert(1, 0.0);
    let comp = Compositor::new(two_layer_stack("comp_opacity", 1), effects).unwrap();
    let frame = comp.composite_frame(FrameIndex(0)).unwrap();
    assert_eq!(&frame.data[..4], &[0, 0, 0, 255]);
}

#[test]
fn fog_on_background_shows_through_translucent_foreground() {
    let effects = EffectConfig {
        fog: 255,
        fog_color: [0, 255, 0],
        fog_layers: vec![0],
        ..EffectConfig::default()
    };
    let comp = Compositor::new(two_layer_stack("comp_fog", 1), effects).unwrap();
    let frame = comp.composite_frame(FrameIndex(0)).unwrap();
    assert_eq!(frame.data[3], 255);
    assert!(frame.data[1] > 100, "green fog should survive the blend");
}

#[test]
fn still_layers_are_reused_for_every_frame() {
    let dir = scratch_dir("comp_still");
    let bg = dir.join("bg.png");
    write_solid_png(&bg, 4, 2, [0, 0, 255, 255]);
    let fg = write_sequence(&dir.join("fg"), 3, 4, 2, |i| [255, 255, 255, (i * 100) as u8]);
    let stack = FrameStack::from_paths(&[bg, fg], LengthPolicy::Strict).unwrap();
    let comp = Compositor::new(stack, EffectConfig::default()).unwrap();

    assert_eq!(comp.frame_count(), 3);
    let first = comp.composite_frame(FrameIndex(0)).unwrap();
    assert_eq!(&first.data[..4], &[0, 0, 255, 255]);
    let last = comp.composite_frame(FrameIndex(2)).unwrap();
    assert_ne!(first, last);
}

#[test]
fn invalid_effect_layer_fails_construction() {
    let effects = EffectConfig {
        fog: 10,
        fog_layers: vec![5],
        ..EffectConfig::default()
    };
    assert!(Compositor::new(two_layer_stack("comp_bad_layer", 1), effects).is_err());
}

#[test]
fn out_of_range_frame_is_rejected() {
    let comp = Compositor::new(two_layer_stack("comp_range", 2), EffectConfig::default()).unwrap();
    assert!(comp.composite_frame(FrameIndex(2)).is_err());
}
