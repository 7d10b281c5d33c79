use super::*;
use crate::test_support::{scratch_dir, write_sequence, write_solid_png};

#[test]
fn directory_layers_are_sorted_and_filtered() {
    let dir = scratch_dir("source_sorted");
    write_sequence(&dir, 3, 4, 4, |_| [0, 0, 0, 255]);
    std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();

    let layer = LayerSource::from_path(&dir).unwrap();
    let LayerSource::Sequence { frames, .. } = &layer else {
        panic!("expected a sequence layer");
    };
    let names: Vec<_> = frames
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["frame_00000.png", "frame_00001.png", "frame_00002.png"]
    );
    assert_eq!(layer.frame_len(), 3);
}

#[test]
fn empty_directory_and_non_png_file_are_rejected() {
    let dir = scratch_dir("source_rejects");
    let empty = dir.join("empty");
    std::fs::create_dir_all(&empty).unwrap();
    assert!(matches!(
        LayerSource::from_path(&empty),
        Err(LayercastError::Validation(_))
    ));

    let txt = dir.join("layer.txt");
    std::fs::write(&txt, b"x").unwrap();
    assert!(matches!(
        LayerSource::from_path(&txt),
        Err(LayercastError::Validation(_))
    ));

    assert!(matches!(
        LayerSource::from_path(dir.join("missing")),
        Err(LayercastError::Input(_))
    ));
}

#[test]
fn strict_policy_rejects_mismatched_lengths() {
    let dir = scratch_dir("source_strict");
    let bg = write_sequence(&dir.join("bg"), 4, 4, 4, |_| [0, 0, 0, 255]);
    let fg = write_sequence(&dir.join("fg"), 3, 4, 4, |_| [255, 0, 0, 128]);

    let err = FrameStack::from_paths(&[&bg, &fg], LengthPolicy::Strict).unwrap_err();
    assert!(err.to_string().contains("matching length"));

    let stack = FrameStack::from_paths(&[&bg, &fg], LengthPolicy::PadLast).unwrap();
    assert_eq!(stack.frame_count(), 4);
    let last = stack.paths_for(FrameIndex(3)).unwrap();
    assert!(last[1].ends_with("frame_00002.png"));
}

#[test]
fn still_layers_broadcast_over_sequences() {
    let dir = scratch_dir("source_still");
    let bg = dir.join("bg.png");
    write_solid_png(&bg, 6, 2, [1, 2, 3, 255]);
    let fg = write_sequence(&dir.join("fg"), 5, 6, 2, |_| [0, 0, 0, 0]);

    let stack = FrameStack::from_paths(&[&bg, &fg], LengthPolicy::Strict).unwrap();
    assert_eq!(stack.frame_count(), 5);
    assert_eq!(
        stack.canvas(),
        Canvas {
            width: 6,
            height: 2
        }
    );
    for f in 0..5 {
        assert_eq!(stack.paths_for(FrameIndex(f)).unwrap()[0], bg.as_path());
    }
    assert!(stack.paths_for(FrameIndex(5)).is_err());
}

#[test]
fn mismatched_frame_sizes_fail_up_front() {
    let dir = scratch_dir("source_sizes");
    let bg = write_sequence(&dir.join("bg"), 2, 4, 4, |_| [0, 0, 0, 255]);
    let fg = write_sequence(&dir.join("fg"), 2, 4, 4, |_| [0, 0, 0, 255]);
    write_solid_png(&fg.join("frame_00001.png"), 8, 4, [0, 0, 0, 255]);

    let err = FrameStack::from_paths(&[&bg, &fg], LengthPolicy::Strict).unwrap_err();
    assert!(err.to_string().contains("8x4"));
}

#[test]
fn empty_stack_is_rejected() {
    assert!(FrameStack::new(Vec::new(), LengthPolicy::Strict).is_err());
}

#[test]
fn hand_built_empty_sequence_is_rejected() {
    let dir = scratch_dir("source_empty_seq");
    let bg = write_sequence(&dir.join("bg"), 3, 2, 2, |_| [0, 0, 0, 255]);
    let empty = LayerSource::Sequence {
        dir: dir.join("nothing"),
        frames: Vec::new(),
    };

    let err = FrameStack::new(vec![empty.clone()], LengthPolicy::Strict).unwrap_err();
    assert!(matches!(err, LayercastError::Validation(_)));
    assert!(err.to_string().contains("contains no PNG files"), "{err}");

    let bg = LayerSource::from_path(&bg).unwrap();
    let err = FrameStack::new(vec![bg, empty], LengthPolicy::PadLast).unwrap_err();
    assert!(err.to_string().contains("nothing"), "{err}");
}
