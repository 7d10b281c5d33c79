use super::*;

#[test]
fn frame_files_match_the_ffmpeg_pattern() {
    let dir = Path::new("frames");
    assert_eq!(frame_file(dir, 0), dir.join("frame_00000.png"));
    assert_eq!(frame_file(dir, 123), dir.join("frame_00123.png"));
    assert_eq!(FRAME_PATTERN.replace("%05d", "00007"), "frame_00007.png");
}

#[test]
fn existing_output_is_not_clobbered() {
    let dir = crate::test_support::scratch_dir("png_seq_no_overwrite");
    let out = dir.join("out.mp4");
    std::fs::write(&out, b"keep").unwrap();
    assert!(encode_png_sequence(&dir, Fps::default(), &out, false, None).is_err());
    assert_eq!(std::fs::read(&out).unwrap(), b"keep");
}

#[test]
fn sink_numbers_files_from_first_pushed_frame() {
    let dir = crate::test_support::scratch_dir("png_seq_sink");
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: [0u8, 0, 0, 0].repeat(4),
        premultiplied: true,
    };
    let mut sink = PngSequenceSink::new(&dir, [10, 20, 30, 255]);
    sink.begin(SinkConfig {
        width: 2,
        height: 2,
        fps: Fps::default(),
    })
    .unwrap();
    sink.push_frame(FrameIndex(5), &frame).unwrap();
    sink.push_frame(FrameIndex(6), &frame).unwrap();
    assert!(sink.push_frame(FrameIndex(6), &frame).is_err());
    sink.end().unwrap();

    assert_eq!(sink.frames_written(), 2);
    let first = image::open(frame_file(&dir, 0)).unwrap().to_rgb8();
    assert_eq!(first.get_pixel(1, 1).0, [10, 20, 30]);
    assert!(frame_file(&dir, 1).exists());
    assert!(!frame_file(&dir, 2).exists());
}

#[test]
fn sink_rejects_frames_before_begin() {
    let frame = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![0; 4],
        premultiplied: true,
    };
    let mut sink = PngSequenceSink::new("target/unit/png_seq_unstarted", [0, 0, 0, 255]);
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
}
