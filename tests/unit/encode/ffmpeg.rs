use super::*;
use crate::foundation::core::Fps;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::default(),
    }
}

#[test]
fn begin_rejects_odd_or_empty_dimensions() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/unit/never.mp4"));
    assert!(matches!(
        sink.begin(cfg(11, 10)),
        Err(LayercastError::Validation(_))
    ));
    assert!(matches!(
        sink.begin(cfg(0, 10)),
        Err(LayercastError::Validation(_))
    ));
}

#[test]
fn push_before_begin_is_an_encode_error() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/unit/never.mp4"));
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(matches!(
        sink.push_frame(FrameIndex(0), &frame),
        Err(LayercastError::Encode(_))
    ));
    assert!(sink.end().is_err());
}

#[test]
fn existing_output_is_kept_without_overwrite() {
    let dir = crate::test_support::scratch_dir("ffmpeg_no_overwrite");
    let out = dir.join("out.mp4");
    std::fs::write(&out, b"keep me").unwrap();

    let mut opts = FfmpegSinkOpts::new(&out);
    opts.overwrite = false;
    let mut sink = FfmpegSink::new(opts);
    assert!(matches!(
        sink.begin(cfg(2, 2)),
        Err(LayercastError::Validation(_))
    ));
    assert_eq!(std::fs::read(&out).unwrap(), b"keep me");
}

#[test]
fn pipe_encodes_frames_when_ffmpeg_is_available() {
    if !crate::encode::is_ffmpeg_on_path() {
        return;
    }
    let dir = crate::test_support::scratch_dir("ffmpeg_pipe");
    let out = dir.join("out.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(cfg(4, 4)).unwrap();
    for i in 0..3u64 {
        let frame = FrameRGBA {
            width: 4,
            height: 4,
            data: vec![(i * 60) as u8; 64],
            premultiplied: true,
        };
        sink.push_frame(FrameIndex(i), &frame).unwrap();
    }
    let stale = FrameRGBA {
        width: 4,
        height: 4,
        data: vec![0; 64],
        premultiplied: true,
    };
    assert!(sink.push_frame(FrameIndex(1), &stale).is_err());
    sink.end().unwrap();
    assert_eq!(sink.frames_written(), 3);
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}
