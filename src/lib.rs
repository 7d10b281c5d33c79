//! layercast composites stacked PNG frame sequences into a single MP4.
//!
//! A render is built in three steps:
//!
//! - Resolve layer paths into a validated [`FrameStack`]
//! - Wrap it with an [`EffectConfig`] in a [`Compositor`]
//! - Stream frames into a [`FrameSink`], or let [`render_to_mp4`] drive ffmpeg
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

/// JSON render jobs.
pub mod config;
pub(crate) mod effects;
pub(crate) mod encode;
pub(crate) mod render;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
mod test_support;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
pub use crate::foundation::error::{LayercastError, LayercastResult};

pub use crate::assets::decode::{decode_png, probe_dimensions};
pub use crate::assets::source::{FrameStack, LayerSource, LengthPolicy};
pub use crate::config::{RenderJob, parse_hex_rgb, parse_layer_opacity};
pub use crate::effects::EffectConfig;
pub use crate::effects::blur::{
    MAX_BLUR_SIGMA, blur_rgba8_premul, gaussian_blur_rgba8_premul, kernel_radius_for_sigma,
};
pub use crate::effects::composite::{
    PremulRgba8, flatten_premul_over_bg, over, over_in_place, over_solid_in_place,
};
pub use crate::effects::fog::fog_in_place;
pub use crate::encode::concat::{concat_list, concat_segments};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::png_seq::{FRAME_PATTERN, PngSequenceSink, encode_png_sequence, frame_file};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::encode::{ensure_parent_dir, is_ffmpeg_on_path};
pub use crate::render::compositor::Compositor;
pub use crate::render::frame::FrameRGBA;
pub use crate::render::pipeline::{
    EncoderStrategy, ProgressFn, RenderProgress, RenderStats, RenderThreading, RenderToMp4Opts,
    render_frame, render_frames_with_stats, render_png_sequence, render_segmented,
    render_to_mp4, render_to_sink,
};
