use std::str::FromStr;

use crate::foundation::error::{LayercastError, LayercastResult};

/// Absolute 0-based frame index into the layer sequences.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Half-open frame range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// Inclusive range start.
    pub start: FrameIndex,
    /// Exclusive range end.
    pub end: FrameIndex, // exclusive
}

impl FrameRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> LayercastResult<Self> {
        if start.0 > end.0 {
            return Err(LayercastError::validation(
                "FrameRange start must be <= end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Range covering `[0, len)`.
    pub fn from_len(len: u64) -> Self {
        Self {
            start: FrameIndex(0),
            end: FrameIndex(len),
        }
    }

    /// Number of frames contained in the range.
    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Return `true` when the range has no frames.
    pub fn is_empty(self) -> bool {
        self.start.0 >= self.end.0
    }

    /// Return `true` when `f` is inside `[start, end)`.
    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }

    /// Iterate the frame indices of this range in order.
    pub fn iter(self) -> impl Iterator<Item = FrameIndex> {
        (self.start.0..self.end.0).map(FrameIndex)
    }

    /// Split into at most `parts` disjoint, contiguous, non-empty slices that cover the range in
    /// order. Slice lengths differ by at most one; earlier slices take the remainder.
    pub fn split_contiguous(self, parts: usize) -> LayercastResult<Vec<FrameRange>> {
        if parts == 0 {
            return Err(LayercastError::validation(
                "split_contiguous requires at least one part",
            ));
        }
        let len = self.len_frames();
        if len == 0 {
            return Ok(Vec::new());
        }

        let parts = (parts as u64).min(len);
        let base = len / parts;
        let extra = len % parts;

        let mut out = Vec::with_capacity(parts as usize);
        let mut cursor = self.start.0;
        for i in 0..parts {
            let size = base + u64::from(i < extra);
            out.push(FrameRange {
                start: FrameIndex(cursor),
                end: FrameIndex(cursor + size),
            });
            cursor += size;
        }
        Ok(out)
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> LayercastResult<Self> {
        if den == 0 {
            return Err(LayercastError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(LayercastError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * f64::from(self.den) / f64::from(self.num)
    }

    /// `num/den` form accepted by ffmpeg's `-r` and `-framerate`.
    pub fn ffmpeg_arg(self) -> String {
        format!("{}/{}", self.num, self.den)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

impl FromStr for Fps {
    type Err = LayercastError;

    /// Parse `"30"` or `"30000/1001"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| LayercastError::validation(format!("invalid fps '{s}': {e}")))
        };
        match s.split_once('/') {
            Some((num, den)) => Fps::new(parse(num)?, parse(den)?),
            None => Fps::new(parse(s)?, 1),
        }
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Byte length of one tightly packed RGBA8 frame.
    pub fn rgba_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
