use crate::foundation::error::{LayercastError, LayercastResult};

/// Largest accepted blur sigma, in pixels.
pub const MAX_BLUR_SIGMA: f32 = 64.0;

/// Kernel radius covering +/- 3 sigma, or 0 when blur is off.
pub fn kernel_radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil().max(1.0) as u32
}

/// Gaussian blur of a premultiplied RGBA8 buffer with standard deviation `sigma` pixels.
///
/// `sigma == 0` returns the input unchanged.
pub fn gaussian_blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    sigma: f32,
) -> LayercastResult<Vec<u8>> {
    if !sigma.is_finite() || !(0.0..=MAX_BLUR_SIGMA).contains(&sigma) {
        return Err(LayercastError::validation(format!(
            "blur sigma must be within 0..={MAX_BLUR_SIGMA}, got {sigma}"
        )));
    }
    blur_rgba8_premul(src, width, height, kernel_radius_for_sigma(sigma), sigma)
}

/// Separable blur with an explicit kernel radius. Edges clamp to the nearest pixel.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> LayercastResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| LayercastError::validation("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(LayercastError::validation(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    let w = width as usize;
    let h = height as usize;

    // Horizontal: each row blurs independently.
    for (src_row, dst_row) in src.chunks_exact(w * 4).zip(tmp.chunks_exact_mut(w * 4)) {
        convolve_line(dst_row, w, &kernel, |i| {
            let px = &src_row[i * 4..i * 4 + 4];
            [px[0], px[1], px[2], px[3]]
        });
    }

    // Vertical: gather one column at a time.
    let mut column = vec![0u8; h * 4];
    for x in 0..w {
        convolve_line(&mut column, h, &kernel, |y| {
            let idx = (y * w + x) * 4;
            [tmp[idx], tmp[idx + 1], tmp[idx + 2], tmp[idx + 3]]
        });
        for y in 0..h {
            let idx = (y * w + x) * 4;
            out[idx..idx + 4].copy_from_slice(&column[y * 4..y * 4 + 4]);
        }
    }

    Ok(out)
}

fn convolve_line(dst: &mut [u8], len: usize, kernel: &[u32], sample: impl Fn(usize) -> [u8; 4]) {
    let radius = (kernel.len() / 2) as isize;
    let last = len as isize - 1;
    for i in 0..len {
        let mut acc = [0u64; 4];
        for (ki, &kw) in kernel.iter().enumerate() {
            let si = (i as isize + ki as isize - radius).clamp(0, last) as usize;
            let px = sample(si);
            for c in 0..4 {
                acc[c] += u64::from(kw) * u64::from(px[c]);
            }
        }
        for c in 0..4 {
            dst[i * 4 + c] = q16_to_u8(acc[c]);
        }
    }
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> LayercastResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(LayercastError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(LayercastError::validation("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|&wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Push rounding drift into the center tap so the kernel sums to exactly 1.0 in Q16.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
