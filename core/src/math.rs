//! Numeric kernels of the forward pass, as free functions over flat slices.
//!
//! Layout: feature maps are CHW row-major (`c * h * w + y * w + x`).
//! Every kernel validates slice lengths against its dimension arguments and
//! returns an error instead of indexing out of bounds.
//!
//! Accumulation order is fixed (ascending channel, kernel row, kernel
//! column / ascending input index, bias added last), so identical inputs
//! always give bit-identical outputs. Nothing here clamps or filters NaN:
//! numeric anomalies flow through unchanged.

use crate::error::{Error, Result};
use crate::layers::{Activation, PoolKind, Remainder, WeightLayout};
use crate::preprocess::{Normalization, PaddingPolicy};

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::ParameterLength { what, expected, actual });
    }
    Ok(())
}

// =============================================================================
// Padding & Normalization
// =============================================================================

/// Same-convolution pad width for one kernel dimension: `(k - 1) / 2`.
///
/// Even kernel sizes have no symmetric pad and are rejected.
pub fn pad_width(kernel_dim: usize) -> Result<usize> {
    if kernel_dim == 0 {
        return Err(Error::ZeroDimension { what: "kernel dimension" });
    }
    if kernel_dim % 2 == 0 {
        return Err(Error::EvenKernel { rows: kernel_dim, cols: kernel_dim });
    }
    Ok((kernel_dim - 1) / 2)
}

/// Check both kernel dimensions at once, reporting the full kernel size.
pub fn check_odd_kernel(kernel_rows: usize, kernel_cols: usize) -> Result<()> {
    if kernel_rows == 0 || kernel_cols == 0 {
        return Err(Error::ZeroDimension { what: "kernel dimension" });
    }
    if kernel_rows % 2 == 0 || kernel_cols % 2 == 0 {
        return Err(Error::EvenKernel { rows: kernel_rows, cols: kernel_cols });
    }
    Ok(())
}

/// Padded spatial size: `(rows + kh - 1, cols + kw - 1)`.
pub fn padded_size(
    rows: usize, cols: usize,
    kernel_rows: usize, kernel_cols: usize,
) -> Result<(usize, usize)> {
    check_odd_kernel(kernel_rows, kernel_cols)?;
    Ok((rows + kernel_rows - 1, cols + kernel_cols - 1))
}

/// Normalize every sample of `input` into `output`.
pub fn normalize(input: &[f32], output: &mut [f32], norm: &Normalization) -> Result<()> {
    check_len("normalization output", input.len(), output.len())?;
    for (dst, &src) in output.iter_mut().zip(input) {
        *dst = norm.apply(src);
    }
    Ok(())
}

/// Pad a CHW map symmetrically for an odd `kernel_rows x kernel_cols` kernel.
///
/// Output: `[channels x (h + kh - 1) x (w + kw - 1)]`. The interior is an
/// exact copy of the input; the border follows `policy`.
pub fn pad(
    input: &[f32],
    output: &mut [f32],
    channels: usize,
    in_h: usize,
    in_w: usize,
    kernel_rows: usize,
    kernel_cols: usize,
    policy: PaddingPolicy,
) -> Result<()> {
    check_odd_kernel(kernel_rows, kernel_cols)?;
    if in_h == 0 || in_w == 0 {
        return Err(Error::ZeroDimension { what: "padding input" });
    }
    let pad_h = (kernel_rows - 1) / 2;
    let pad_w = (kernel_cols - 1) / 2;
    let out_h = in_h + 2 * pad_h;
    let out_w = in_w + 2 * pad_w;

    check_len("padding input", channels * in_h * in_w, input.len())?;
    check_len("padding output", channels * out_h * out_w, output.len())?;

    for c in 0..channels {
        let src = &input[c * in_h * in_w..(c + 1) * in_h * in_w];
        let dst = &mut output[c * out_h * out_w..(c + 1) * out_h * out_w];
        for y in 0..out_h {
            let sy = y as isize - pad_h as isize;
            for x in 0..out_w {
                let sx = x as isize - pad_w as isize;
                let inside = sy >= 0 && sy < in_h as isize && sx >= 0 && sx < in_w as isize;
                dst[y * out_w + x] = if inside {
                    src[sy as usize * in_w + sx as usize]
                } else {
                    match policy {
                        PaddingPolicy::Zero => 0.0,
                        PaddingPolicy::Edge => {
                            let cy = sy.clamp(0, in_h as isize - 1) as usize;
                            let cx = sx.clamp(0, in_w as isize - 1) as usize;
                            src[cy * in_w + cx]
                        }
                    }
                };
            }
        }
    }
    Ok(())
}

// =============================================================================
// Convolution
// =============================================================================

/// Valid 2D convolution over an already padded CHW input.
///
/// Input:  `[in_ch x in_h x in_w]` (padded)
/// Kernel: `[out_ch x in_ch x kh x kw]`
/// Bias:   `[out_ch]`
/// Output: `[out_ch x (in_h - kh + 1) x (in_w - kw + 1)]`
///
/// With the input padded by `(k - 1) / 2` per side, the output has the
/// spatial size of the unpadded map.
pub fn conv2d_valid(
    input: &[f32],
    kernel: &[f32],
    bias: &[f32],
    output: &mut [f32],
    in_ch: usize,
    in_h: usize,
    in_w: usize,
    out_ch: usize,
    kh: usize,
    kw: usize,
) -> Result<()> {
    if kh == 0 || kw == 0 {
        return Err(Error::ZeroDimension { what: "kernel dimension" });
    }
    if kh > in_h || kw > in_w {
        return Err(Error::ParameterLength {
            what: "convolution input rows",
            expected: kh,
            actual: in_h,
        });
    }
    let out_h = in_h - kh + 1;
    let out_w = in_w - kw + 1;
    let k_per_filter = in_ch * kh * kw;

    check_len("convolution input", in_ch * in_h * in_w, input.len())?;
    check_len("kernel weights", out_ch * k_per_filter, kernel.len())?;
    check_len("kernel biases", out_ch, bias.len())?;
    check_len("convolution output", out_ch * out_h * out_w, output.len())?;

    for o in 0..out_ch {
        let filter = &kernel[o * k_per_filter..(o + 1) * k_per_filter];
        for y in 0..out_h {
            for x in 0..out_w {
                let mut acc = 0.0f32;
                for c in 0..in_ch {
                    let plane = &input[c * in_h * in_w..(c + 1) * in_h * in_w];
                    let taps = &filter[c * kh * kw..(c + 1) * kh * kw];
                    for ky in 0..kh {
                        let row = &plane[(y + ky) * in_w + x..(y + ky) * in_w + x + kw];
                        let weights = &taps[ky * kw..(ky + 1) * kw];
                        for (w, v) in weights.iter().zip(row) {
                            acc += w * v;
                        }
                    }
                }
                output[o * out_h * out_w + y * out_w + x] = acc + bias[o];
            }
        }
    }
    Ok(())
}

// =============================================================================
// Activation
// =============================================================================

/// Apply `act` to every element in place.
///
/// Comparisons are written so that NaN never matches a branch and is kept.
pub fn activate(data: &mut [f32], act: Activation) {
    match act {
        Activation::Identity => {}
        Activation::Relu => {
            for v in data.iter_mut() {
                if *v < 0.0 {
                    *v = 0.0;
                }
            }
        }
        Activation::ClippedRelu { ceiling } => {
            for v in data.iter_mut() {
                if *v < 0.0 {
                    *v = 0.0;
                } else if *v > ceiling {
                    *v = ceiling;
                }
            }
        }
        Activation::Sigmoid => {
            for v in data.iter_mut() {
                *v = 1.0 / (1.0 + libm::expf(-*v));
            }
        }
        Activation::Tanh => {
            for v in data.iter_mut() {
                *v = libm::tanhf(*v);
            }
        }
    }
}

// =============================================================================
// Pooling
// =============================================================================

/// Pooled length along one axis.
///
/// - `Truncate`: full windows only, `(input - window) / stride + 1`.
/// - `Partial`: one window per stride step that starts inside the input,
///   `ceil(input / stride)`; trailing windows are clipped.
///
/// `None` when a `Truncate` window does not fit.
pub fn pooled_len(input: usize, window: usize, stride: usize, remainder: Remainder) -> Option<usize> {
    if input == 0 || window == 0 || stride == 0 {
        return None;
    }
    match remainder {
        Remainder::Truncate if window > input => None,
        Remainder::Truncate => Some((input - window) / stride + 1),
        Remainder::Partial => Some(input.div_ceil(stride)),
    }
}

/// Output spatial size of a pooling stage.
pub fn pool_output_size(
    in_h: usize, in_w: usize,
    window_h: usize, window_w: usize,
    stride_h: usize, stride_w: usize,
    remainder: Remainder,
) -> Result<(usize, usize)> {
    if window_h == 0 || window_w == 0 {
        return Err(Error::ZeroDimension { what: "pool window" });
    }
    if stride_h == 0 || stride_w == 0 {
        return Err(Error::ZeroDimension { what: "pool stride" });
    }
    let out_h = pooled_len(in_h, window_h, stride_h, remainder);
    let out_w = pooled_len(in_w, window_w, stride_w, remainder);
    match (out_h, out_w) {
        (Some(h), Some(w)) => Ok((h, w)),
        _ => Err(Error::PoolWindow { window_h, window_w, in_h, in_w }),
    }
}

/// Windowed reduction of a CHW map.
///
/// Max pooling returns NaN for any window containing NaN. Average pooling
/// divides by the number of samples the (possibly clipped) window covers.
pub fn pool2d(
    input: &[f32],
    output: &mut [f32],
    channels: usize,
    in_h: usize,
    in_w: usize,
    window_h: usize,
    window_w: usize,
    stride_h: usize,
    stride_w: usize,
    kind: PoolKind,
    remainder: Remainder,
) -> Result<()> {
    let (out_h, out_w) =
        pool_output_size(in_h, in_w, window_h, window_w, stride_h, stride_w, remainder)?;

    check_len("pooling input", channels * in_h * in_w, input.len())?;
    check_len("pooling output", channels * out_h * out_w, output.len())?;

    for c in 0..channels {
        let plane = &input[c * in_h * in_w..(c + 1) * in_h * in_w];
        for oy in 0..out_h {
            let y0 = oy * stride_h;
            let y1 = (y0 + window_h).min(in_h);
            for ox in 0..out_w {
                let x0 = ox * stride_w;
                let x1 = (x0 + window_w).min(in_w);

                let value = match kind {
                    PoolKind::Max => {
                        let mut best = plane[y0 * in_w + x0];
                        for y in y0..y1 {
                            for &v in &plane[y * in_w + x0..y * in_w + x1] {
                                if !best.is_nan() && (v.is_nan() || v > best) {
                                    best = v;
                                }
                            }
                        }
                        best
                    }
                    PoolKind::Average => {
                        let mut sum = 0.0f32;
                        for y in y0..y1 {
                            for &v in &plane[y * in_w + x0..y * in_w + x1] {
                                sum += v;
                            }
                        }
                        sum / ((y1 - y0) * (x1 - x0)) as f32
                    }
                };
                output[c * out_h * out_w + oy * out_w + ox] = value;
            }
        }
    }
    Ok(())
}

// =============================================================================
// Fully connected
// =============================================================================

/// Affine map: `output[o] = sum_i w(o, i) * input[i] + bias[o]`.
///
/// `layout` selects how `w(o, i)` is stored: `OutMajor` is `[out x in]`,
/// `InMajor` is `[in x out]`.
pub fn affine(
    input: &[f32],
    weights: &[f32],
    bias: &[f32],
    output: &mut [f32],
    layout: WeightLayout,
) -> Result<()> {
    let in_features = input.len();
    let out_features = output.len();
    check_len("dense weights", in_features * out_features, weights.len())?;
    check_len("dense biases", out_features, bias.len())?;

    for (o, out) in output.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        match layout {
            WeightLayout::OutMajor => {
                let row = &weights[o * in_features..(o + 1) * in_features];
                for (w, x) in row.iter().zip(input) {
                    acc += w * x;
                }
            }
            WeightLayout::InMajor => {
                for (i, x) in input.iter().enumerate() {
                    acc += weights[i * out_features + o] * x;
                }
            }
        }
        *out = acc + bias[o];
    }
    Ok(())
}

/// Max-subtracted softmax in place. NaN anywhere yields NaN everywhere.
pub fn softmax(data: &mut [f32]) {
    if data.is_empty() {
        return;
    }
    let max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for v in data.iter_mut() {
        *v = libm::expf(*v - max);
        sum += *v;
    }
    for v in data.iter_mut() {
        *v /= sum;
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Index of the maximum score; the lowest index wins ties.
///
/// Strict `>` scan: a NaN score never displaces the current best.
pub fn argmax(scores: &[f32]) -> Result<usize> {
    if scores.is_empty() {
        return Err(Error::EmptyScores);
    }
    let mut best = 0;
    for (i, &v) in scores.iter().enumerate().skip(1) {
        if v > scores[best] {
            best = i;
        }
    }
    Ok(best)
}
