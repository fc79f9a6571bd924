//! Same-convolution layer over borrowed kernel weights.

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::math;
use crate::preprocess::PaddingPolicy;
use super::{Layer, Shape};

/// Learned convolution parameters: `out_ch` filters of `in_ch x kh x kw`
/// weights plus one bias per filter.
///
/// Weights are laid out `[out_ch][in_ch][kh][kw]`. The bank only borrows
/// them, so the same parameters can back any number of networks.
#[derive(Debug, Clone, Copy)]
pub struct KernelBank<'w> {
    weights: &'w [f32],
    biases: &'w [f32],
    in_ch: usize,
    out_ch: usize,
    kh: usize,
    kw: usize,
}

impl<'w> KernelBank<'w> {
    /// Fails on even or zero kernel dimensions and on any length mismatch.
    pub fn new(
        weights: &'w [f32], biases: &'w [f32],
        in_ch: usize, out_ch: usize, kh: usize, kw: usize,
    ) -> Result<Self> {
        math::check_odd_kernel(kh, kw)?;
        if in_ch == 0 {
            return Err(Error::ZeroDimension { what: "kernel input channels" });
        }
        if out_ch == 0 {
            return Err(Error::ZeroDimension { what: "kernel output channels" });
        }
        let expected = out_ch * in_ch * kh * kw;
        if weights.len() != expected {
            return Err(Error::ParameterLength { what: "kernel weights", expected, actual: weights.len() });
        }
        if biases.len() != out_ch {
            return Err(Error::ParameterLength { what: "kernel biases", expected: out_ch, actual: biases.len() });
        }
        Ok(Self { weights, biases, in_ch, out_ch, kh, kw })
    }

    /// Single-channel bank, the common first-stage case.
    pub fn single_channel(weights: &'w [f32], biases: &'w [f32], kh: usize, kw: usize) -> Result<Self> {
        Self::new(weights, biases, 1, biases.len(), kh, kw)
    }

    pub fn in_channels(&self) -> usize { self.in_ch }
    pub fn out_channels(&self) -> usize { self.out_ch }
    pub fn size(&self) -> (usize, usize) { (self.kh, self.kw) }
    pub fn weights(&self) -> &'w [f32] { self.weights }
    pub fn biases(&self) -> &'w [f32] { self.biases }

    pub fn weight(&self, o: usize, c: usize, ky: usize, kx: usize) -> Option<f32> {
        if o < self.out_ch && c < self.in_ch && ky < self.kh && kx < self.kw {
            Some(self.weights[((o * self.in_ch + c) * self.kh + ky) * self.kw + kx])
        } else {
            None
        }
    }
}

/// Convolution stage: pads its input by `(k - 1) / 2` per side with the
/// configured policy, then runs a valid convolution. Output spatial size
/// always equals input spatial size.
#[derive(Debug, Clone, Copy)]
pub struct Conv2D<'w> {
    kernel: KernelBank<'w>,
    padding: PaddingPolicy,
}

impl<'w> Conv2D<'w> {
    pub fn new(kernel: KernelBank<'w>, padding: PaddingPolicy) -> Self {
        Self { kernel, padding }
    }

    pub fn kernel(&self) -> &KernelBank<'w> {
        &self.kernel
    }

    pub fn padding(&self) -> PaddingPolicy {
        self.padding
    }

    /// Shape of the padded buffer this stage convolves over.
    pub fn padded_shape(&self, input_shape: &Shape) -> Result<Shape> {
        let out = self.output_shape(input_shape)?;
        let (h, w) = math::padded_size(out.height(), out.width(), self.kernel.kh, self.kernel.kw)?;
        Ok(Shape::d3(self.kernel.in_ch, h, w))
    }

    /// Valid convolution over input that is already padded for this kernel.
    pub fn forward_padded<'a>(
        &self,
        padded: &[f32],
        padded_shape: &Shape,
        arena: &mut Arena<'a>,
    ) -> Result<(&'a mut [f32], Shape)> {
        let k = &self.kernel;
        let (in_h, in_w) = (padded_shape.height(), padded_shape.width());
        if in_h < k.kh || in_w < k.kw {
            return Err(Error::ParameterLength {
                what: "padded convolution input",
                expected: k.in_ch * k.kh * k.kw,
                actual: padded_shape.total(),
            });
        }
        let out_shape = Shape::d3(k.out_ch, in_h - k.kh + 1, in_w - k.kw + 1);
        let output = arena.alloc(out_shape.total())?;
        math::conv2d_valid(
            padded, k.weights, k.biases, output,
            padded_shape.channels(), in_h, in_w,
            k.out_ch, k.kh, k.kw,
        )?;
        Ok((output, out_shape))
    }
}

impl Layer for Conv2D<'_> {
    fn name(&self) -> &'static str { "Conv2D" }

    fn output_shape(&self, input_shape: &Shape) -> Result<Shape> {
        if input_shape.ndim != 3 {
            return Err(Error::ParameterLength { what: "convolution input rank", expected: 3, actual: input_shape.ndim });
        }
        if input_shape.channels() != self.kernel.in_ch {
            return Err(Error::ParameterLength {
                what: "convolution input channels",
                expected: self.kernel.in_ch,
                actual: input_shape.channels(),
            });
        }
        if input_shape.height() == 0 || input_shape.width() == 0 {
            return Err(Error::ZeroDimension { what: "convolution input" });
        }
        Ok(Shape::d3(self.kernel.out_ch, input_shape.height(), input_shape.width()))
    }

    fn arena_len(&self, input_shape: &Shape) -> Result<usize> {
        let out = self.output_shape(input_shape)?;
        Ok(self.padded_shape(input_shape)?.total() + out.total())
    }

    fn forward<'a>(&self, input: &[f32], input_shape: &Shape, arena: &mut Arena<'a>) -> Result<(&'a mut [f32], Shape)> {
        let padded_shape = self.padded_shape(input_shape)?;
        let padded = arena.alloc(padded_shape.total())?;
        math::pad(
            input, padded,
            input_shape.channels(), input_shape.height(), input_shape.width(),
            self.kernel.kh, self.kernel.kw,
            self.padding,
        )?;
        self.forward_padded(padded, &padded_shape, arena)
    }
}
