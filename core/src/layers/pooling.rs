//! Pooling layer: max or average over strided windows.
//!
//! No learnable parameters. How a feature map whose size is not a
//! multiple of the stride is handled is part of the configuration, see
//! [`Remainder`].

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::math;
use super::{Layer, Shape};

/// Window reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PoolKind {
    #[default]
    Max,
    Average,
}

/// Policy for trailing rows/columns that do not fill a whole window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Remainder {
    /// Drop them: `out = (in - window) / stride + 1`.
    #[default]
    Truncate,
    /// Keep them as clipped windows: `out = ceil(in / stride)`.
    Partial,
}

/// 2D pooling over every channel of a CHW map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pool2D {
    pub kind: PoolKind,
    pub window_h: usize,
    pub window_w: usize,
    pub stride_h: usize,
    pub stride_w: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub remainder: Remainder,
}

impl Pool2D {
    pub fn new(
        kind: PoolKind,
        window_h: usize, window_w: usize,
        stride_h: usize, stride_w: usize,
        remainder: Remainder,
    ) -> Result<Self> {
        let pool = Self { kind, window_h, window_w, stride_h, stride_w, remainder };
        pool.validate()?;
        Ok(pool)
    }

    /// Square non-overlapping max pool (window == stride), truncating.
    pub fn max_square(size: usize) -> Result<Self> {
        Self::new(PoolKind::Max, size, size, size, size, Remainder::Truncate)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_h == 0 || self.window_w == 0 {
            return Err(Error::ZeroDimension { what: "pool window" });
        }
        if self.stride_h == 0 || self.stride_w == 0 {
            return Err(Error::ZeroDimension { what: "pool stride" });
        }
        Ok(())
    }
}

impl Layer for Pool2D {
    fn name(&self) -> &'static str {
        match self.kind {
            PoolKind::Max => "MaxPool2D",
            PoolKind::Average => "AvgPool2D",
        }
    }

    fn output_shape(&self, input_shape: &Shape) -> Result<Shape> {
        if input_shape.ndim != 3 {
            return Err(Error::ParameterLength { what: "pooling input rank", expected: 3, actual: input_shape.ndim });
        }
        let (out_h, out_w) = math::pool_output_size(
            input_shape.height(), input_shape.width(),
            self.window_h, self.window_w,
            self.stride_h, self.stride_w,
            self.remainder,
        )?;
        Ok(Shape::d3(input_shape.channels(), out_h, out_w))
    }

    fn forward<'a>(
        &self,
        input: &[f32],
        input_shape: &Shape,
        arena: &mut Arena<'a>,
    ) -> Result<(&'a mut [f32], Shape)> {
        let out_shape = self.output_shape(input_shape)?;
        let output = arena.alloc(out_shape.total())?;
        math::pool2d(
            input, output,
            input_shape.channels(), input_shape.height(), input_shape.width(),
            self.window_h, self.window_w,
            self.stride_h, self.stride_w,
            self.kind, self.remainder,
        )?;
        Ok((output, out_shape))
    }
}
