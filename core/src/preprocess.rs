//! Image preprocessing: normalize, then pad for the first convolution.
//!
//! The two steps are independent operators ([`math::normalize`] and
//! [`math::pad`]); [`Preprocessor`] only fixes their parameters and runs
//! them back to back.

use alloc::vec;

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::layers::Shape;
use crate::math;
use crate::tensor::{FeatureMap, Plane};

/// Per-sample rescaling applied before padding.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Normalization {
    #[default]
    Identity,
    /// `x / divisor`; `divisor = 255` maps 8-bit pixels to `[0, 1]`.
    Scale { divisor: f32 },
    /// `(x - min) / (max - min)`.
    MinMax { min: f32, max: f32 },
    /// `(x - mean) / std_dev`.
    Standardize { mean: f32, std_dev: f32 },
}

impl Normalization {
    /// Rejects parameters that would divide by zero or are not finite.
    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            Normalization::Identity => true,
            Normalization::Scale { divisor } => divisor.is_finite() && divisor != 0.0,
            Normalization::MinMax { min, max } => {
                min.is_finite() && max.is_finite() && max > min
            }
            Normalization::Standardize { mean, std_dev } => {
                mean.is_finite() && std_dev.is_finite() && std_dev > 0.0
            }
        };
        if ok { Ok(()) } else { Err(Error::InvalidNormalization) }
    }

    #[inline]
    pub fn apply(&self, x: f32) -> f32 {
        match *self {
            Normalization::Identity => x,
            Normalization::Scale { divisor } => x / divisor,
            Normalization::MinMax { min, max } => (x - min) / (max - min),
            Normalization::Standardize { mean, std_dev } => (x - mean) / std_dev,
        }
    }
}

/// How the border of a padded map is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PaddingPolicy {
    #[default]
    Zero,
    /// Replicate the nearest border sample.
    Edge,
}

/// Normalization plus same-convolution padding for one odd kernel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocessor {
    normalization: Normalization,
    padding: PaddingPolicy,
    kernel_rows: usize,
    kernel_cols: usize,
}

impl Preprocessor {
    /// Fails if the kernel is even or the normalization is degenerate.
    pub fn new(
        normalization: Normalization,
        padding: PaddingPolicy,
        kernel_rows: usize,
        kernel_cols: usize,
    ) -> Result<Self> {
        math::check_odd_kernel(kernel_rows, kernel_cols)?;
        normalization.validate()?;
        Ok(Self { normalization, padding, kernel_rows, kernel_cols })
    }

    /// Normalization only: a 1x1 kernel needs no border.
    pub fn unpadded(normalization: Normalization) -> Result<Self> {
        Self::new(normalization, PaddingPolicy::Zero, 1, 1)
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn padding(&self) -> PaddingPolicy {
        self.padding
    }

    pub fn kernel_size(&self) -> (usize, usize) {
        (self.kernel_rows, self.kernel_cols)
    }

    /// Shape of the padded buffer for a `rows x cols` image.
    pub fn padded_shape(&self, rows: usize, cols: usize) -> Result<Shape> {
        let (h, w) = math::padded_size(rows, cols, self.kernel_rows, self.kernel_cols)?;
        Ok(Shape::d3(1, h, w))
    }

    /// Arena elements used by [`Preprocessor::run_in`].
    pub fn arena_len(&self, rows: usize, cols: usize) -> Result<usize> {
        Ok(rows * cols + self.padded_shape(rows, cols)?.total())
    }

    /// Normalize and pad into arena scratch.
    pub fn run_in<'a>(
        &self,
        image: Plane<'_>,
        arena: &mut Arena<'a>,
    ) -> Result<(&'a mut [f32], Shape)> {
        let shape = self.padded_shape(image.rows(), image.cols())?;
        let normalized = arena.alloc(image.len())?;
        math::normalize(image.as_slice(), normalized, &self.normalization)?;

        let padded = arena.alloc(shape.total())?;
        math::pad(
            normalized, padded,
            1, image.rows(), image.cols(),
            self.kernel_rows, self.kernel_cols,
            self.padding,
        )?;
        Ok((padded, shape))
    }

    /// Normalize and pad into a freshly allocated map. The image is untouched.
    pub fn run(&self, image: Plane<'_>) -> Result<FeatureMap> {
        let len = self.arena_len(image.rows(), image.cols())?;
        let mut scratch = vec![0.0f32; len];
        let mut arena = Arena::new(&mut scratch);
        let (padded, shape) = self.run_in(image, &mut arena)?;
        FeatureMap::from_vec(padded.to_vec(), shape)
    }
}
