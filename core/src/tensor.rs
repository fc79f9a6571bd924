//! Image and feature-map containers.
//!
//! [`Grid`] is the compile-time-sized image buffer: its dimensions are
//! const generics, so a mis-sized image is a type error. [`Plane`] is the
//! borrowed runtime view the engine consumes; the network checks its
//! dimensions against the configured input shape on every call.
//! [`FeatureMap`] is an owned CHW buffer returned by the standalone
//! operators.

use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::layers::Shape;

/// Borrowed `rows x cols` row-major image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
}

impl<'a> Plane<'a> {
    /// Returns an input error if `data.len() != rows * cols`.
    pub fn new(data: &'a [f32], rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InputLength {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }
}

/// Fixed-size `R x C` image stored inline.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<const R: usize, const C: usize> {
    data: [[f32; C]; R],
}

impl<const R: usize, const C: usize> Grid<R, C> {
    pub const fn zeros() -> Self {
        Self { data: [[0.0; C]; R] }
    }

    pub const fn from_rows(data: [[f32; C]; R]) -> Self {
        Self { data }
    }

    /// Copy from a flat row-major slice of exactly `R * C` samples.
    pub fn from_slice(slice: &[f32]) -> Result<Self> {
        if slice.len() != R * C {
            return Err(Error::InputLength {
                expected: R * C,
                actual: slice.len(),
            });
        }
        let mut grid = Self::zeros();
        grid.data.as_flattened_mut().copy_from_slice(slice);
        Ok(grid)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.data.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        match self.data.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { row, col, rows: R, cols: C }),
        }
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[f32] {
        self.data.as_flattened()
    }

    #[inline(always)]
    pub fn as_plane(&self) -> Plane<'_> {
        Plane { data: self.data.as_flattened(), rows: R, cols: C }
    }

    pub const fn rows(&self) -> usize {
        R
    }

    pub const fn cols(&self) -> usize {
        C
    }
}

impl<const R: usize, const C: usize> Default for Grid<R, C> {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Owned CHW buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap {
    data: Vec<f32>,
    shape: Shape,
}

impl FeatureMap {
    pub fn from_vec(data: Vec<f32>, shape: Shape) -> Result<Self> {
        if data.len() != shape.total() {
            return Err(Error::InputLength {
                expected: shape.total(),
                actual: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Sample at channel `c`, row `y`, column `x`.
    pub fn get(&self, c: usize, y: usize, x: usize) -> Option<f32> {
        let (ch, h, w) = (self.shape.channels(), self.shape.height(), self.shape.width());
        if c < ch && y < h && x < w {
            Some(self.data[c * h * w + y * w + x])
        } else {
            None
        }
    }

    /// Row `y` of channel `c`.
    pub fn row(&self, c: usize, y: usize) -> Option<&[f32]> {
        let (ch, h, w) = (self.shape.channels(), self.shape.height(), self.shape.width());
        if c < ch && y < h {
            let start = c * h * w + y * w;
            Some(&self.data[start..start + w])
        } else {
            None
        }
    }
}
