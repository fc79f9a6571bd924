//! Layer zoo: the per-stage operators of the forward pass.
//!
//! Every operator implements [`Layer`], which separates shape inference
//! (run once, when a network is built) from the forward computation (run
//! once per inference, writing into arena scratch).

pub mod activations;
pub mod conv;
pub mod dense;
pub mod flatten;
pub mod pooling;

use alloc::vec;

use crate::arena::Arena;
use crate::error::Result;
use crate::tensor::FeatureMap;

/// Tensor shape: `d1(len)` for vectors, `d3(c, h, w)` for CHW feature maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub dims: [usize; 3],
    pub ndim: usize,
}

impl Shape {
    pub const fn d1(size: usize) -> Self {
        Self { dims: [size, 0, 0], ndim: 1 }
    }
    pub const fn d3(c: usize, h: usize, w: usize) -> Self {
        Self { dims: [c, h, w], ndim: 3 }
    }
    pub fn total(&self) -> usize {
        self.dims[..self.ndim].iter().product()
    }
    pub fn channels(&self) -> usize {
        if self.ndim == 3 { self.dims[0] } else { 1 }
    }
    pub fn height(&self) -> usize {
        if self.ndim == 3 { self.dims[1] } else { 1 }
    }
    pub fn width(&self) -> usize {
        if self.ndim == 3 { self.dims[2] } else { self.dims[0] }
    }
}

/// A forward-pass operator with immutable parameters.
///
/// `Send + Sync` because parameters are only ever read: one network can
/// serve inferences from several threads, each with its own arena.
pub trait Layer: Send + Sync {
    fn name(&self) -> &'static str;

    fn output_shape(&self, input_shape: &Shape) -> Result<Shape>;

    /// Arena elements needed for one forward call, output included.
    fn arena_len(&self, input_shape: &Shape) -> Result<usize> {
        Ok(self.output_shape(input_shape)?.total())
    }

    fn forward<'a>(
        &self,
        input: &[f32],
        input_shape: &Shape,
        arena: &mut Arena<'a>,
    ) -> Result<(&'a mut [f32], Shape)>;
}

/// Run one layer outside a network, with its own scratch.
pub fn apply(layer: &dyn Layer, input: &FeatureMap) -> Result<FeatureMap> {
    let shape = input.shape();
    let mut scratch = vec![0.0f32; layer.arena_len(&shape)?];
    let mut arena = Arena::new(&mut scratch);
    let (output, out_shape) = layer.forward(input.as_slice(), &shape, &mut arena)?;
    FeatureMap::from_vec(output.to_vec(), out_shape)
}

pub use activations::{Activation, ActivationLayer};
pub use conv::{Conv2D, KernelBank};
pub use dense::{Dense, OutputTransform, WeightLayout};
pub use flatten::FlattenLayer;
pub use pooling::{Pool2D, PoolKind, Remainder};
