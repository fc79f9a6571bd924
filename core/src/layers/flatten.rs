//! Flatten layer: `[C, H, W] -> [C*H*W]`.
//!
//! Traversal order is channel, then row, then column, which is exactly
//! the in-memory CHW order, so the data is copied verbatim. Dense weights
//! must be exported in this order; any other order silently produces
//! wrong scores.

use crate::arena::Arena;
use crate::error::{Error, Result};
use super::{Layer, Shape};

/// Used between the last convolution/pooling stage and the dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlattenLayer;

impl Layer for FlattenLayer {
    fn name(&self) -> &'static str { "Flatten" }

    fn output_shape(&self, input_shape: &Shape) -> Result<Shape> {
        Ok(Shape::d1(input_shape.total()))
    }

    fn forward<'a>(
        &self,
        input: &[f32],
        input_shape: &Shape,
        arena: &mut Arena<'a>,
    ) -> Result<(&'a mut [f32], Shape)> {
        let total = input_shape.total();
        if input.len() != total {
            return Err(Error::ParameterLength { what: "flatten input", expected: total, actual: input.len() });
        }
        let output = arena.alloc(total)?;
        output.copy_from_slice(input);
        Ok((output, Shape::d1(total)))
    }
}
