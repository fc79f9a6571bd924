//! Elementwise activation layer.
//!
//! One parameter-free layer covers every supported nonlinearity; the
//! variant is configuration. Each element is transformed independently,
//! so the layer is order-independent.

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::math;
use super::{Layer, Shape};

/// Elementwise nonlinearity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Activation {
    #[default]
    Identity,
    /// `max(0, x)`. NaN stays NaN.
    Relu,
    /// `min(max(0, x), ceiling)`: the saturating form (ReLU6 for `ceiling = 6`).
    ClippedRelu { ceiling: f32 },
    /// `1 / (1 + e^-x)`.
    Sigmoid,
    Tanh,
}

impl Activation {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Activation::ClippedRelu { ceiling } if !(ceiling > 0.0) => {
                Err(Error::InvalidParameter { what: "clipped relu ceiling" })
            }
            _ => Ok(()),
        }
    }

    /// Scalar form, mostly for tests and reference checks.
    pub fn apply(&self, x: f32) -> f32 {
        let mut v = [x];
        math::activate(&mut v, *self);
        v[0]
    }
}

/// Layer wrapper around [`Activation`]. Shape unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivationLayer {
    pub activation: Activation,
}

impl ActivationLayer {
    pub fn new(activation: Activation) -> Result<Self> {
        activation.validate()?;
        Ok(Self { activation })
    }
}

impl Layer for ActivationLayer {
    fn name(&self) -> &'static str {
        match self.activation {
            Activation::Identity => "Identity",
            Activation::Relu => "ReLU",
            Activation::ClippedRelu { .. } => "ClippedReLU",
            Activation::Sigmoid => "Sigmoid",
            Activation::Tanh => "Tanh",
        }
    }

    fn output_shape(&self, input_shape: &Shape) -> Result<Shape> {
        Ok(*input_shape)
    }

    fn forward<'a>(
        &self,
        input: &[f32],
        input_shape: &Shape,
        arena: &mut Arena<'a>,
    ) -> Result<(&'a mut [f32], Shape)> {
        let total = input_shape.total();
        if input.len() != total {
            return Err(Error::ParameterLength { what: "activation input", expected: total, actual: input.len() });
        }
        let output = arena.alloc(total)?;
        output.copy_from_slice(input);
        math::activate(output, self.activation);
        Ok((output, *input_shape))
    }
}
