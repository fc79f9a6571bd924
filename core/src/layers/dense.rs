//! Fully-connected output layer over borrowed weights.

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::math;
use super::{Layer, Shape};

/// Storage order of the dense weight matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WeightLayout {
    /// `[out][in]`: one contiguous row per class.
    #[default]
    OutMajor,
    /// `[in][out]`: one contiguous row per input feature, as exported by
    /// Keras-style `Dense` kernels.
    InMajor,
}

/// Transform applied to the raw affine scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputTransform {
    #[default]
    Logits,
    Softmax,
}

/// `score[o] = bias[o] + sum_i w(o, i) * x[i]`, optionally softmaxed.
///
/// Softmax is monotonic, so it never changes the arg-max class.
#[derive(Debug, Clone, Copy)]
pub struct Dense<'w> {
    weights: &'w [f32],
    bias: &'w [f32],
    in_features: usize,
    out_features: usize,
    layout: WeightLayout,
    output: OutputTransform,
}

impl<'w> Dense<'w> {
    pub fn new(
        weights: &'w [f32], bias: &'w [f32],
        in_features: usize, out_features: usize,
    ) -> Result<Self> {
        Self::with_layout(weights, bias, in_features, out_features, WeightLayout::OutMajor)
    }

    pub fn with_layout(
        weights: &'w [f32], bias: &'w [f32],
        in_features: usize, out_features: usize,
        layout: WeightLayout,
    ) -> Result<Self> {
        if out_features == 0 {
            return Err(Error::NoClasses);
        }
        if in_features == 0 {
            return Err(Error::ZeroDimension { what: "dense input features" });
        }
        if weights.len() != out_features * in_features {
            return Err(Error::ParameterLength { what: "dense weights", expected: out_features * in_features, actual: weights.len() });
        }
        if bias.len() != out_features {
            return Err(Error::ParameterLength { what: "dense biases", expected: out_features, actual: bias.len() });
        }
        Ok(Self { weights, bias, in_features, out_features, layout, output: OutputTransform::Logits })
    }

    pub fn with_output(mut self, output: OutputTransform) -> Self {
        self.output = output;
        self
    }

    pub fn in_features(&self) -> usize { self.in_features }
    pub fn out_features(&self) -> usize { self.out_features }
    pub fn layout(&self) -> WeightLayout { self.layout }
    pub fn output_transform(&self) -> OutputTransform { self.output }
}

impl Layer for Dense<'_> {
    fn name(&self) -> &'static str { "Dense" }

    fn output_shape(&self, input_shape: &Shape) -> Result<Shape> {
        let in_total = input_shape.total();
        if in_total != self.in_features {
            return Err(Error::DenseInput { expected: self.in_features, actual: in_total });
        }
        Ok(Shape::d1(self.out_features))
    }

    fn forward<'a>(&self, input: &[f32], input_shape: &Shape, arena: &mut Arena<'a>) -> Result<(&'a mut [f32], Shape)> {
        let out_shape = self.output_shape(input_shape)?;
        if input.len() != self.in_features {
            return Err(Error::DenseInput { expected: self.in_features, actual: input.len() });
        }
        let output = arena.alloc(self.out_features)?;
        math::affine(input, self.weights, self.bias, output, self.layout)?;
        if self.output == OutputTransform::Softmax {
            math::softmax(output);
        }
        Ok((output, out_shape))
    }
}
