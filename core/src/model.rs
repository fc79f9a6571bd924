//! ConvNet: the forward-pass orchestrator.
//!
//! ```text
//! Idle -> Padding -> { Conv(i) -> Activation(i) -> [Pooling(i)] }* -> Flatten -> Dense -> Done
//! ```
//!
//! The whole layer chain is shape-checked once, in [`ConvNet::new`]. After
//! that a forward pass has no branches and no failure modes other than a
//! wrongly sized image or a too small caller arena.

use alloc::vec;
use alloc::vec::Vec;

use tracing::{debug, trace};

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::layers::{Activation, ActivationLayer, Conv2D, Dense, FlattenLayer, Layer, Pool2D, Shape};
use crate::math;
use crate::preprocess::{Normalization, Preprocessor};
use crate::tensor::Plane;

/// One `conv -> activation -> optional pool` block.
#[derive(Debug, Clone, Copy)]
pub struct ConvStage<'w> {
    pub conv: Conv2D<'w>,
    pub activation: ActivationLayer,
    pub pool: Option<Pool2D>,
}

impl<'w> ConvStage<'w> {
    pub fn new(conv: Conv2D<'w>, activation: Activation, pool: Option<Pool2D>) -> Result<Self> {
        if let Some(pool) = &pool {
            pool.validate()?;
        }
        Ok(Self { conv, activation: ActivationLayer::new(activation)?, pool })
    }
}

/// States a forward pass walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Padding,
    Conv(usize),
    Activation(usize),
    Pooling(usize),
    Flatten,
    Dense,
    Done,
}

/// Class scores of one inference. Length is the network's class count.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    scores: Vec<f32>,
}

impl Prediction {
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Arg-max class, lowest index on ties.
    pub fn classify(&self) -> usize {
        // A network always has at least one class.
        math::argmax(&self.scores).unwrap_or(0)
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.scores
    }
}

impl AsRef<[f32]> for Prediction {
    fn as_ref(&self) -> &[f32] {
        &self.scores
    }
}

/// A validated, immutable network. Parameters are borrowed for `'w`.
#[derive(Debug, Clone)]
pub struct ConvNet<'w> {
    input_rows: usize,
    input_cols: usize,
    preprocessor: Preprocessor,
    stages: Vec<ConvStage<'w>>,
    flatten: FlattenLayer,
    dense: Dense<'w>,
    arena_len: usize,
}

impl<'w> ConvNet<'w> {
    /// Build and validate a network for `input_rows x input_cols` images.
    ///
    /// The first stage's kernel size and padding policy drive the
    /// preprocessing pad. With no stages the image is only normalized.
    /// Every configuration error surfaces here; nothing is re-checked per call.
    pub fn new(
        input_rows: usize,
        input_cols: usize,
        normalization: Normalization,
        stages: Vec<ConvStage<'w>>,
        dense: Dense<'w>,
    ) -> Result<Self> {
        if input_rows == 0 || input_cols == 0 {
            return Err(Error::ZeroDimension { what: "input image" });
        }

        let preprocessor = match stages.first() {
            Some(first) => {
                let (kh, kw) = first.conv.kernel().size();
                Preprocessor::new(normalization, first.conv.padding(), kh, kw)?
            }
            None => Preprocessor::unpadded(normalization)?,
        };

        let mut arena_len = preprocessor.arena_len(input_rows, input_cols)?;
        let mut shape = Shape::d3(1, input_rows, input_cols);

        for (i, stage) in stages.iter().enumerate() {
            let in_ch = stage.conv.kernel().in_channels();
            if shape.channels() != in_ch {
                return Err(Error::ChannelMismatch { stage: i, expected: in_ch, actual: shape.channels() });
            }
            // Stage 0 convolves the preprocessed buffer directly.
            arena_len += if i == 0 {
                stage.conv.output_shape(&shape)?.total()
            } else {
                stage.conv.arena_len(&shape)?
            };
            shape = stage.conv.output_shape(&shape)?;

            arena_len += stage.activation.arena_len(&shape)?;

            if let Some(pool) = &stage.pool {
                shape = pool.output_shape(&shape)?;
                arena_len += shape.total();
            }
        }

        let flatten = FlattenLayer;
        let flat = flatten.output_shape(&shape)?;
        arena_len += flat.total();
        let scores = dense.output_shape(&flat)?;
        arena_len += scores.total();

        debug!(
            input_rows,
            input_cols,
            stages = stages.len(),
            flat_len = flat.total(),
            classes = dense.out_features(),
            arena_len,
            "conv net validated"
        );

        Ok(Self { input_rows, input_cols, preprocessor, stages, flatten, dense, arena_len })
    }

    /// Run one forward pass with a privately allocated arena.
    pub fn infer(&self, image: Plane<'_>) -> Result<Prediction> {
        let mut scratch = vec![0.0f32; self.arena_len];
        let mut arena = Arena::new(&mut scratch);
        self.infer_in(image, &mut arena)
    }

    /// Run one forward pass in caller scratch.
    ///
    /// The arena should hold at least [`ConvNet::arena_len`] elements.
    pub fn infer_in(&self, image: Plane<'_>, arena: &mut Arena<'_>) -> Result<Prediction> {
        self.check_input(&image)?;
        trace!(phase = ?Phase::Idle);

        trace!(phase = ?Phase::Padding);
        let (padded, mut shape) = self.preprocessor.run_in(image, arena)?;
        let mut current: &[f32] = padded;

        for (i, stage) in self.stages.iter().enumerate() {
            trace!(phase = ?Phase::Conv(i), input = ?shape);
            let (out, out_shape) = if i == 0 {
                stage.conv.forward_padded(current, &shape, arena)?
            } else {
                stage.conv.forward(current, &shape, arena)?
            };
            current = out;
            shape = out_shape;

            trace!(phase = ?Phase::Activation(i), activation = stage.activation.name());
            let (out, out_shape) = stage.activation.forward(current, &shape, arena)?;
            current = out;
            shape = out_shape;

            if let Some(pool) = &stage.pool {
                trace!(phase = ?Phase::Pooling(i), pool = pool.name());
                let (out, out_shape) = pool.forward(current, &shape, arena)?;
                current = out;
                shape = out_shape;
            }
        }

        trace!(phase = ?Phase::Flatten, input = ?shape);
        let (flat, flat_shape) = self.flatten.forward(current, &shape, arena)?;

        trace!(phase = ?Phase::Dense);
        let (scores, _) = self.dense.forward(flat, &flat_shape, arena)?;

        trace!(phase = ?Phase::Done);
        Ok(Prediction { scores: scores.to_vec() })
    }

    /// Forward pass followed by arg-max.
    pub fn predict(&self, image: Plane<'_>) -> Result<usize> {
        Ok(self.infer(image)?.classify())
    }

    /// Phase sequence every call walks through, in order.
    pub fn phases(&self) -> Vec<Phase> {
        let mut phases = vec![Phase::Idle, Phase::Padding];
        for (i, stage) in self.stages.iter().enumerate() {
            phases.push(Phase::Conv(i));
            phases.push(Phase::Activation(i));
            if stage.pool.is_some() {
                phases.push(Phase::Pooling(i));
            }
        }
        phases.extend([Phase::Flatten, Phase::Dense, Phase::Done]);
        phases
    }

    fn check_input(&self, image: &Plane<'_>) -> Result<()> {
        if image.rows() != self.input_rows || image.cols() != self.input_cols {
            return Err(Error::InputShape {
                expected_rows: self.input_rows,
                expected_cols: self.input_cols,
                actual_rows: image.rows(),
                actual_cols: image.cols(),
            });
        }
        Ok(())
    }

    /// Expected image size as `(rows, cols)`.
    pub fn input_shape(&self) -> (usize, usize) {
        (self.input_rows, self.input_cols)
    }

    /// Length of every [`Prediction`] this network returns.
    pub fn classes(&self) -> usize {
        self.dense.out_features()
    }

    pub fn stages(&self) -> &[ConvStage<'w>] {
        &self.stages
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn dense(&self) -> &Dense<'w> {
        &self.dense
    }

    /// Arena elements one forward pass consumes.
    pub fn arena_len(&self) -> usize {
        self.arena_len
    }
}
