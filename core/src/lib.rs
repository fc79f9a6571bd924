//! # hlsnet-core: fixed-topology convolutional inference
//!
//! A `no_std` (+ `alloc`) engine mapping one image to one class-score
//! vector, written the way a hardware pipeline would run it: odd kernels
//! only, same-convolution padding, every buffer size known once the
//! network is built, and a single branch-free forward pass.
//!
//! ## Architecture
//!
//! - **Preprocessing**: normalize, then pad by `(k - 1) / 2` (zero or edge)
//! - **Layer Zoo**: Conv2D, activations, Pool2D (max/avg), Flatten, Dense
//! - **ConvNet**: `{conv -> act -> pool}*` stages, validated once
//! - **Arena**: caller-owned `f32` scratch, one inference in flight per buffer
//!
//! ## Usage
//!
//! ```ignore
//! use hlsnet_core::*;
//!
//! let kernel = KernelBank::single_channel(CONV_W, CONV_B, 3, 3)?;
//! let stage = ConvStage::new(
//!     Conv2D::new(kernel, PaddingPolicy::Zero),
//!     Activation::Relu,
//!     Some(Pool2D::max_square(2)?),
//! )?;
//! let dense = Dense::new(DENSE_W, DENSE_B, 4 * 14 * 14, 10)?;
//! let net = ConvNet::new(28, 28, Normalization::Scale { divisor: 255.0 }, vec![stage], dense)?;
//!
//! let scores = net.infer(Plane::new(&pixels, 28, 28)?)?;
//! let digit = scores.classify();
//! ```

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod arena;
pub mod error;
pub mod layers;
pub mod math;
pub mod model;
pub mod preprocess;
pub mod tensor;

pub use arena::Arena;
pub use error::{Error, ErrorKind, Result};
pub use layers::{Layer, Shape};
pub use layers::{
    Activation, ActivationLayer,
    Conv2D, KernelBank,
    Dense, OutputTransform, WeightLayout,
    FlattenLayer,
    Pool2D, PoolKind, Remainder,
};
pub use math::{argmax, pad_width, padded_size};
pub use model::{ConvNet, ConvStage, Phase, Prediction};
pub use preprocess::{Normalization, PaddingPolicy, Preprocessor};
pub use tensor::{FeatureMap, Grid, Plane};

/// Arg-max over a score vector; the lowest index wins ties.
pub fn classify(scores: &[f32]) -> Result<usize> {
    math::argmax(scores)
}
