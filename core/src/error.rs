//! Error types for the hlsnet-core library.
//!
//! Every fallible operation returns `Result<T>`. Errors fall into three
//! kinds: configuration errors are raised once while a network is built,
//! input errors are raised per call, resource errors come from the arena.
//! Numeric anomalies (NaN, overflow) are never errors.

use thiserror::Error;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal: the network cannot be built.
    Configuration,
    /// Per call: the caller handed in malformed data.
    Input,
    /// Per call: caller-provided scratch is too small.
    Resource,
}

/// All possible error conditions in the hlsnet-core library.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Error {
    #[error("odd kernel sizes are mandatory, got {rows}x{cols}")]
    EvenKernel { rows: usize, cols: usize },

    #[error("{what} must be non-zero")]
    ZeroDimension { what: &'static str },

    #[error("{what}: expected {expected} values, got {actual}")]
    ParameterLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("stage {stage} expects {expected} input channels, previous stage yields {actual}")]
    ChannelMismatch {
        stage: usize,
        expected: usize,
        actual: usize,
    },

    #[error("pool window {window_h}x{window_w} does not fit a {in_h}x{in_w} feature map")]
    PoolWindow {
        window_h: usize,
        window_w: usize,
        in_h: usize,
        in_w: usize,
    },

    #[error("dense layer expects {expected} inputs, flattened feature map has {actual}")]
    DenseInput { expected: usize, actual: usize },

    #[error("network must produce at least one class score")]
    NoClasses,

    #[error("normalization parameters are degenerate")]
    InvalidNormalization,

    #[error("invalid {what}")]
    InvalidParameter { what: &'static str },

    #[error("image is {actual_rows}x{actual_cols}, network expects {expected_rows}x{expected_cols}")]
    InputShape {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("buffer holds {actual} samples, shape requires {expected}")]
    InputLength { expected: usize, actual: usize },

    #[error("index ({row}, {col}) is outside a {rows}x{cols} image")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("cannot classify an empty score vector")]
    EmptyScores,

    #[error("arena exhausted: requested {requested} elements, {remaining} remaining")]
    ArenaExhausted { requested: usize, remaining: usize },
}

impl Error {
    /// Which side of the contract this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EvenKernel { .. }
            | Error::ZeroDimension { .. }
            | Error::ParameterLength { .. }
            | Error::ChannelMismatch { .. }
            | Error::PoolWindow { .. }
            | Error::DenseInput { .. }
            | Error::NoClasses
            | Error::InvalidNormalization
            | Error::InvalidParameter { .. } => ErrorKind::Configuration,
            Error::InputShape { .. }
            | Error::InputLength { .. }
            | Error::IndexOutOfBounds { .. }
            | Error::EmptyScores => ErrorKind::Input,
            Error::ArenaExhausted { .. } => ErrorKind::Resource,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

pub type Result<T> = core::result::Result<T, Error>;
