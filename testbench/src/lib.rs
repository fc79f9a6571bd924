//! # hlsnet-testbench
//!
//! Drives an [`hlsnet_core::ConvNet`] over a labelled dataset and reports
//! accuracy and per-inference latency.
//!
//! - [`dataset`]: whitespace-separated image and label files
//! - [`model_file`]: JSON network description, borrowed into a `ConvNet`
//! - [`bench`]: the timed driving loop and its [`bench::RunReport`]
//! - [`logging`]: `tracing-subscriber` setup for the binary

pub mod bench;
pub mod dataset;
pub mod logging;
pub mod model_file;

pub use bench::{render_padded, run, Misprediction, RunReport};
pub use model_file::ModelFile;
