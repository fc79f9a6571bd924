//! JSON network description.
//!
//! A [`ModelFile`] owns every parameter array; [`ModelFile::build`]
//! borrows them into a validated [`ConvNet`], so the file must outlive the
//! network built from it.
//!
//! ```json
//! {
//!   "input": { "rows": 28, "cols": 28 },
//!   "normalization": { "kind": "scale", "divisor": 255.0 },
//!   "stages": [{
//!     "in_channels": 1, "kernel_rows": 7, "kernel_cols": 7,
//!     "weights": [...], "biases": [...],
//!     "padding": "zero",
//!     "activation": { "kind": "relu" },
//!     "pool": { "kind": "max", "window_h": 2, "window_w": 2, "stride_h": 2, "stride_w": 2 }
//!   }],
//!   "dense": { "in_features": 784, "out_features": 10, "weights": [...], "biases": [...],
//!              "layout": "in_major", "output": "softmax" }
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use hlsnet_core::{
    Activation, Conv2D, ConvNet, ConvStage, Dense, KernelBank, Normalization, OutputTransform,
    PaddingPolicy, Pool2D, WeightLayout,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSpec {
    pub rows: usize,
    pub cols: usize,
}

/// One `conv -> activation -> optional pool` stage. The output channel
/// count is the number of biases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageSpec {
    #[serde(default = "one")]
    pub in_channels: usize,
    pub kernel_rows: usize,
    pub kernel_cols: usize,
    /// `[out][in][kernel_rows][kernel_cols]`
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
    #[serde(default)]
    pub padding: PaddingPolicy,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default)]
    pub pool: Option<Pool2D>,
}

fn one() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DenseSpec {
    pub in_features: usize,
    pub out_features: usize,
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
    #[serde(default)]
    pub layout: WeightLayout,
    #[serde(default)]
    pub output: OutputTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelFile {
    pub input: InputSpec,
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default)]
    pub stages: Vec<StageSpec>,
    pub dense: DenseSpec,
}

impl ModelFile {
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        serde_json::from_reader(reader).context("parsing model description")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("can't open model file `{}`", path.display()))?;
        Self::from_reader(BufReader::new(file)).with_context(|| format!("in `{}`", path.display()))
    }

    /// Validate the description and borrow its parameters into a network.
    pub fn build(&self) -> hlsnet_core::Result<ConvNet<'_>> {
        let stages = self
            .stages
            .iter()
            .map(|s| {
                let kernel = KernelBank::new(
                    &s.weights, &s.biases,
                    s.in_channels, s.biases.len(),
                    s.kernel_rows, s.kernel_cols,
                )?;
                ConvStage::new(Conv2D::new(kernel, s.padding), s.activation, s.pool)
            })
            .collect::<hlsnet_core::Result<Vec<_>>>()?;

        let d = &self.dense;
        let dense = Dense::with_layout(&d.weights, &d.biases, d.in_features, d.out_features, d.layout)?
            .with_output(d.output);

        ConvNet::new(self.input.rows, self.input.cols, self.normalization, stages, dense)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hlsnet_core::{Error, Plane};

    /// 4x4 input, Laplacian kernel, ReLU, 2x2 max pool, 3 classes.
    pub(crate) const LAPLACIAN_MODEL: &str = r#"{
        "input": { "rows": 4, "cols": 4 },
        "stages": [{
            "kernel_rows": 3, "kernel_cols": 3,
            "weights": [0, 1, 0, 1, -4, 1, 0, 1, 0],
            "biases": [1],
            "activation": { "kind": "relu" },
            "pool": { "kind": "max", "window_h": 2, "window_w": 2, "stride_h": 2, "stride_w": 2 }
        }],
        "dense": {
            "in_features": 4, "out_features": 3,
            "weights": [1, 0, 0, 0, 0, 1, 1, 0, 0.5, -1, 0, 1],
            "biases": [0, -10, 2]
        }
    }"#;

    pub(crate) const IMAGE: [f32; 16] = [
        1.0, 0.0, 2.0, 1.0,
        0.0, 1.0, 0.0, 3.0,
        2.0, 0.0, 1.0, 0.0,
        1.0, 3.0, 0.0, 1.0,
    ];

    #[test]
    fn test_parse_and_build() {
        let model = ModelFile::from_reader(LAPLACIAN_MODEL.as_bytes()).unwrap();
        assert_eq!(model.input, InputSpec { rows: 4, cols: 4 });
        assert_eq!(model.normalization, Normalization::Identity);
        assert_eq!(model.stages[0].padding, PaddingPolicy::Zero);
        assert_eq!(model.dense.layout, WeightLayout::OutMajor);

        let net = model.build().unwrap();
        assert_eq!(net.classes(), 3);
        let prediction = net.infer(Plane::new(&IMAGE, 4, 4).unwrap()).unwrap();
        assert_eq!(prediction.scores(), &[5.0, 6.0, 2.5]);
    }

    #[test]
    fn test_tagged_enums() {
        let json = r#"{
            "input": { "rows": 2, "cols": 2 },
            "normalization": { "kind": "min_max", "min": 0.0, "max": 4.0 },
            "dense": {
                "in_features": 4, "out_features": 2,
                "weights": [1, 0, 0, 1, 0, 0, 0, 0],
                "biases": [0, 0],
                "layout": "in_major",
                "output": "softmax"
            }
        }"#;
        let model = ModelFile::from_reader(json.as_bytes()).unwrap();
        assert_eq!(model.normalization, Normalization::MinMax { min: 0.0, max: 4.0 });
        assert_eq!(model.dense.layout, WeightLayout::InMajor);
        assert_eq!(model.dense.output, OutputTransform::Softmax);
        assert!(model.build().is_ok());
    }

    #[test]
    fn test_even_kernel_fails_build() {
        let json = LAPLACIAN_MODEL
            .replace(r#""kernel_rows": 3"#, r#""kernel_rows": 2"#)
            .replace("[0, 1, 0, 1, -4, 1, 0, 1, 0]", "[0, 1, 0, 1, -4, 1]");
        let model = ModelFile::from_reader(json.as_bytes()).unwrap();
        let err = model.build().unwrap_err();
        assert_eq!(err, Error::EvenKernel { rows: 2, cols: 3 });
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = LAPLACIAN_MODEL.replace(r#""rows": 4,"#, r#""rows": 4, "depth": 1,"#);
        assert!(ModelFile::from_reader(json.as_bytes()).is_err());
    }
}
