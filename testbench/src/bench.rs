//! Timed driving loop over a labelled dataset.

use std::fmt::{self, Write as _};
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use hlsnet_core::{ConvNet, FeatureMap, Plane};
use tracing::debug;

/// One wrongly classified sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Misprediction {
    pub index: usize,
    pub expected: usize,
    pub predicted: usize,
    pub scores: Vec<f32>,
    /// The sample after normalization and padding, as the first
    /// convolution sees it.
    pub padded: FeatureMap,
}

/// Accuracy and latency tallies of one [`run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub total: usize,
    pub correct: usize,
    /// Time spent inside `infer` only, summed over all samples.
    pub inference_time: Duration,
    pub mispredictions: Vec<Misprediction>,
}

impl RunReport {
    pub fn accuracy_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 * 100.0 / self.total as f64
    }

    pub fn average_latency_ms(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.inference_time.as_secs_f64() * 1000.0 / self.total as f64
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total predictions: {}", self.total)?;
        writeln!(f, "Correct predictions: {:.2} %", self.accuracy_percent())?;
        write!(f, "Average latency: {:.6} (ms)", self.average_latency_ms())
    }
}

/// Run one inference per `(image, label)` pair.
///
/// Any error aborts the run: a mis-sized image or a network error is a
/// broken setup, not a wrong answer.
pub fn run(net: &ConvNet<'_>, images: &[Vec<f32>], labels: &[usize]) -> Result<RunReport> {
    ensure!(
        images.len() == labels.len(),
        "{} images but {} labels",
        images.len(),
        labels.len()
    );
    let (rows, cols) = net.input_shape();
    let mut report = RunReport::default();

    for (index, (pixels, &expected)) in images.iter().zip(labels).enumerate() {
        let image = Plane::new(pixels, rows, cols).with_context(|| format!("sample {index}"))?;

        let begin = Instant::now();
        let prediction = net.infer(image).with_context(|| format!("sample {index}"))?;
        report.inference_time += begin.elapsed();
        report.total += 1;

        let predicted = prediction.classify();
        debug!(index, expected, predicted, "sample classified");
        if predicted == expected {
            report.correct += 1;
        } else {
            let padded = net.preprocessor().run(image).with_context(|| format!("sample {index}"))?;
            report.mispredictions.push(Misprediction {
                index,
                expected,
                predicted,
                scores: prediction.into_vec(),
                padded,
            });
        }
    }
    Ok(report)
}

/// Render every channel of a padded map as rows of fixed-width numbers.
pub fn render_padded(map: &FeatureMap) -> String {
    let shape = map.shape();
    let mut out = String::new();
    for c in 0..shape.channels() {
        for y in 0..shape.height() {
            if let Some(row) = map.row(c, y) {
                let line: Vec<String> = row.iter().map(|v| format!("{v:5.2}")).collect();
                let _ = writeln!(out, "{}", line.join(" "));
            }
        }
    }
    out
}
