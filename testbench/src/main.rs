use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use hlsnet_testbench::{bench, dataset, logging, render_padded, ModelFile};

/// Classify a labelled image set and report accuracy and latency.
#[derive(Parser)]
#[command(name = "hlsnet-tb", version)]
struct Cli {
    /// JSON network description
    #[arg(long)]
    model: PathBuf,
    /// Whitespace-separated image samples, row-major, image after image
    #[arg(long)]
    images: PathBuf,
    /// Whitespace-separated expected class indices
    #[arg(long)]
    labels: PathBuf,
    /// Number of samples to classify
    #[arg(long, default_value_t = 500)]
    samples: usize,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("can't open file `{}`", path.display()))?;
    Ok(BufReader::new(file))
}

fn run(cli: &Cli) -> Result<()> {
    let model = ModelFile::load(&cli.model)?;
    let net = model.build().context("invalid network configuration")?;
    let (rows, cols) = net.input_shape();
    info!(rows, cols, stages = net.stages().len(), classes = net.classes(), "network ready");

    let images = dataset::read_images(open(&cli.images)?, cli.samples, rows, cols)
        .with_context(|| format!("in `{}`", cli.images.display()))?;
    let labels = dataset::read_labels(open(&cli.labels)?, cli.samples)
        .with_context(|| format!("in `{}`", cli.labels.display()))?;

    let report = bench::run(&net, &images, &labels)?;

    for miss in &report.mispredictions {
        warn!(index = miss.index, expected = miss.expected, predicted = miss.predicted, "misprediction");
        println!("\nExpected: {}", miss.expected);
        print!("{}", render_padded(&miss.padded));
        println!("Prediction:");
        for (class, score) in miss.scores.iter().enumerate() {
            println!("{class}: {score:.6}");
        }
    }
    println!("\n{report}\n");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = logging::init_tracing() {
        eprintln!("warning: {err:#}");
    }
    if let Err(err) = run(&cli) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}
