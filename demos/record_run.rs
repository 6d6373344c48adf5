//! Run Recording Example
//!
//! Demonstrates a training loop recording tags into an in-memory run.
//!
//! Run with: RUST_LOG=debug cargo run --example record_run

use trueno_runlog::logging::init_tracing;
use trueno_runlog::persist::encode_tag;
use trueno_runlog::run::{MemoryCatalog, MemoryWorkspace, RunOptions};
use trueno_runlog::value::Histogram;
use trueno_runlog::ExperimentRecorder;

#[allow(clippy::cast_precision_loss)]
fn main() -> trueno_runlog::Result<()> {
    init_tracing("info");
    println!("=== trueno-runlog Run Recording ===\n");

    let catalog = MemoryCatalog::with_names("runs", ["warmup"])?;
    let options = RunOptions::from_json(
        r#"{"description": "resnet sweep", "config": {"lr": 0.001, "batch_size": 32}}"#,
    )?;
    let mut recorder = ExperimentRecorder::in_memory(options, &catalog, &MemoryWorkspace::new())?;
    println!("Run: {} (index {})", recorder.run().name(), recorder.run().index());

    for epoch in 1..=10_u64 {
        let loss = 2.5 / (epoch as f64) + 0.1;
        recorder.add("train/loss", loss, None)?;
        recorder.add("accuracy", 0.5 + 0.04 * epoch as f64, Some(epoch))?;
        let weights: Vec<f64> = (0..16).map(|i| (i as f64).sin() / epoch as f64).collect();
        recorder.add("weights", Histogram::new(weights), None)?;
    }

    // Dropped with warnings: duplicate step, unresolvable text, mixed kinds
    recorder.add("accuracy", 0.99, Some(3))?;
    recorder.add("train/loss", "nan-ish", None)?;
    recorder.add("weights", 1.0, None)?;

    for tag in recorder.tags() {
        if let Some(agg) = recorder.aggregate(&tag) {
            println!(
                "{tag:>12}: count={} min={:?} max={:?}",
                agg.count(),
                agg.min(),
                agg.max()
            );
        }
    }

    let persisted = recorder.persistence().records(&encode_tag("train/loss"));
    println!("\nPersisted {} records under '{}'", persisted.len(), encode_tag("train/loss"));

    recorder.success()?;
    println!(
        "\n{}",
        serde_json::to_string_pretty(&recorder.snapshot())?
    );
    Ok(())
}
