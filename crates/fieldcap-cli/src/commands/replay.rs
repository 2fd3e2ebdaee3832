//! Replay command - feed one frame per file through a shared session.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use fieldcap_core::{ExtractionSession, Frame, SharedSession};

use super::process::{CaptureResult, OutputFormat, format_result};

/// Arguments for the replay command.
#[derive(Args)]
pub struct ReplayArgs {
    /// Glob pattern matching frame files (one JSON frame per file)
    #[arg(required = true)]
    input: String,

    /// Output format for the final result
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Skip frames that cannot be read instead of stopping
    #[arg(long)]
    continue_on_error: bool,
}

pub async fn run(args: ReplayArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching frame files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} frames to replay",
        style("ℹ").blue(),
        files.len()
    );

    let shared = SharedSession::new(ExtractionSession::new(&config)?);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames {msg}")?
            .progress_chars("=>-"),
    );

    // Frames arrive on their own thread, as they would from a live detector.
    let detector = {
        let shared = shared.clone();
        let pb = pb.clone();
        let continue_on_error = args.continue_on_error;
        tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
            let mut skipped = 0;
            for path in &files {
                let frame = match read_frame(path) {
                    Ok(frame) => frame,
                    Err(e) if continue_on_error => {
                        warn!("Skipping {}: {}", path.display(), e);
                        skipped += 1;
                        pb.inc(1);
                        continue;
                    }
                    Err(e) => {
                        error!("Failed to read {}: {}", path.display(), e);
                        return Err(e);
                    }
                };

                let report = shared.process_frame(&frame)?;
                let updated = report.selected().count();
                if updated > 0 {
                    debug!("{}: {} fields updated", path.display(), updated);
                }
                pb.inc(1);
            }
            Ok(skipped)
        })
    };

    // Readers take the same lock as the detector, so this never sees a
    // half-updated field.
    let resolved = shared.with_session(|s| s.fields().iter().filter(|f| f.is_resolved()).count())?;
    debug!("{} fields resolved when the detector started", resolved);

    let skipped = detector.await??;
    pb.finish_with_message("Complete");

    let result = shared.with_session(|s| CaptureResult::from(&*s))?;
    println!("{}", format_result(&result, args.format)?);

    eprintln!(
        "{} Replayed {} frames in {:?} ({} skipped)",
        style("✓").green(),
        result.frames_processed,
        start.elapsed(),
        skipped
    );

    if !result.missing_mandatory.is_empty() {
        eprintln!(
            "{} Missing mandatory fields: {}",
            style("!").yellow(),
            result.missing_mandatory.join(", ")
        );
    }

    Ok(())
}

fn read_frame(path: &Path) -> anyhow::Result<Frame> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
