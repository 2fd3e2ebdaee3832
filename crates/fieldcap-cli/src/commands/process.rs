//! Process command - replay a file of recorded frames.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fieldcap_core::extraction::FieldSnapshot;
use fieldcap_core::{ExtractionSession, Frame};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// JSON file holding one frame or an array of frames
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Fail if mandatory fields are still unresolved
    #[arg(long)]
    strict: bool,

    /// Print per-field display lines with keyword and pattern details
    #[arg(long)]
    show_debug: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FrameInput {
    Many(Vec<Frame>),
    One(Frame),
}

/// Everything a caller learns at confirmation time.
#[derive(Debug, Serialize)]
pub struct CaptureResult {
    pub frames_processed: u64,
    pub confirmed: BTreeMap<String, String>,
    pub missing_mandatory: Vec<String>,
    pub fields: Vec<FieldSnapshot>,
}

impl From<&ExtractionSession> for CaptureResult {
    fn from(session: &ExtractionSession) -> Self {
        Self {
            frames_processed: session.frames_processed(),
            confirmed: session.confirm(),
            missing_mandatory: session
                .missing_mandatory()
                .into_iter()
                .map(str::to_string)
                .collect(),
            fields: session.snapshot(),
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let content = fs::read_to_string(&args.input)?;
    let frames = match serde_json::from_str(&content)? {
        FrameInput::Many(frames) => frames,
        FrameInput::One(frame) => vec![frame],
    };

    info!(
        "Processing {} frames from {}",
        frames.len(),
        args.input.display()
    );

    let mut session = ExtractionSession::new(&config)?;

    let pb = ProgressBar::new(frames.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    for (i, frame) in frames.iter().enumerate() {
        let report = session.process_frame(frame);
        let selected: Vec<&str> = report.selected().collect();
        if !selected.is_empty() {
            info!("Frame {}: updated {}", i + 1, selected.join(", "));
        }
        pb.inc(1);
    }

    pb.finish_with_message("Done");

    let result = CaptureResult::from(&session);
    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_debug {
        println!();
        for line in session.with_debug(true).display_lines() {
            println!("{} {}", style("ℹ").blue(), line);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    if args.strict && !result.missing_mandatory.is_empty() {
        anyhow::bail!(
            "Mandatory fields unresolved: {}",
            result.missing_mandatory.join(", ")
        );
    }

    Ok(())
}

pub fn format_result(result: &CaptureResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &CaptureResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["field", "value", "mandatory", "keyword", "pattern"])?;

    for field in &result.fields {
        let value = result
            .confirmed
            .get(&field.name)
            .map(String::as_str)
            .unwrap_or_default();
        let pattern = field
            .pattern_index
            .map(|i| (i + 1).to_string())
            .unwrap_or_default();
        wtr.write_record([
            field.name.as_str(),
            value,
            if field.mandatory { "true" } else { "false" },
            field.keyword.as_deref().unwrap_or_default(),
            pattern.as_str(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &CaptureResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Frames: {}\n\n", result.frames_processed));

    let width = result
        .fields
        .iter()
        .map(|f| f.name.chars().count())
        .max()
        .unwrap_or(0);

    for field in &result.fields {
        let value = result
            .confirmed
            .get(&field.name)
            .map(String::as_str)
            .unwrap_or_default();
        let marker = if field.mandatory { "*" } else { " " };
        output.push_str(&format!("{}{:width$}  {}\n", marker, field.name, value, width = width));
    }

    if !result.missing_mandatory.is_empty() {
        output.push_str(&format!("\nMissing: {}\n", result.missing_mandatory.join(", ")));
    }

    output
}
