//! Process command - extract fields from a single card image.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use cardex_core::{Extractor, Verdict};

use super::output::{self, OutputFormat, Record};
use super::sidecar::Sidecar;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input image
    #[arg(required = true)]
    input: PathBuf,

    /// Regions file (default: <image stem>.regions.json next to the image)
    #[arg(short, long)]
    regions: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show what happened to each region
    #[arg(long)]
    explain: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let regions_path = args
        .regions
        .clone()
        .unwrap_or_else(|| Sidecar::path_for(&args.input));
    if !regions_path.exists() {
        anyhow::bail!("Regions file not found: {}", regions_path.display());
    }

    info!("Processing file: {}", args.input.display());

    let image = image::open(&args.input)?;
    let sidecar = Sidecar::load(&regions_path)?;
    let extractor = Extractor::from_config(config.clone())?;

    let report = extractor.extract_detected(&image, &sidecar, &sidecar)?;
    let verdict = config.review.verdict(&report.result);

    let record = Record::new(&args.input, &report.result, verdict);
    let content = output::format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &content)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", content.trim_end());
    }

    if args.explain {
        eprintln!();
        eprintln!("{}", style("Regions:").bold());
        for line in output::explain(&report) {
            eprintln!("  {}", line);
        }
    }

    let message = output::describe_verdict(verdict, &report.result);
    match verdict {
        Verdict::Complete => eprintln!("{} {}", style("✓").green(), message),
        Verdict::Incomplete => eprintln!("{} {}", style("!").yellow(), message),
        Verdict::RetryWithClearerImage => eprintln!("{} {}", style("✗").red(), message),
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
