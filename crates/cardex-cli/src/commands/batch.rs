//! Batch processing command for multiple card images.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use cardex_core::{CardexConfig, ExtractionResult, Extractor, Verdict};

use super::output::{self, Record, TABLE_COLUMNS};
use super::sidecar::Sidecar;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for per-record JSON and the records table
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of images processed at once
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: Option<ExtractionResult>,
    verdict: Option<Verdict>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(
                ext.to_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "bmp" | "tif" | "tiff" | "webp"
            )
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let extractor = Arc::new(Extractor::from_config(config.clone())?);
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = semaphore.clone().acquire_owned().await?;
        let extractor = Arc::clone(&extractor);
        let config = config.clone();
        let pb = overall_pb.clone();

        let task_path = path.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let outcome = process_single_file(&task_path, &extractor, &config);
            pb.inc(1);
            (outcome, file_start.elapsed().as_millis() as u64)
        });
        handles.push((path, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        let joined = handle.await;
        if joined.is_err() {
            overall_pb.inc(1);
        }
        let (outcome, processing_time_ms) = join_outcome(joined);

        match outcome {
            Ok((result, verdict)) => results.push(ProcessResult {
                path,
                result: Some(result),
                verdict: Some(verdict),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = format!("{:#}", e);
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        result: None,
                        verdict: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.result.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        let persisted = persist_records(output_dir, &results, &config)?;
        println!(
            "{} Persisted {} of {} records to {}",
            style("✓").green(),
            persisted,
            successful.len(),
            output_dir.display()
        );
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

type FileOutcome = (anyhow::Result<(ExtractionResult, Verdict)>, u64);

/// A task that died before reporting counts as a failure of its own file.
fn join_outcome(joined: Result<FileOutcome, tokio::task::JoinError>) -> FileOutcome {
    joined.unwrap_or_else(|e| (Err(anyhow::anyhow!("worker task failed: {}", e)), 0))
}

fn process_single_file(
    path: &Path,
    extractor: &Extractor,
    config: &CardexConfig,
) -> anyhow::Result<(ExtractionResult, Verdict)> {
    let regions_path = Sidecar::path_for(path);
    if !regions_path.exists() {
        anyhow::bail!("Regions file not found: {}", regions_path.display());
    }

    let image = image::open(path)?;
    let sidecar = Sidecar::load(&regions_path)?;
    let report = extractor.extract_detected(&image, &sidecar, &sidecar)?;
    let verdict = config.review.verdict(&report.result);

    debug!("{}: {:?}", path.display(), verdict);
    Ok((report.result, verdict))
}

/// Write per-record JSON files and `records.csv` for every record the review
/// policy accepts. Returns the number of records written.
fn persist_records(
    output_dir: &Path,
    results: &[ProcessResult],
    config: &CardexConfig,
) -> anyhow::Result<usize> {
    let mut persisted = Vec::new();
    let mut used_names = HashSet::new();

    for entry in results {
        let (Some(result), Some(verdict)) = (&entry.result, entry.verdict) else {
            continue;
        };
        if !config.review.should_persist(result) {
            debug!("Not persisting {}: {:?}", entry.path.display(), verdict);
            continue;
        }

        let stem = entry
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("record");
        let name = unique_name(stem, &mut used_names);
        if name != stem {
            warn!(
                "{} shares its name with an earlier record, writing {}.json",
                entry.path.display(),
                name
            );
        }

        let record = Record::new(&entry.path, result, verdict);
        let written = output::write_record_json(output_dir, &name, &record)?;
        debug!("Wrote output to {}", written.display());

        persisted.push(result);
    }

    output::write_csv(&output_dir.join("records.csv"), &persisted)?;
    Ok(persisted.len())
}

/// `stem`, or `stem_N` with the smallest N >= 2 not yet taken.
fn unique_name(stem: &str, used: &mut HashSet<String>) -> String {
    let mut name = stem.to_string();
    let mut suffix = 2;
    while !used.insert(name.clone()) {
        name = format!("{}_{}", stem, suffix);
        suffix += 1;
    }
    name
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "status", "verdict"];
    header.extend(TABLE_COLUMNS.map(|kind| kind.label()));
    header.extend(["missing", "processing_time_ms", "error"]);
    wtr.write_record(&header)?;

    for entry in results {
        let filename = entry
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = entry.processing_time_ms.to_string();

        let mut row: Vec<String> = vec![filename.to_string()];
        match (&entry.result, entry.verdict) {
            (Some(result), Some(verdict)) => {
                row.push("success".to_string());
                row.push(serde_json::to_value(verdict)?.as_str().unwrap_or("").to_string());
                row.extend(TABLE_COLUMNS.map(|kind| result.value(kind).to_string()));
                row.push(output::join_keys(result.missing()));
                row.push(time);
                row.push(String::new());
            }
            _ => {
                row.push("error".to_string());
                row.push(String::new());
                row.extend(TABLE_COLUMNS.map(|_| String::new()));
                row.push(String::new());
                row.push(time);
                row.push(entry.error.clone().unwrap_or_default());
            }
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
