use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod artifacts;
mod catalog;
mod classifier;
mod collector;
mod config;
mod error;
mod features;
mod inference;
mod models;
mod presenter;
mod report;
mod scaler;

use artifacts::{ArtifactCache, ArtifactState};
use config::ArtifactPaths;
use presenter::{Session, ViewState};
use report::RowOutcome;

#[derive(Parser)]
#[command(name = "dropout-risk")]
#[command(about = "Student dropout risk prediction from a pre-trained classifier", long_about = None)]
struct Cli {
    /// Directory holding the model, scaler and encoder artifacts
    #[arg(long, global = true)]
    artifacts_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict dropout risk for one submission (JSON)
    Predict {
        #[arg(long)]
        input: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score every row of a CSV file and write a markdown report
    Batch {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Load the artifacts and report their status
    Check,
    /// List the form fields, their options and bounds
    Fields,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dropout_risk=info")),
        )
        .init();

    let cli = Cli::parse();
    let cache = ArtifactCache::new(ArtifactPaths::from_flag_or_env(cli.artifacts_dir));

    match cli.command {
        Commands::Predict { input, json } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;

            let mut session = Session::new(&cache);
            let state = match session.submit_json(&text) {
                Ok(state) => state.clone(),
                Err(e) => {
                    println!("{e}");
                    return Ok(ExitCode::FAILURE);
                }
            };

            match state {
                ViewState::ResultDisplayed(presentation) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&presentation)?);
                    } else {
                        print!("{}", presentation.render_text());
                    }
                }
                ViewState::ErrorDisplayed { message, detail } => {
                    println!("{message}");
                    println!("Detail: {detail}");
                    return Ok(ExitCode::FAILURE);
                }
                ViewState::AwaitingSubmission => {}
            }
        }
        Commands::Batch { csv, out } => {
            if let Err(e) = cache.artifacts() {
                println!("{e}");
                return Ok(ExitCode::FAILURE);
            }

            let file = File::open(&csv)
                .with_context(|| format!("failed to open {}", csv.display()))?;
            let rows = collector::parse_csv(file)
                .with_context(|| format!("failed to read CSV header from {}", csv.display()))?;

            let outcomes: Vec<RowOutcome> = rows
                .into_iter()
                .enumerate()
                .map(|(index, row)| score_row(&cache, index + 1, row))
                .collect();
            let summary = report::summarize(&outcomes);

            let report = report::build_report(
                &csv.display().to_string(),
                chrono::Utc::now(),
                &outcomes,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;

            info!(
                rows = outcomes.len(),
                high_risk = summary.high_risk,
                failed = summary.failed,
                "Batch scored"
            );
            println!(
                "Scored {} submissions ({} at risk, {} failed). Report written to {}.",
                outcomes.len(),
                summary.high_risk,
                summary.failed,
                out.display()
            );
        }
        Commands::Check => match cache.state() {
            ArtifactState::Ready(set) => {
                println!("Artifacts ready.");
                println!(
                    "Model: {} (label threshold {:.2})",
                    set.model.kind(),
                    set.model.threshold()
                );
                println!("Scaler columns ({}):", set.scaler.width());
                for name in set.scaler.feature_names() {
                    println!("- {name}");
                }
                println!("Label encoders:");
                for (column, classes) in set.encoders.columns() {
                    println!("- {column}: {classes} classes");
                }
            }
            ArtifactState::Unavailable { reason } => {
                println!("Artifacts unavailable: {reason}");
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Fields => {
            for choices in catalog::ALL_CHOICES {
                println!("{}", choices.field);
                for (label, code) in choices.options {
                    println!("  {code:>5}  {label}");
                }
            }
            println!("Numeric bounds");
            for bounds in catalog::ALL_BOUNDS {
                if bounds.max.is_finite() {
                    println!("  {}: {}..={}", bounds.field, bounds.min, bounds.max);
                } else {
                    println!("  {}: >= {}", bounds.field, bounds.min);
                }
            }
            println!("  Curricular_units_*_sem_* counts: >= 0");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn score_row(
    cache: &ArtifactCache,
    row: usize,
    raw: Result<collector::RawSubmission, error::InputError>,
) -> RowOutcome {
    let student_id = raw.as_ref().ok().and_then(|raw| raw.student_id.clone());
    let result = raw
        .and_then(|raw| collector::collect(&raw))
        .map_err(|e| e.to_string())
        .and_then(|record| {
            inference::predict_record(cache, &record).map_err(|e| e.to_string())
        });

    if let Err(e) = &result {
        tracing::warn!(row, error = %e, "Row could not be scored");
    }

    RowOutcome {
        row,
        student_id,
        result,
    }
}
