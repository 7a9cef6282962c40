//! Command-line front end for the prediction workflow.
//!
//! Usage:
//!   cardiorisk [--config <FILE>] <COMMAND>
//!
//! Commands:
//!   predict --input <FILE> [--export]   Submit a feature vector (JSON or TOML)
//!   history                             List stored predictions
//!   insights                            Aggregate statistics over history
//!   replay <ID> [--export]              Show a stored prediction again
//!   clear-history                       Remove all stored predictions
//!   health                              Probe the prediction service

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use cardiorisk::impact::{format_contribution, rank_impacts, Direction};
use cardiorisk::{
    build_orchestrator, AppConfig, FeatureVector, HttpPredictionService, PredictionOrchestrator,
    PredictionService, SessionSnapshot, SubmitOutcome,
};

#[derive(Parser)]
#[command(name = "cardiorisk")]
#[command(about = "Heart failure risk predictions against a remote model service")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a feature vector and show the prediction
    Predict {
        /// Feature vector file, .json or .toml
        #[arg(short, long)]
        input: PathBuf,

        /// Also write the export artifact
        #[arg(long)]
        export: bool,
    },
    /// List stored predictions, most recent first
    History,
    /// Risk distribution and probability statistics over history
    Insights,
    /// Load a stored prediction into the session
    Replay {
        id: u64,

        #[arg(long)]
        export: bool,
    },
    /// Remove all stored predictions
    ClearHistory,
    /// Check that the prediction service is reachable
    Health,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cardiorisk::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let orchestrator = build_orchestrator(&config)?;

    match cli.command {
        Command::Predict { input, export } => {
            let features = read_features(&input)?;
            let export_dir = if export { Some(config.export_dir()?) } else { None };

            let result = predict_and_export(&orchestrator, &features, export_dir.as_deref()).await;
            print_notifications(&orchestrator);
            let (outcome, exported) = result?;

            match outcome {
                SubmitOutcome::Completed(entry) => {
                    println!("Saved as history entry {}", entry.id);
                    print_session(&orchestrator.session());
                }
                SubmitOutcome::Superseded => println!("Result superseded by a newer request"),
            }
            if let Some(path) = exported {
                println!("Exported to {}", path.display());
            }
        }
        Command::History => {
            let entries = orchestrator.history();
            if entries.is_empty() {
                println!("No predictions yet.");
            }
            for entry in entries {
                let risk = cardiorisk::classify(entry.prediction.probability);
                println!(
                    "{:>14}  {}  {:>5.1}%  {:<13}  {}",
                    entry.id,
                    entry.timestamp,
                    entry.prediction.probability * 100.0,
                    risk.category.label(),
                    entry.prediction.result
                );
            }
        }
        Command::Insights => match orchestrator.history_insights() {
            Some(insights) => {
                println!("Predictions:      {}", insights.total);
                println!("  Low risk:       {}", insights.low_risk);
                println!("  Moderate risk:  {}", insights.moderate_risk);
                println!("  High risk:      {}", insights.high_risk);
                println!("Average risk:     {:.1}%", insights.average_probability * 100.0);
                println!("Highest risk:     {:.1}%", insights.max_probability * 100.0);
                println!("Lowest risk:      {:.1}%", insights.min_probability * 100.0);
            }
            None => println!("No predictions yet."),
        },
        Command::Replay { id, export } => {
            let session = orchestrator.replay(id)?;
            print_session(&session);
            if export {
                export_session(&orchestrator, &config)?;
            }
        }
        Command::ClearHistory => {
            orchestrator.clear_history()?;
            print_notifications(&orchestrator);
        }
        Command::Health => {
            let status = orchestrator.service().health().await?;
            println!(
                "{} is up: {}",
                orchestrator.service().base_url(),
                status.message
            );
        }
    }
    Ok(())
}

fn read_features(path: &Path) -> Result<FeatureVector> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feature file {:?}", path))?;

    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    if is_toml {
        toml::from_str(&content).with_context(|| format!("Invalid feature TOML in {:?}", path))
    } else {
        serde_json::from_str(&content).with_context(|| format!("Invalid feature JSON in {:?}", path))
    }
}

/// Submit `features` and, when `export_dir` is set and the round trip
/// completed, write the export artifact there.
async fn predict_and_export<S: PredictionService>(
    orchestrator: &PredictionOrchestrator<S>,
    features: &FeatureVector,
    export_dir: Option<&Path>,
) -> Result<(SubmitOutcome, Option<PathBuf>)> {
    let outcome = orchestrator.submit(features).await?;
    let exported = match (&outcome, export_dir) {
        (SubmitOutcome::Completed(_), Some(dir)) => Some(orchestrator.export_to_dir(dir)?),
        _ => None,
    };
    Ok((outcome, exported))
}

fn export_session(
    orchestrator: &PredictionOrchestrator<HttpPredictionService>,
    config: &AppConfig,
) -> Result<()> {
    let dir = config.export_dir()?;
    let path = orchestrator.export_to_dir(&dir)?;
    println!("Exported to {}", path.display());
    Ok(())
}

fn print_session(session: &SessionSnapshot) {
    let (Some(prediction), Some(risk)) = (&session.prediction, session.risk()) else {
        println!("No risk data");
        return;
    };

    println!("Result:       {}", prediction.result);
    println!(
        "Probability:  {:.0}%  ({}, {})",
        prediction.probability * 100.0,
        risk.category.label(),
        risk.color
    );

    if session.impacts.is_empty() {
        return;
    }
    println!("Feature impact:");
    for row in rank_impacts(&session.impacts) {
        let bar = "#".repeat((row.bar_width / 5.0).round() as usize);
        let arrow = match row.direction {
            Direction::Increases => "raises risk",
            Direction::Decreases => "lowers risk",
        };
        println!(
            "  {:<28} {:>7}  {:<20} {}",
            row.feature,
            format_contribution(row.value),
            bar,
            arrow
        );
    }
}

fn notification_lines<S: PredictionService>(orchestrator: &PredictionOrchestrator<S>) -> Vec<String> {
    orchestrator
        .notifications()
        .active()
        .iter()
        .map(|n| format!("[{}] {}: {}", n.time_label(), n.severity, n.message))
        .collect()
}

fn print_notifications<S: PredictionService>(orchestrator: &PredictionOrchestrator<S>) {
    for line in notification_lines(orchestrator) {
        println!("{}", line);
    }
}
