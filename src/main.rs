use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use movie_eda::config::Config;
use movie_eda::error::EdaError;
use movie_eda::observability::{self, metrics};
use movie_eda::pipeline::{Pipeline, Stages};

#[derive(Parser)]
#[command(name = "movie_eda")]
#[command(about = "Exploratory data analysis of a movie ratings dataset")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML configuration file (defaults to movie_eda.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CSV data file, overrides the configured path
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, clean, analyse, chart and report (the default)
    Run {
        /// Skip chart rendering
        #[arg(long)]
        no_charts: bool,
    },
    /// Load and clean, then write the cleaned table as CSV
    Clean {
        #[arg(long, default_value = "output/cleaned.csv")]
        output: PathBuf,
    },
    /// Load, clean and print the exploratory analysis only
    Eda,
    /// Load, clean and print the summary report
    Report {
        /// Also write the report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let _log_guard = observability::init_logging();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(input) = cli.input {
        config.data.path = input;
    }

    let metrics_handle = if config.metrics.enabled {
        Some(metrics::init().context("Failed to install metrics recorder")?)
    } else {
        None
    };
    let metrics_path = config.metrics.output_path.clone();

    println!("🎬 Starting movie dataset analysis...");

    let command = cli.command.unwrap_or(Commands::Run { no_charts: false });
    let outcome = match command {
        Commands::Run { no_charts } => {
            let stages = Stages {
                charts: !no_charts,
                ..Stages::all()
            };
            Pipeline::new(config).run(stages).map(|_| ())
        }
        Commands::Clean { output } => {
            let pipeline = Pipeline::new(config);
            pipeline
                .load_and_clean()
                .map_err(EdaError::from)
                .and_then(|(_, cleaned)| Pipeline::persist_cleaned(&cleaned, &output))
                .map(|_| println!("💾 Cleaned table written to {}", output.display()))
        }
        Commands::Eda => Pipeline::new(config).run(Stages::eda_only()).map(|_| ()),
        Commands::Report { json } => {
            if json.is_some() {
                config.report.json_path = json;
            }
            Pipeline::new(config).run(Stages::report_only()).map(|_| ())
        }
    };

    let result: Result<()> = match outcome {
        Ok(()) => {
            info!("Analysis complete");
            println!("\n{}", "=".repeat(50));
            println!("ANALYSIS COMPLETE");
            println!("{}", "=".repeat(50));
            Ok(())
        }
        Err(EdaError::DataUnavailable(e)) => {
            error!("Data unavailable: {}", e);
            println!("❌ Data could not be loaded ({}). Please check the file path. Terminating.", e);
            Err(e.into())
        }
        Err(e) => {
            error!("Run failed: {}", e);
            println!("❌ Run failed: {}", e);
            Err(e.into())
        }
    };

    // Snapshot failures are logged only
    if let Some(handle) = &metrics_handle {
        metrics::flush_snapshot(handle, &metrics_path);
    }

    result
}
