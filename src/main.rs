use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use mlboard::cli::{self, OutputFormat};
use mlboard::llm::config::LlmConfig;
use mlboard::llm::gemini::GeminiClient;
use mlboard::web;

#[derive(Debug, Parser)]
#[command(name = "mlboard")]
#[command(about = "ML experiment dashboard backend — insight flows and comparison tools")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze experiment results with a free-text query
    Analyze {
        /// Experiment results text (metrics, logs, config)
        #[arg(long)]
        results: Option<String>,
        /// Read experiment results from a file instead
        #[arg(long, value_name = "PATH")]
        results_file: Option<PathBuf>,
        /// The question to ask about the results
        #[arg(long)]
        query: String,
        /// Output format: text (default), json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Summarize an experiment from its name, metrics, and viz notes
    Summarize {
        /// Experiment name
        #[arg(long)]
        name: String,
        /// Metrics as name=value pairs (repeatable)
        #[arg(long = "metric", value_name = "NAME=VALUE")]
        metrics: Vec<String>,
        /// Free-form description of the experiment's visualizations
        #[arg(long)]
        viz: String,
        /// Output format: text (default), json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Compare two experiment JSON files
    Compare {
        /// First experiment file
        first: PathBuf,
        /// Second experiment file
        second: PathBuf,
        /// Output format: text (default), json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Check provider config and reachability
    Health,
    /// Show flow invocation statistics
    Stats {
        /// Output format: text (default), json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Start the dashboard JSON API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:9748")]
        addr: String,
    },
}

fn main() -> Result<()> {
    let app = App::parse();

    // One client for the whole process, injected into every flow invocation.
    let client = GeminiClient::from_config(&LlmConfig::load());

    match app.command {
        Commands::Analyze {
            results,
            results_file,
            query,
            format,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_analyze(
                &client,
                results.as_deref(),
                results_file.as_deref(),
                &query,
                fmt,
            )
        }
        Commands::Summarize {
            name,
            metrics,
            viz,
            format,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_summarize(&client, &name, &metrics, &viz, fmt)
        }
        Commands::Compare {
            first,
            second,
            format,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_compare(&first, &second, fmt)
        }
        Commands::Health => cli::run_health(&client),
        Commands::Stats { format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(fmt)
        }
        Commands::Serve { addr } => web::serve(&addr, &client),
    }
}
