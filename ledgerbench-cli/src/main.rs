//! Ledgerbench CLI - Run and analyze tool-calling experiments

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ledgerbench_core::config::LedgerbenchConfig;
use ledgerbench_core::journal::JournalFormat;
use ledgerbench_core::llm::OllamaAgent;
use ledgerbench_core::report::{analyze, ExperimentReport};
use ledgerbench_core::runner::{ExperimentRunner, ResumePoint};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ledgerbench")]
#[command(about = "Tool-calling consistency experiments for LLM agents", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ledgerbench.toml and LEDGERBENCH_* variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the experiment matrix
    Run {
        /// Resume from this tool configuration (e.g. CONF2)
        #[arg(long)]
        from_config: Option<String>,

        /// Resume from this prompt (e.g. P2)
        #[arg(long)]
        from_prompt: Option<String>,

        /// Resume from this scenario (e.g. P2B)
        #[arg(long)]
        from_scenario: Option<String>,

        /// Runs per combination
        #[arg(short, long)]
        runs: Option<usize>,

        /// Directory for result files
        #[arg(long)]
        results_dir: Option<PathBuf>,

        /// Format of per-trial journals
        #[arg(long, value_enum)]
        journal_format: Option<JournalFormatArg>,
    },
    /// Print the acceptance criteria
    Criteria {
        /// Only describe this scenario (e.g. P2B)
        #[arg(long)]
        scenario: Option<String>,
    },
    /// Write the final report and print the analysis
    Report {
        /// Directory holding result files
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
    /// Version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum JournalFormatArg {
    Json,
    JsonLines,
    Csv,
}

impl From<JournalFormatArg> for JournalFormat {
    fn from(arg: JournalFormatArg) -> Self {
        match arg {
            JournalFormatArg::Json => JournalFormat::Json,
            JournalFormatArg::JsonLines => JournalFormat::JsonLines,
            JournalFormatArg::Csv => JournalFormat::Csv,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<LedgerbenchConfig> {
    let config = match path {
        Some(path) => LedgerbenchConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => LedgerbenchConfig::load().context("Failed to load configuration")?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("ledgerbench {}", env!("CARGO_PKG_VERSION"));
            println!("ledgerbench-core {}", ledgerbench_core::VERSION);
        }
        Commands::Criteria { scenario } => {
            let config = load_config(cli.config.as_ref())?;
            match scenario {
                Some(id) => print!("{}", config.experiment.render_scenario(&id)),
                None => print!("{}", config.experiment.acceptance_table().render()),
            }
        }
        Commands::Report { results_dir } => {
            let config = load_config(cli.config.as_ref())?;
            let dir = results_dir.unwrap_or(config.run.results_dir);

            let report = ExperimentReport::collect(&dir)
                .with_context(|| format!("Failed to read results from {}", dir.display()))?;
            let path = report.save(&dir)?;
            tracing::info!(path = %path.display(), combinations = report.len(), "Final report written");

            println!("{}", report.render_summary());
            println!("{}", analyze(&dir, &config.experiment)?.render());
        }
        Commands::Run {
            from_config,
            from_prompt,
            from_scenario,
            runs,
            results_dir,
            journal_format,
        } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(runs) = runs {
                config.run.runs_per_combination = runs;
            }
            if let Some(dir) = results_dir {
                config.run.results_dir = dir;
            }
            if let Some(format) = journal_format {
                config.run.journal_format = format.into();
            }
            config.validate()?;

            let agent = Arc::new(OllamaAgent::new(config.backend.clone())?);
            let runner = ExperimentRunner::new(config, agent);

            if let Err(e) = runner.check_backend().await {
                tracing::error!(error = %e, "Inference backend is not reachable");
                eprintln!("{}", e);
                std::process::exit(1);
            }

            let resume = ResumePoint {
                config: from_config,
                prompt: from_prompt,
                scenario: from_scenario,
            };
            let report = runner.run(&resume).await?;
            println!("{}", report.render_summary());
            println!("Results written to {}", runner.store().dir().display());
        }
    }

    Ok(())
}
