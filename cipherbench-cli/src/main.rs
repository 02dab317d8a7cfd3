// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! cipherbench CLI
//!
//! Command-line interface for the cipherbench encryption benchmark.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod metrics;

/// cipherbench - Instrumented encryption benchmark pipeline
#[derive(Parser)]
#[command(name = "cipherbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the benchmark sweep
    Run {
        /// Configuration file path
        #[arg(short, long, default_value = "cipherbench.yaml")]
        config: PathBuf,

        /// Serve metrics on this port (overrides metrics.port)
        #[arg(long)]
        metrics_port: Option<u16>,

        /// Iterations per run (overrides benchmark.total_iterations)
        #[arg(long)]
        iterations: Option<u64>,

        /// Keep serving metrics after the sweep until Ctrl+C
        #[arg(long)]
        hold: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: PathBuf,
    },

    /// Ingest plaintext payloads into a file store
    Seed {
        /// Store root directory
        #[arg(short, long, default_value = "./store")]
        store: PathBuf,

        /// Generate the standard 100KB..5MB payload set
        #[arg(long)]
        standard: bool,

        /// Generate a text payload sized by its label, e.g. "750KB file"
        #[arg(long = "generate", value_name = "LABEL")]
        generate: Vec<String>,

        /// Ingest a file under a label, as LABEL=PATH
        #[arg(long = "file", value_name = "LABEL=PATH", value_parser = commands::seed::parse_file_arg)]
        files: Vec<(String, PathBuf)>,
    },

    /// List registered algorithms
    Algorithms,

    /// List saved sweep reports, or print one
    Reports {
        /// Directory holding sweep_*.json reports
        #[arg(short, long, default_value = "results")]
        dir: PathBuf,

        /// Print the summary table of this report
        #[arg(long, value_name = "PATH")]
        show: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Run {
            config,
            metrics_port,
            iterations,
            hold,
        } => commands::run::execute(&config, metrics_port, iterations, hold).await,
        Commands::Validate { file } => commands::validate::execute(&file).await,
        Commands::Seed {
            store,
            standard,
            generate,
            files,
        } => commands::seed::execute(&store, standard, &generate, &files).await,
        Commands::Algorithms => commands::algorithms::execute().await,
        Commands::Reports { dir, show } => {
            commands::reports::execute(&dir, show.as_deref()).await
        }
    }
}
