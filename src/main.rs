// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Trustroute CLI - developer harness for the trust graph engine
//!
//! Runs the engine against a JSON fixture instead of a live backend.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "trustroute")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "TRUSTROUTE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// JSON fixture standing in for the record source
    #[arg(short, long, env = "TRUSTROUTE_FIXTURE", global = true)]
    fixture: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the trust graph for a user
    Graph {
        /// Requesting user id
        user: String,

        /// Keep only reviews of this category (label or code)
        #[arg(long)]
        category: Option<String>,

        /// Output format (json, dot)
        #[arg(long, default_value = "json")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rank referral routes from a user to a target
    Route {
        /// Requesting user id
        user: String,

        /// Target node id, user id or organization name
        target: String,

        /// Number of routes to return
        #[arg(short = 'n', long)]
        max_paths: Option<usize>,
    },

    /// Show how a raw record resolves
    Resolve {
        /// Record as JSON (reads stdin when omitted)
        record: Option<String>,
    },

    /// Show the canonical form of organization names
    Normalize {
        /// Names to normalize
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Print the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = trustroute::config::load(cli.config.as_deref())?;

    // Initialize logging; RUST_LOG wins over flags, flags over config
    let level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => settings.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output = commands::Output {
        json: cli.json,
        color: !cli.no_color,
    };

    // Execute command
    match cli.command {
        Commands::Graph { user, category, format, output: path } => {
            commands::graph::run(&settings, cli.fixture.as_deref(), &user, category.as_deref(), &format, path)
        }
        Commands::Route { user, target, max_paths } => {
            commands::route::run(&settings, cli.fixture.as_deref(), &user, &target, max_paths, output)
        }
        Commands::Resolve { record } => commands::resolve::run(record, output),
        Commands::Normalize { names } => commands::normalize::run(&names, output),
        Commands::Config => commands::config::run(&settings, output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    }
}
