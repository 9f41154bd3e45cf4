//! Trellis CLI - Command-line interface for Trellis
//!
//! Builds and inspects the template index, serves it to the admin UI,
//! and runs the autocomplete pipeline against a live server.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trellis_complete::DEFAULT_MAX_RESULTS;

mod commands;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(author = "Trellis Contributors")]
#[command(version)]
#[command(about = "Template path index and autocomplete for the Trellis admin", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config in the given project
    Init {
        /// Project directory (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Build the template index and print it
    Index {
        /// Config file
        #[arg(short, long, default_value = ".trellis/config.json")]
        config: PathBuf,

        /// Print the HTTP response body instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Filter the index the way the dropdown does
    Query {
        /// Text typed into the field
        text: String,

        /// Maximum results to return
        #[arg(short, long, default_value_t = DEFAULT_MAX_RESULTS)]
        limit: usize,

        /// Config file
        #[arg(short, long, default_value = ".trellis/config.json")]
        config: PathBuf,
    },

    /// Serve the template index over HTTP
    Serve {
        /// Config file
        #[arg(short, long, default_value = ".trellis/config.json")]
        config: PathBuf,

        /// Address to bind, overriding the config
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Fetch suggestions from a running server
    Complete {
        /// Text typed into the field
        text: String,

        /// Admin base URL, e.g. http://127.0.0.1:7440/admin
        #[arg(short, long)]
        url: String,

        /// Admin bearer token
        #[arg(short, long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Index { config, json } => commands::index(&config, json),
        Commands::Query {
            text,
            limit,
            config,
        } => commands::query(&config, &text, limit),
        Commands::Serve { config, bind } => commands::serve(&config, bind.as_deref()).await,
        Commands::Complete { text, url, token } => commands::complete(&url, token, &text).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
