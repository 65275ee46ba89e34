//! Binary entrypoint for the console settings panel.
use std::{
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use config::resolve_config_path;
use tokio::runtime::Builder;
use tracing::error;

/// Interactive session over a live panel.
mod app;
/// Line command parsing.
mod console;
mod render;

#[derive(Parser, Debug)]
#[command(name = "panel", about = "A command-backed settings panel", version)]
/// Command-line interface for the `panel` binary.
struct Cli {
    /// Optional subcommand.
    #[command(subcommand)]
    command: Option<Command>,

    /// Logging controls
    #[command(flatten)]
    log: logging::LogArgs,

    /// Optional path to the panel document
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Command {
    /// Load and validate the panel document then exit.
    Check {
        /// Path to the document to check (defaults to the XDG location)
        path: Option<PathBuf>,

        /// Print an outline of the parsed document
        #[arg(long)]
        dump: bool,
    },
    /// Search every page for items matching a query.
    Search {
        /// Case-insensitive text matched against titles and descriptions
        query: String,
    },
}

/// Resolve the document path or exit with a pretty error.
fn resolve_or_exit(explicit: Option<&Path>) -> PathBuf {
    match resolve_config_path(explicit) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e.pretty());
            process::exit(1);
        }
    }
}

/// Load the document or exit with a pretty error.
fn load_or_exit(path: &Path) -> config::Document {
    match config::load_from_path(path) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{}", e.pretty());
            process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    match &cli.command {
        Some(Command::Check { path, dump }) => {
            let explicit = path.as_deref().or(cli.config.as_deref());
            let doc = load_or_exit(&resolve_or_exit(explicit));
            if *dump {
                print!("{}", render::outline(&doc));
            } else {
                println!("OK");
            }
            return;
        }
        Some(Command::Search { query }) => {
            let doc = load_or_exit(&resolve_or_exit(cli.config.as_deref()));
            let hits = doc.search(query);
            if hits.is_empty() {
                println!("no results for {query:?}");
            }
            for hit in hits {
                let title = hit.item.properties().title.as_deref().unwrap_or("");
                println!("{} › {} ({})", hit.context, title, hit.item.kind().as_str());
            }
            return;
        }
        None => {}
    }

    let path = resolve_or_exit(cli.config.as_deref());
    let runtime = match Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to start runtime: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(app::run(&path)) {
        eprintln!("{e}");
        process::exit(1);
    }
}
