//! Autoblog CLI entry point.
//!
//! Each command is a thin sequential script over the core library. Errors
//! are caught at the command boundary, printed with a contextual prefix,
//! and turned into exit code 1.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "autoblog",
    version,
    about = "Author and publish markdown posts into a replicated document store"
)]
struct Cli {
    /// Use an alternate config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a markdown post (YAML front matter + body)
    Upload {
        /// Path to the markdown file
        file: PathBuf,
    },
    /// List every post in the index
    List,
    /// Delete a post by its slug
    Delete {
        /// Slug of the post to remove
        slug: String,
    },
    /// Sync the index and all posts with the configured sync server
    Sync,
    /// Inspect or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show every configuration key and its effective value
    List,
    /// Print the effective value of one key
    Get { key: String },
    /// Set a key in the config file
    Set { key: String, value: String },
    /// Rewrite the config file with defaults
    Reset,
    /// Print the config file location
    Path,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Upload { file } => commands::upload(cli.config.as_deref(), &file)
            .await
            .map_err(|e| format!("Upload failed: {e}")),
        Command::List => commands::list(cli.config.as_deref())
            .await
            .map_err(|e| format!("List failed: {e}")),
        Command::Delete { slug } => commands::delete(cli.config.as_deref(), &slug)
            .await
            .map_err(|e| format!("Delete failed: {e}")),
        Command::Sync => commands::sync(cli.config.as_deref())
            .await
            .map_err(|e| format!("Sync failed: {e}")),
        Command::Config { action } => commands::config(cli.config.as_deref(), action)
            .await
            .map_err(|e| format!("Config error: {e}")),
    };

    if let Err(message) = result {
        eprintln!("{message}");
        std::process::exit(1);
    }
}
