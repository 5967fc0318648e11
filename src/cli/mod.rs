//! CLI module for Delve.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Delve - a research agent for the command line
///
/// Looks topics up on Wikipedia with a hosted language model and writes
/// structured summaries.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a topic and print a structured summary
    Research {
        /// What to research (e.g., "The history of the printing press")
        query: String,

        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Ask the model to restructure its answer instead of parsing it directly
        #[arg(short, long)]
        restructure: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Also append the final result to the output file
        #[arg(short, long)]
        save: bool,
    },

    /// Start HTTP API server for the web front end
    Serve {
        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check credentials and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_research_flags() {
        let cli = Cli::parse_from(["delve", "-vv", "research", "printing press", "--restructure", "--save"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Research {
                query,
                restructure,
                save,
                json,
                model,
            } => {
                assert_eq!(query, "printing press");
                assert!(restructure);
                assert!(save);
                assert!(!json);
                assert!(model.is_none());
            }
            _ => panic!("Expected research command"),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["delve", "serve", "--port", "9000"]);
        assert!(matches!(cli.command, Commands::Serve { host: None, port: Some(9000) }));
    }
}
