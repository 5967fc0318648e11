//! Delve - a research agent for the command line
//!
//! Hands a query to a hosted language model together with two tools, a
//! Wikipedia lookup and an append-only output file, runs the tool-calling loop
//! once, and coerces the final answer into a [`research::ResearchResult`].
//!
//! # Architecture
//!
//! - `config` - Settings, credentials and prompt templates
//! - `wikipedia` - MediaWiki lookups with result and length limits
//! - `research_log` - The append-only research output file
//! - `agent` - Tool-calling loop and tool dispatch
//! - `research` - Output schema and the research runner
//! - `cli` - Command line and HTTP front ends
//!
//! # Example
//!
//! ```rust,no_run
//! use delve::config::Settings;
//! use delve::research::{ResearchOutcome, Researcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let researcher = Researcher::from_settings(&settings)?;
//!
//!     let report = researcher.run("The history of the printing press", &[]).await?;
//!     if let ResearchOutcome::Structured(result) = report.outcome {
//!         println!("{}: {}", result.topic, result.summary);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod research;
pub mod research_log;
pub mod wikipedia;

#[cfg(test)]
mod testing;

pub use error::{DelveError, Result, SchemaError};
