//! Research runs: the output schema and the runner that produces it.

mod runner;
mod schema;

pub use runner::{ResearchOutcome, ResearchReport, Researcher};
pub use schema::{ResearchParser, ResearchResult};
