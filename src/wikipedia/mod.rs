//! Encyclopedia lookups for the research agent.

mod client;

pub use client::{format_pages, truncate_chars, WikipediaClient, NO_RESULTS};

use crate::error::Result;
use async_trait::async_trait;

/// A source the agent can query for background text.
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Look up a query and return text ready to hand to the model.
    async fn lookup(&self, query: &str) -> Result<String>;
}
