//! Configuration module for Delve.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, ResearchPrompts};
pub use settings::{
    CoercionStrategy, GeneralSettings, LlmSettings, PromptSettings, ServerSettings, Settings,
    WikipediaSettings,
};
