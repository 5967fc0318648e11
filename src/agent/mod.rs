//! Agent system for research with tool calling.
//!
//! Provides an LLM agent that can look things up on Wikipedia and append
//! findings to the research output file before giving its final answer.

mod runner;
mod tools;

pub use runner::{Agent, AgentResponse, ChatRole, ChatTurn, ToolCallRecord, ITERATION_LIMIT_MESSAGE};
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext, SAVE_TOOL, WIKIPEDIA_TOOL};
