//! Tool definitions and implementations for the research agent.

use crate::error::{DelveError, Result};
use crate::research_log::save_to_text;
use crate::wikipedia::Encyclopedia;
use std::path::PathBuf;
use std::sync::Arc;

/// Name of the Wikipedia lookup tool.
pub const WIKIPEDIA_TOOL: &str = "wikipedia";

/// Name of the save-to-file tool.
pub const SAVE_TOOL: &str = "save_text_to_file";

/// Available tools for the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Look something up on Wikipedia.
    Wikipedia { query: String },

    /// Append research text to the output file.
    SaveTextToFile { data: String },
}

/// Tool execution context.
pub struct ToolContext {
    pub encyclopedia: Arc<dyn Encyclopedia>,
    /// The only file the save tool writes to.
    pub output_file: PathBuf,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(encyclopedia: Arc<dyn Encyclopedia>, output_file: PathBuf) -> Self {
        Self {
            encyclopedia,
            output_file,
        }
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        match tool {
            ToolCall::Wikipedia { query } => self.encyclopedia.lookup(query).await,
            ToolCall::SaveTextToFile { data } => save_to_text(data, &self.output_file),
        }
    }
}

/// Get OpenAI function/tool definitions for the agent.
pub fn tool_definitions() -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    vec![
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: WIKIPEDIA_TOOL.to_string(),
                description: Some(
                    "A wrapper around Wikipedia. Useful for when you need to answer general \
                    questions about people, places, companies, facts, historical events, or \
                    other subjects. Input should be a search query."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Query to look up on Wikipedia"
                        }
                    },
                    "required": ["query"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: SAVE_TOOL.to_string(),
                description: Some("Saves structured research data to a text file.".to_string()),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "data": {
                            "type": "string",
                            "description": "The research text to save"
                        }
                    },
                    "required": ["data"]
                })),
                strict: None,
            },
        },
    ]
}

/// Parse a tool call from the chat completion response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| DelveError::Agent(format!("Invalid tool arguments: {}", e)))?;

    match name {
        WIKIPEDIA_TOOL => {
            let query = args["query"]
                .as_str()
                .ok_or_else(|| DelveError::Agent("Missing 'query' argument".to_string()))?
                .to_string();
            Ok(ToolCall::Wikipedia { query })
        }
        SAVE_TOOL => {
            let data = args["data"]
                .as_str()
                .ok_or_else(|| DelveError::Agent("Missing 'data' argument".to_string()))?
                .to_string();
            Ok(ToolCall::SaveTextToFile { data })
        }
        _ => Err(DelveError::Agent(format!("Unknown tool: {}", name))),
    }
}
