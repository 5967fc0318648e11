//! Agent runner with tool calling loop.

use super::tools::{parse_tool_call, tool_definitions, ToolContext};
use crate::error::{DelveError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Final answer reported when the model is still calling tools at the iteration limit.
pub const ITERATION_LIMIT_MESSAGE: &str = "Agent stopped due to iteration limit or time limit.";

/// Agent that answers a query by calling tools until the model is done.
pub struct Agent {
    client: Client<OpenAIConfig>,
    model: String,
    tools: ToolContext,
    max_iterations: usize,
    temperature: Option<f32>,
    system_prompt: String,
}

impl Agent {
    /// Create a new agent with the given client, tool context and model.
    pub fn new(client: Client<OpenAIConfig>, tools: ToolContext, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            tools,
            max_iterations: 15,
            temperature: None,
            system_prompt: String::new(),
        }
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Run the agent once against a query, after any prior conversation turns.
    pub async fn run(&self, query: &str, history: &[ChatTurn]) -> Result<AgentResponse> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 2);

        if !self.system_prompt.is_empty() {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(self.system_prompt.clone())
                    .build()
                    .map_err(|e| DelveError::Agent(e.to_string()))?
                    .into(),
            );
        }

        for turn in history {
            messages.push(turn.to_message()?);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(query.to_string())
                .build()
                .map_err(|e| DelveError::Agent(e.to_string()))?
                .into(),
        );

        let mut tool_calls_made = Vec::new();

        for iteration in 1..=self.max_iterations {
            debug!("Agent iteration {}", iteration);

            let mut builder = CreateChatCompletionRequestArgs::default();
            builder
                .model(&self.model)
                .messages(messages.clone())
                .tools(tool_definitions());
            if let Some(temperature) = self.temperature {
                builder.temperature(temperature);
            }
            let request = builder.build().map_err(|e| DelveError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| DelveError::OpenAI(format!("Agent API error: {}", e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| DelveError::Agent("No response from model".to_string()))?;

            let tool_calls = match choice.message.tool_calls {
                Some(ref calls) if !calls.is_empty() => calls,
                _ => {
                    return Ok(AgentResponse {
                        content: choice.message.content.clone().unwrap_or_default(),
                        tool_calls: tool_calls_made,
                        iterations: iteration,
                    });
                }
            };

            let mut assistant = ChatCompletionRequestAssistantMessageArgs::default();
            assistant.tool_calls(tool_calls.clone());
            if let Some(content) = choice.message.content.as_ref().filter(|c| !c.is_empty()) {
                assistant.content(content.clone());
            }
            let assistant_msg = assistant.build().map_err(|e| DelveError::Agent(e.to_string()))?;
            messages.push(assistant_msg.into());

            for tool_call in tool_calls {
                let record = self.execute_tool_call(tool_call).await?;

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(record.result.clone())
                    .build()
                    .map_err(|e| DelveError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());

                tool_calls_made.push(record);
            }
        }

        warn!("Agent hit the limit of {} iterations", self.max_iterations);
        Ok(AgentResponse {
            content: ITERATION_LIMIT_MESSAGE.to_string(),
            tool_calls: tool_calls_made,
            iterations: self.max_iterations,
        })
    }

    /// Execute a single tool call and return a record of it.
    ///
    /// Unknown tools and malformed arguments are reported back to the model;
    /// failures of the tool itself are returned to the caller.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> Result<ToolCallRecord> {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        let result = match parse_tool_call(name, arguments) {
            Ok(tool) => self.tools.execute(&tool).await?,
            Err(e) => format!("Failed to parse tool call: {}", e),
        };

        debug!("Tool {} returned {} chars", name, result.len());

        Ok(ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        })
    }
}

/// Speaker of a prior conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A prior conversation turn placed before the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    fn to_message(&self) -> Result<ChatCompletionRequestMessage> {
        let message = match self.role {
            ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(self.content.clone())
                .build()
                .map_err(|e| DelveError::Agent(e.to_string()))?
                .into(),
            ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(self.content.clone())
                .build()
                .map_err(|e| DelveError::Agent(e.to_string()))?
                .into(),
        };
        Ok(message)
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
