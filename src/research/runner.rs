//! Research runner: one agent run plus output coercion.

use super::schema::{ResearchParser, ResearchResult};
use crate::agent::{Agent, ChatTurn, ToolCallRecord, ToolContext};
use crate::config::{CoercionStrategy, LlmSettings, Prompts, Settings};
use crate::error::{DelveError, Result, SchemaError};
use crate::openai::create_client;
use crate::wikipedia::{Encyclopedia, WikipediaClient};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
};
use async_openai::Client;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Final answer of a research run.
#[derive(Debug)]
pub enum ResearchOutcome {
    /// The answer matched the schema.
    Structured(ResearchResult),
    /// The answer did not match the schema; the raw text is kept.
    Raw { output: String, error: SchemaError },
}

impl ResearchOutcome {
    /// The structured result, if parsing succeeded.
    pub fn structured(&self) -> Option<&ResearchResult> {
        match self {
            ResearchOutcome::Structured(result) => Some(result),
            ResearchOutcome::Raw { .. } => None,
        }
    }
}

/// Serializes as the result object, or as the raw text string after a fallback.
impl Serialize for ResearchOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ResearchOutcome::Structured(result) => result.serialize(serializer),
            ResearchOutcome::Raw { output, .. } => serializer.serialize_str(output),
        }
    }
}

/// Outcome of a research run together with what the agent did.
#[derive(Debug)]
pub struct ResearchReport {
    pub outcome: ResearchOutcome,
    pub tool_calls: Vec<ToolCallRecord>,
    pub iterations: usize,
}

/// Runs the research agent and coerces its answer into a [`ResearchResult`].
pub struct Researcher {
    client: Client<OpenAIConfig>,
    model: String,
    max_iterations: usize,
    temperature: Option<f32>,
    strategy: CoercionStrategy,
    prompts: Prompts,
    parser: ResearchParser,
    encyclopedia: Arc<dyn Encyclopedia>,
    output_file: PathBuf,
}

impl Researcher {
    /// Create a researcher from explicit parts.
    pub fn new(
        client: Client<OpenAIConfig>,
        llm: &LlmSettings,
        encyclopedia: Arc<dyn Encyclopedia>,
        output_file: PathBuf,
    ) -> Self {
        Self {
            client,
            model: llm.model.clone(),
            max_iterations: llm.max_iterations,
            temperature: llm.temperature,
            strategy: llm.coercion,
            prompts: Prompts::default(),
            parser: ResearchParser::new(),
            encyclopedia,
            output_file,
        }
    }

    /// Build a researcher with the Wikipedia client and prompts the settings describe.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = create_client(&settings.llm)?;
        let encyclopedia = Arc::new(WikipediaClient::new(&settings.wikipedia)?);
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self::new(client, &settings.llm, encyclopedia, settings.output_file()).with_prompts(prompts))
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Override the model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Override the coercion strategy.
    pub fn with_strategy(mut self, strategy: CoercionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The model requests are sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The system prompt with the schema's format instructions filled in.
    pub fn system_prompt(&self) -> String {
        let mut vars = HashMap::new();
        vars.insert("format_instructions".to_string(), self.parser.format_instructions());
        self.prompts.render_with_custom(&self.prompts.research.system, &vars)
    }

    fn agent(&self) -> Agent {
        let tools = ToolContext::new(self.encyclopedia.clone(), self.output_file.clone());
        Agent::new(self.client.clone(), tools, &self.model)
            .with_system_prompt(&self.system_prompt())
            .with_max_iterations(self.max_iterations)
            .with_temperature(self.temperature)
    }

    /// Run once with the configured coercion strategy.
    pub async fn run(&self, query: &str, history: &[ChatTurn]) -> Result<ResearchReport> {
        match self.strategy {
            CoercionStrategy::Parse => self.run_parsed(query, history).await,
            CoercionStrategy::Restructure => self.run_restructured(query, history).await,
        }
    }

    /// Run the agent and parse its answer, keeping the raw text if it does not fit the schema.
    ///
    /// Only schema failures fall back; every other error is returned.
    #[instrument(skip(self, history), fields(query = %query))]
    pub async fn run_parsed(&self, query: &str, history: &[ChatTurn]) -> Result<ResearchReport> {
        let response = self.agent().run(query, history).await?;
        info!(
            "Agent finished in {} iteration(s) with {} tool call(s)",
            response.iterations,
            response.tool_calls.len()
        );

        let outcome = match self.parser.parse(&response.content) {
            Ok(result) => ResearchOutcome::Structured(result),
            Err(error) => {
                warn!("Error parsing response: {}. Raw response: {}", error, response.content);
                ResearchOutcome::Raw {
                    output: response.content,
                    error,
                }
            }
        };

        Ok(ResearchReport {
            outcome,
            tool_calls: response.tool_calls,
            iterations: response.iterations,
        })
    }

    /// Run the agent, then ask the model to restructure its answer into the schema.
    ///
    /// There is no fallback: a reply that still does not fit is an error.
    #[instrument(skip(self, history), fields(query = %query))]
    pub async fn run_restructured(&self, query: &str, history: &[ChatTurn]) -> Result<ResearchReport> {
        let response = self.agent().run(query, history).await?;
        let result = self.restructure(&response.content).await?;

        Ok(ResearchReport {
            outcome: ResearchOutcome::Structured(result),
            tool_calls: response.tool_calls,
            iterations: response.iterations + 1,
        })
    }

    /// Send a finished answer back to the model with a JSON schema response format.
    async fn restructure(&self, output: &str) -> Result<ResearchResult> {
        let mut vars = HashMap::new();
        vars.insert("output".to_string(), output.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.research.restructure, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| DelveError::Agent(e.to_string()))?
            .into()];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: Some("Structured research result".to_string()),
                    name: "research_result".to_string(),
                    schema: Some(ResearchResult::json_schema()),
                    strict: None,
                },
            });
        if let Some(temperature) = self.temperature {
            builder.temperature(temperature);
        }
        let request = builder.build().map_err(|e| DelveError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| DelveError::OpenAI(format!("Restructure API error: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| DelveError::Agent("Empty response from model".to_string()))?;

        Ok(self.parser.parse(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ITERATION_LIMIT_MESSAGE;
    use crate::openai::create_client_with_key;
    use crate::testing::{completion, fake_llm_settings, spawn_fake_model, tool_call, StubEncyclopedia};
    use serde_json::{json, Value};

    const ANSWER: &str = r#"{"topic": "Rust", "summary": "A systems programming language.", "sources": ["Wikipedia"], "tools_used": ["wikipedia"]}"#;

    fn researcher(api_base: String, output_file: PathBuf) -> Researcher {
        let llm = fake_llm_settings(api_base);
        let client = create_client_with_key(&llm, "test-key").unwrap();
        Researcher::new(client, &llm, Arc::new(StubEncyclopedia), output_file)
    }

    fn is_restructure_request(body: &Value) -> bool {
        body["response_format"]["type"] == "json_schema"
    }

    #[test]
    fn test_outcome_serialization() {
        let structured = ResearchOutcome::Structured(ResearchParser::new().parse(ANSWER).unwrap());
        assert_eq!(serde_json::to_value(&structured).unwrap()["topic"], "Rust");

        let raw = ResearchOutcome::Raw {
            output: "plain".to_string(),
            error: SchemaError::NoJson,
        };
        assert_eq!(serde_json::to_value(&raw).unwrap(), json!("plain"));
    }

    #[test]
    fn test_system_prompt_includes_schema() {
        let dir = tempfile::tempdir().unwrap();
        let llm = fake_llm_settings("http://127.0.0.1:9".to_string());
        let client = create_client_with_key(&llm, "test-key").unwrap();
        let r = Researcher::new(client, &llm, Arc::new(StubEncyclopedia), dir.path().join("out.txt"));

        let prompt = r.system_prompt();
        assert!(prompt.starts_with("You are a research assistant"));
        assert!(prompt.contains("\"tools_used\""));
        assert!(!prompt.contains("{{format_instructions}}"));
    }

    #[tokio::test]
    async fn test_parsed_structured_answer() {
        let api_base = spawn_fake_model(|body| {
            let called_tool = body["messages"]
                .as_array()
                .map(|m| m.iter().any(|msg| msg["role"] == "tool"))
                .unwrap_or(false);
            if called_tool {
                completion(json!({ "role": "assistant", "content": format!("```json\n{}\n```", ANSWER) }))
            } else {
                completion(json!({
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [tool_call("call_1", "wikipedia", json!({ "query": "Rust" }))]
                }))
            }
        })
        .await;
        let dir = tempfile::tempdir().unwrap();

        let report = researcher(api_base, dir.path().join("out.txt"))
            .run("What is Rust?", &[])
            .await
            .unwrap();

        let result = report.outcome.structured().expect("structured result");
        assert_eq!(result.topic, "Rust");
        assert_eq!(report.tool_calls.len(), 1);
        assert_eq!(report.iterations, 2);
    }

    #[tokio::test]
    async fn test_parsed_falls_back_to_raw_text() {
        let api_base = spawn_fake_model(|_| {
            completion(json!({ "role": "assistant", "content": "Rust is a language. Sources: none." }))
        })
        .await;
        let dir = tempfile::tempdir().unwrap();

        let report = researcher(api_base, dir.path().join("out.txt"))
            .run("What is Rust?", &[])
            .await
            .unwrap();

        match report.outcome {
            ResearchOutcome::Raw { output, error } => {
                assert_eq!(output, "Rust is a language. Sources: none.");
                assert!(matches!(error, SchemaError::NoJson));
            }
            other => panic!("Expected raw fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_parsed_keeps_missing_field_as_raw() {
        let api_base = spawn_fake_model(|_| {
            completion(json!({ "role": "assistant", "content": r#"{"topic": "Rust", "summary": "x"}"# }))
        })
        .await;
        let dir = tempfile::tempdir().unwrap();

        let report = researcher(api_base, dir.path().join("out.txt"))
            .run("What is Rust?", &[])
            .await
            .unwrap();
        assert!(matches!(
            report.outcome,
            ResearchOutcome::Raw {
                error: SchemaError::Invalid(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_parsed_iteration_limit_is_raw() {
        let api_base = spawn_fake_model(|_| {
            completion(json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [tool_call("call_1", "wikipedia", json!({ "query": "again" }))]
            }))
        })
        .await;
        let dir = tempfile::tempdir().unwrap();
        let mut llm = fake_llm_settings(api_base);
        llm.max_iterations = 3;
        let client = create_client_with_key(&llm, "test-key").unwrap();

        let report = Researcher::new(client, &llm, Arc::new(StubEncyclopedia), dir.path().join("out.txt"))
            .run("What is Rust?", &[])
            .await
            .unwrap();

        assert_eq!(report.iterations, 3);
        match report.outcome {
            ResearchOutcome::Raw { output, error } => {
                assert_eq!(output, ITERATION_LIMIT_MESSAGE);
                assert!(matches!(error, SchemaError::NoJson));
            }
            other => panic!("Expected raw fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_parsed_propagates_other_failures() {
        let api_base = spawn_fake_model(|_| {
            json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "created": 1_700_000_000u32,
                "model": "fake-model",
                "choices": []
            })
        })
        .await;
        let dir = tempfile::tempdir().unwrap();

        let result = researcher(api_base, dir.path().join("out.txt"))
            .run("What is Rust?", &[])
            .await;
        assert!(matches!(result, Err(DelveError::Agent(_))));
    }

    #[tokio::test]
    async fn test_restructured_answer() {
        let api_base = spawn_fake_model(|body| {
            if is_restructure_request(&body) {
                let prompt = body["messages"][0]["content"].as_str().unwrap_or_default().to_string();
                assert!(prompt.contains("Rust is memory safe."));
                completion(json!({ "role": "assistant", "content": ANSWER }))
            } else {
                completion(json!({ "role": "assistant", "content": "Rust is memory safe." }))
            }
        })
        .await;
        let dir = tempfile::tempdir().unwrap();

        let report = researcher(api_base, dir.path().join("out.txt"))
            .with_strategy(CoercionStrategy::Restructure)
            .run("What is Rust?", &[])
            .await
            .unwrap();

        assert_eq!(report.outcome.structured().unwrap().summary, "A systems programming language.");
        assert_eq!(report.iterations, 2);
    }

    #[tokio::test]
    async fn test_restructured_has_no_fallback() {
        let api_base = spawn_fake_model(|_| {
            completion(json!({ "role": "assistant", "content": "still prose" }))
        })
        .await;
        let dir = tempfile::tempdir().unwrap();

        let result = researcher(api_base, dir.path().join("out.txt"))
            .with_strategy(CoercionStrategy::Restructure)
            .run("What is Rust?", &[])
            .await;
        assert!(matches!(result, Err(DelveError::Schema(SchemaError::NoJson))));
    }
}
