//! Research result schema and output parsing.

use crate::error::SchemaError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured result of a research run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    /// What was researched.
    pub topic: String,
    /// Written summary of the findings.
    pub summary: String,
    /// Sources consulted, in the order the model listed them.
    pub sources: Vec<String>,
    /// Tools the agent used.
    pub tools_used: Vec<String>,
}

impl ResearchResult {
    /// JSON schema describing the result, used in prompts and response formats.
    pub fn json_schema() -> Value {
        serde_json::json!({
            "title": "ResearchResult",
            "type": "object",
            "properties": {
                "topic": {
                    "title": "Topic",
                    "type": "string"
                },
                "summary": {
                    "title": "Summary",
                    "type": "string"
                },
                "sources": {
                    "title": "Sources",
                    "type": "array",
                    "items": { "type": "string" }
                },
                "tools_used": {
                    "title": "Tools Used",
                    "type": "array",
                    "items": { "type": "string" }
                }
            },
            "required": ["topic", "summary", "sources", "tools_used"]
        })
    }

    /// Render the result as plain text for the research log.
    pub fn to_log_text(&self) -> String {
        let mut text = format!("Topic: {}\n\n{}", self.topic, self.summary);
        if !self.sources.is_empty() {
            text.push_str("\n\nSources:\n");
            text.push_str(
                &self
                    .sources
                    .iter()
                    .map(|s| format!("- {}", s))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }
        text
    }
}

/// Parses model output into a [`ResearchResult`].
pub struct ResearchParser {
    fence_regex: Regex,
}

impl ResearchParser {
    pub fn new() -> Self {
        // ```json ... ``` or a bare ``` fence
        let fence_regex = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("Invalid regex");
        Self { fence_regex }
    }

    /// Instructions appended to the system prompt telling the model what to emit.
    pub fn format_instructions(&self) -> String {
        let schema = serde_json::to_string(&ResearchResult::json_schema()).unwrap_or_default();
        format!(
            "The output should be a JSON object that conforms to the JSON schema below.\n\n\
             For the schema {{\"properties\": {{\"foo\": {{\"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}} \
             the object {{\"foo\": [\"bar\", \"baz\"]}} is well-formatted. \
             The object {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} is not.\n\n\
             Here is the output schema:\n```\n{}\n```",
            schema
        )
    }

    /// Locate the JSON object inside free-form model text.
    pub fn extract_json<'a>(&self, text: &'a str) -> Result<&'a str, SchemaError> {
        if let Some(body) = self
            .fence_regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|body| !body.is_empty())
        {
            return Ok(body);
        }

        let start = text.find('{').ok_or(SchemaError::NoJson)?;
        let end = text.rfind('}').ok_or(SchemaError::NoJson)?;
        if end < start {
            return Err(SchemaError::NoJson);
        }
        Ok(&text[start..=end])
    }

    /// Parse model output against the schema.
    pub fn parse(&self, text: &str) -> Result<ResearchResult, SchemaError> {
        let json = self.extract_json(text)?;
        serde_json::from_str(json).map_err(|e| match e.classify() {
            serde_json::error::Category::Data => SchemaError::Invalid(e.to_string()),
            _ => SchemaError::InvalidJson(e.to_string()),
        })
    }
}

impl Default for ResearchParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"topic": "Rust", "summary": "A systems language.", "sources": ["https://en.wikipedia.org/wiki/Rust_(programming_language)"], "tools_used": ["wikipedia"]}"#;

    #[test]
    fn test_parse_bare_json() {
        let result = ResearchParser::new().parse(VALID).unwrap();
        assert_eq!(result.topic, "Rust");
        assert_eq!(result.tools_used, vec!["wikipedia".to_string()]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = format!("Here you go:\n```json\n{}\n```\nAnything else?", VALID);
        let result = ResearchParser::new().parse(&text).unwrap();
        assert_eq!(result.summary, "A systems language.");
    }

    #[test]
    fn test_parse_json_surrounded_by_prose() {
        let text = format!("Sure! {} Hope that helps.", VALID);
        assert!(ResearchParser::new().parse(&text).is_ok());
    }

    #[test]
    fn test_missing_field_rejected() {
        let text = r#"{"topic": "Rust", "summary": "A systems language.", "sources": []}"#;
        match ResearchParser::new().parse(text) {
            Err(SchemaError::Invalid(msg)) => assert!(msg.contains("tools_used")),
            other => panic!("Expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_type_rejected() {
        let text = r#"{"topic": "Rust", "summary": "x", "sources": "one", "tools_used": []}"#;
        assert!(matches!(ResearchParser::new().parse(text), Err(SchemaError::Invalid(_))));
    }

    #[test]
    fn test_malformed_json() {
        let text = r#"{"topic": "Rust", "summary": }"#;
        assert!(matches!(ResearchParser::new().parse(text), Err(SchemaError::InvalidJson(_))));
    }

    #[test]
    fn test_no_json() {
        assert!(matches!(
            ResearchParser::new().parse("I could not find anything."),
            Err(SchemaError::NoJson)
        ));
    }

    #[test]
    fn test_format_instructions_embed_schema() {
        let instructions = ResearchParser::new().format_instructions();
        assert!(instructions.contains("\"tools_used\""));
        assert!(instructions.contains("\"required\""));
    }

    #[test]
    fn test_log_text() {
        let result = ResearchParser::new().parse(VALID).unwrap();
        let text = result.to_log_text();
        assert!(text.starts_with("Topic: Rust\n\nA systems language."));
        assert!(text.contains("- https://en.wikipedia.org/wiki/Rust_(programming_language)"));
    }
}
