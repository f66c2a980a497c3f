use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::{configuration::ModelSettings, domain::townhouse::TownhouseRecord};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("model request failed: {0}")]
    Model(#[from] OpenAIError),
    #[error("model returned no content")]
    EmptyResponse,
    #[error("model output is not a JSON object: {source}")]
    Parse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// `None` when the model answered with an empty object.
    async fn extract_fields(&self, text: &str)
        -> Result<Option<TownhouseRecord>, ExtractError>;
}

pub struct OpenaiClient {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl OpenaiClient {
    pub fn new(api_key: String, settings: &ModelSettings) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(settings.api_base.trim_end_matches('/'));
        OpenaiClient {
            client: Client::with_config(config),
            model: settings.name.clone(),
            max_tokens: settings.max_tokens,
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, ExtractError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into()])
            .max_tokens(self.max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await?;
        log::debug!("Response: {:?}", response);

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ExtractError::EmptyResponse)
    }
}

#[async_trait]
impl FieldExtractor for OpenaiClient {
    async fn extract_fields(
        &self,
        text: &str,
    ) -> Result<Option<TownhouseRecord>, ExtractError> {
        let prompt = build_extraction_prompt(text);
        let content = self.complete(&prompt).await?;
        parse_model_output(&content)
    }
}

pub fn build_extraction_prompt(text: &str) -> String {
    format!(
        r#"
You are an assistant extracting townhouse complex data from real estate-related text.

Given this page content, extract:
- Complex name
- Strata corporation number
- Number of units or suites
- Number of levels (floors)

Text:
"""
{}
"""

Return a JSON object with the keys "complex_name", "strata_number", "unit_count" and "level_count". Use null for any unknown field.
"#,
        text
    )
}

/// Reads the model's answer as a record. Answers wrapped in a Markdown
/// code fence or padded with prose around the object are accepted. An
/// object without any keys is no answer at all and gives `None`; an object
/// whose keys are all null still gives a record.
pub fn parse_model_output(content: &str) -> Result<Option<TownhouseRecord>, ExtractError> {
    let json_text = strip_code_fence(content.trim());
    let json_text = match (json_text.find('{'), json_text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &json_text[start..=end],
        _ => json_text,
    };

    let parse_error = |source: serde_json::Error| ExtractError::Parse {
        raw: content.to_string(),
        source,
    };

    let fields = match serde_json::from_str::<Value>(json_text).map_err(parse_error)? {
        Value::Object(fields) => fields,
        other => {
            return Err(parse_error(serde::de::Error::custom(format!(
                "expected an object, got {}",
                other
            ))))
        }
    };
    if fields.is_empty() {
        return Ok(None);
    }

    serde_json::from_value(Value::Object(fields))
        .map(Some)
        .map_err(parse_error)
}

fn strip_code_fence(content: &str) -> &str {
    match content.strip_prefix("```") {
        Some(rest) => {
            // Drop the info string (```json) along with the fence
            let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
            body.trim_end().trim_end_matches("```").trim()
        }
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use httptest::{
        matchers::{all_of, request},
        responders::{json_encoded, status_code},
        Expectation, Server,
    };
    use serde_json::json;

    use super::{build_extraction_prompt, parse_model_output, ExtractError, FieldExtractor, OpenaiClient};
    use crate::configuration::ModelSettings;

    #[test]
    fn prompt_embeds_text_verbatim() {
        let prompt = build_extraction_prompt("Harbour Mews, strata VR 1234");
        assert!(prompt.contains("\"\"\"\nHarbour Mews, strata VR 1234\n\"\"\""));
        assert!(prompt.contains("Strata corporation number"));
        assert!(prompt.contains("Use null for any unknown field."));
    }

    #[test]
    fn parses_plain_json() {
        let record = parse_model_output(
            r#"{"complex_name": "Harbour Mews", "strata_number": "VR 1234", "unit_count": 42, "level_count": 3}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(record.complex_name.as_deref(), Some("Harbour Mews"));
        assert_eq!(record.unit_count.as_deref(), Some("42"));
        assert_eq!(record.level_count.as_deref(), Some("3"));
    }

    #[test]
    fn parses_fenced_json() {
        let content = "```json\n{\"complex_name\": \"Cedar Row\", \"strata_number\": null, \"unit_count\": null, \"level_count\": null}\n```";
        let record = parse_model_output(content).unwrap().unwrap();
        assert_eq!(record.complex_name.as_deref(), Some("Cedar Row"));
        assert_eq!(record.strata_number, None);
    }

    #[test]
    fn parses_object_surrounded_by_prose() {
        let content = "Here is the data:\n{\"complex_name\": \"Cedar Row\"}\nLet me know!";
        let record = parse_model_output(content).unwrap().unwrap();
        assert_eq!(record.complex_name.as_deref(), Some("Cedar Row"));
    }

    #[test]
    fn nothing_identifiable_yields_all_null_record() {
        let record = parse_model_output(
            r#"{"complex_name": null, "strata_number": null, "unit_count": null, "level_count": null}"#,
        )
        .unwrap()
        .unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn empty_object_is_no_record() {
        assert_eq!(parse_model_output("{}").unwrap(), None);
        assert_eq!(parse_model_output("```json\n{ }\n```").unwrap(), None);
    }

    #[test]
    fn rejects_non_json_and_non_objects() {
        let error = parse_model_output("I could not find anything.").unwrap_err();
        match error {
            ExtractError::Parse { raw, .. } => assert_eq!(raw, "I could not find anything."),
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(matches!(
            parse_model_output("[1, 2, 3, 4]"),
            Err(ExtractError::Parse { .. })
        ));
        assert!(matches!(
            parse_model_output("null"),
            Err(ExtractError::Parse { .. })
        ));
    }

    fn client_for(server: &Server) -> OpenaiClient {
        OpenaiClient::new(
            "test-key".to_string(),
            &ModelSettings {
                api_base: server.url_str("/v1beta/openai"),
                name: "gemini-2.0-flash".to_string(),
                max_tokens: 256,
            },
        )
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gemini-2.0-flash",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn extracts_fields_from_chat_completion() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v1beta/openai/chat/completions"),
            ])
            .respond_with(json_encoded(completion(
                "```json\n{\"complex_name\": \"Harbour Mews\", \"strata_number\": \"VR 1234\", \"unit_count\": \"42\", \"level_count\": null}\n```",
            ))),
        );

        let record = client_for(&server)
            .extract_fields("Harbour Mews strata VR 1234 has 42 units")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.complex_name.as_deref(), Some("Harbour Mews"));
        assert_eq!(record.strata_number.as_deref(), Some("VR 1234"));
        assert_eq!(record.unit_count.as_deref(), Some("42"));
        assert_eq!(record.level_count, None);
    }

    #[tokio::test]
    async fn api_errors_are_model_errors() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "POST",
                "/v1beta/openai/chat/completions",
            ))
            .respond_with(status_code(400).body(
                json!({
                    "error": {
                        "message": "API key not valid",
                        "type": "invalid_request_error",
                        "param": null,
                        "code": null
                    }
                })
                .to_string(),
            )),
        );

        let error = client_for(&server)
            .extract_fields("anything")
            .await
            .unwrap_err();
        assert!(matches!(error, ExtractError::Model(_)));
    }

    #[tokio::test]
    async fn blank_content_is_empty_response() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "POST",
                "/v1beta/openai/chat/completions",
            ))
            .respond_with(json_encoded(completion("   "))),
        );

        let error = client_for(&server)
            .extract_fields("anything")
            .await
            .unwrap_err();
        assert!(matches!(error, ExtractError::EmptyResponse));
    }
}
