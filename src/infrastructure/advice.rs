//! Medical triage advice from the xAI chat-completions endpoint.

use crate::domain::{EncodedImage, ProviderError};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the volunteer submitted for one advice request.
#[derive(Debug, Clone, Copy)]
pub struct AdviceRequest<'a> {
    pub description: &'a str,
    pub image: Option<&'a EncodedImage>,
}

/// Source of triage advice.
///
/// Each call is exactly one attempt; there is no retry.
pub trait AdviceProvider {
    fn suggest(&self, request: &AdviceRequest<'_>) -> Result<String, ProviderError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

fn triage_prompt(description: &str) -> String {
    format!(
        "You are a first-aid medical expert. Based on the following casualty description:\n{}\n\
         Analyse the situation and give concrete medical advice. If an image is attached, \
         take its content into account.",
        description
    )
}

fn build_payload<'a>(model: &'a str, request: &AdviceRequest<'_>) -> ChatRequest<'a> {
    let mut content = vec![ContentPart::Text {
        text: triage_prompt(request.description),
    }];

    if let Some(image) = request.image {
        content.push(ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:image/png;base64,{}", image.base64_png),
            },
        });
    }

    ChatRequest {
        model,
        messages: vec![ChatMessage { role: "user", content }],
    }
}

fn parse_reply(body: &str) -> Result<String, ProviderError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::MalformedResponse("response contained no choices".to_string()))
}

/// Blocking client for `{base_url}/chat/completions`.
pub struct XaiAdviceClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl XaiAdviceClient {
    /// Builds the client. With no `timeout` the request may wait indefinitely.
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl AdviceProvider for XaiAdviceClient {
    fn suggest(&self, request: &AdviceRequest<'_>) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingCredential)?;
        let payload = build_payload(&self.model, request);

        info!(
            model = %self.model,
            description_len = request.description.len(),
            with_image = request.image.is_some(),
            "requesting triage advice"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "advice service returned an error status");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let advice = parse_reply(&body)?;
        debug!(advice_len = advice.len(), "received triage advice");
        Ok(advice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_image() -> EncodedImage {
        EncodedImage {
            file_name: "wound.png".to_string(),
            width: 2,
            height: 2,
            base64_png: "iVBORw0KGgo=".to_string(),
        }
    }

    #[test]
    fn test_payload_text_only() {
        let request = AdviceRequest { description: "deep cut on left arm", image: None };
        let value = serde_json::to_value(build_payload("grok-3", &request)).unwrap();

        assert_eq!(value["model"], "grok-3");
        assert_eq!(value["messages"][0]["role"], "user");
        let content = value["messages"][0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["type"], "text");
        assert!(content[0]["text"].as_str().unwrap().contains("deep cut on left arm"));
    }

    #[test]
    fn test_payload_with_image() {
        let image = sample_image();
        let request = AdviceRequest { description: "", image: Some(&image) };
        let value = serde_json::to_value(build_payload("grok-3", &request)).unwrap();

        let content = value["messages"][0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(
            content[1],
            json!({
                "type": "image_url",
                "image_url": { "url": "data:image/png;base64,iVBORw0KGgo=" }
            })
        );
    }

    #[test]
    fn test_parse_reply_takes_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Apply firm pressure."}},
                       {"message":{"role":"assistant","content":"ignored"}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "Apply firm pressure.");
    }

    #[test]
    fn test_parse_reply_rejects_malformed_bodies() {
        assert!(matches!(parse_reply("not json"), Err(ProviderError::MalformedResponse(_))));
        assert!(matches!(
            parse_reply(r#"{"choices":[]}"#),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_missing_credential_fails_before_any_request() {
        let client = XaiAdviceClient::new(None, "http://127.0.0.1:9", "grok-3", None).unwrap();
        assert!(!client.has_credential());

        let request = AdviceRequest { description: "burn", image: None };
        assert_eq!(client.suggest(&request).unwrap_err(), ProviderError::MissingCredential);
    }

    #[test]
    fn test_blank_credential_counts_as_missing() {
        let client = XaiAdviceClient::new(Some("  ".to_string()), "http://127.0.0.1:9", "grok-3", None).unwrap();
        assert!(!client.has_credential());
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = XaiAdviceClient::new(None, "https://api.x.ai/v1/", "grok-3", None).unwrap();
        assert_eq!(client.endpoint(), "https://api.x.ai/v1/chat/completions");
    }
}
