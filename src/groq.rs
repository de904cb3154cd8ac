//! AI chat completion over Groq's OpenAI-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::session::Identity;

/// Fixed reply when the provider cannot answer.
pub const UNAVAILABLE_REPLY: &str = "❌ AI service temporarily unavailable";

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, Error>;
}

/// System prompt naming the assistant and its creator.
pub fn system_prompt(identity: &Identity) -> String {
    format!(
        "You are {}, an advanced AI assistant created by {}. \
         You provide intelligent, helpful, and accurate responses to user questions.",
        identity.assistant_name, identity.creator_name
    )
}

pub struct Client {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl Client {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Completion for Client {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, Error> {
        let request = ApiRequest {
            model: &self.model,
            messages: vec![
                ApiMessage {
                    role: "system",
                    content: system_prompt,
                },
                ApiMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout
                } else {
                    Error::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        let text = extract_reply(api_response)?;
        info!("✅ AI response generated ({} chars)", text.chars().count());
        Ok(text)
    }
}

fn extract_reply(response: ApiResponse) -> Result<String, Error> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(Error::Empty)
}

#[derive(Debug)]
pub enum Error {
    Http(String),
    Api(String),
    Parse(String),
    Empty,
    Timeout,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
            Error::Empty => write!(f, "Empty response"),
            Error::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_identity() {
        let prompt = system_prompt(&Identity {
            assistant_name: "ATLAS".to_string(),
            creator_name: "K.V.SARVESH".to_string(),
        });
        assert!(prompt.starts_with("You are ATLAS"));
        assert!(prompt.contains("created by K.V.SARVESH"));
    }

    #[test]
    fn test_request_shape() {
        let request = ApiRequest {
            model: "llama3-70b-8192",
            messages: vec![ApiMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3-70b-8192");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_extract_reply() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hello!"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_reply(response).unwrap(), "Hello!");
    }

    #[test]
    fn test_extract_reply_empty() {
        let response: ApiResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(extract_reply(response), Err(Error::Empty)));
        let response: ApiResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap();
        assert!(matches!(extract_reply(response), Err(Error::Empty)));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = Client::new(
            "k".to_string(),
            "https://api.groq.com/openai/v1/".to_string(),
            "m".to_string(),
            Duration::from_secs(1),
        );
        assert_eq!(client.base_url, "https://api.groq.com/openai/v1");
    }
}
