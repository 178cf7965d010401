//! HTTP client for the Gemini `generateContent` REST API.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::types::LlmClient;
use super::AnalysisError;
use crate::config;

/// Gemini REST client (blocking).
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Create a client against the given base URL.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Build a client from GEMINI_API_KEY / GEMINI_BASE_URL, with a
    /// 5-minute request timeout. Errors when the key is absent.
    pub fn from_env() -> Result<Self, AnalysisError> {
        let api_key = config::gemini_api_key().ok_or(AnalysisError::MissingApiKey)?;
        Ok(Self::new(&config::gemini_base_url(), &api_key, 300))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post_generate(
        &self,
        model: &str,
        request: &GenerateRequest<'_>,
    ) -> Result<String, AnalysisError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    AnalysisError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    AnalysisError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    AnalysisError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| AnalysisError::ResponseParsing(e.to_string()))?;

        let text = parsed.text();
        if text.is_empty() {
            return Err(AnalysisError::MalformedResponse(
                "Response carried no candidate text".into(),
            ));
        }
        Ok(text)
    }
}

impl LlmClient for GeminiClient {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AnalysisError> {
        let request = GenerateRequest::text(prompt, system);
        self.post_generate(model, &request)
    }

    fn generate_with_image(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
        png_base64: &str,
    ) -> Result<String, AnalysisError> {
        let request = GenerateRequest::with_image(prompt, system, png_base64);
        self.post_generate(model, &request)
    }
}

// ──────────────────────────────────────────────
// Wire types
// ──────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData<'a>>,
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn text(prompt: &'a str, system: Option<&'a str>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt),
                    inline_data: None,
                }],
            }],
            system_instruction: system.map(|s| Content {
                parts: vec![Part {
                    text: Some(s),
                    inline_data: None,
                }],
            }),
        }
    }

    fn with_image(prompt: &'a str, system: Option<&'a str>, png_base64: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: "image/png",
                            data: png_base64,
                        }),
                    },
                    Part {
                        text: Some(prompt),
                        inline_data: None,
                    },
                ],
            }],
            system_instruction: system.map(|s| Content {
                parts: vec![Part {
                    text: Some(s),
                    inline_data: None,
                }],
            }),
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenate all text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

// ──────────────────────────────────────────────
// Mock for testing
// ──────────────────────────────────────────────

/// Mock LLM client — returns queued responses in order, repeating the
/// last one once the queue drains.
pub struct MockLlmClient {
    responses: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    failure: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self::with_responses(&[response])
    }

    pub fn with_responses(responses: &[&str]) -> Self {
        let queue: VecDeque<String> = responses.iter().map(|s| s.to_string()).collect();
        let last = queue.back().cloned().unwrap_or_default();
        Self {
            responses: Mutex::new(queue),
            last: Mutex::new(last),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails with a connection error.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            last: Mutex::new(String::new()),
            failure: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Models requested so far, in call order.
    pub fn models_called(&self) -> Vec<String> {
        self.calls.lock().expect("mock lock").clone()
    }

    fn next_response(&self, model: &str) -> Result<String, AnalysisError> {
        self.calls.lock().expect("mock lock").push(model.to_string());
        if let Some(message) = &self.failure {
            return Err(AnalysisError::Connection(message.clone()));
        }
        let mut queue = self.responses.lock().expect("mock lock");
        match queue.pop_front() {
            Some(response) => Ok(response),
            None => Ok(self.last.lock().expect("mock lock").clone()),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn generate(
        &self,
        model: &str,
        _prompt: &str,
        _system: Option<&str>,
    ) -> Result<String, AnalysisError> {
        self.next_response(model)
    }

    fn generate_with_image(
        &self,
        model: &str,
        _prompt: &str,
        _system: Option<&str>,
        _png_base64: &str,
    ) -> Result<String, AnalysisError> {
        self.next_response(model)
    }
}
