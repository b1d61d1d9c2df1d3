// src/oracle/client.rs - Verification oracle backed by the Anthropic Messages API
use anyhow::{anyhow, Context, Result};
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::thread;
use std::time::Duration;

use crate::oracle::parse::parse_judgment;
use crate::oracle::{Judgment, VerificationOracle};
use crate::utils::config::OracleConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const RETRY_BACKOFF_MS: u64 = 1000;

/// Non-success HTTP status from the Messages API.
#[derive(Debug)]
struct StatusError {
    status: StatusCode,
    body: String,
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oracle returned status {}: {}", self.status, self.body)
    }
}

impl std::error::Error for StatusError {}

/// Rate limits, request timeouts and server errors may clear up on a retry.
/// Other client errors (bad key, malformed request) never will.
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Transport failures and timeouts are retried, as are retryable statuses.
fn should_retry(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<StatusError>() {
        Some(status_error) => is_retryable_status(status_error.status),
        None => true,
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'p> {
    model: &'p str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<RequestMessage<'p>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'p> {
    role: &'static str,
    content: &'p str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn text(&self) -> Option<String> {
        let text: Vec<&str> = self
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text.join("\n"))
        }
    }
}

pub struct AnthropicOracle {
    client: Client,
    api_key: String,
    config: OracleConfig,
}

impl AnthropicOracle {
    pub fn new(config: OracleConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("ANTHROPIC_API_KEY is not set"))?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client for the verification oracle")?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn attempt(&self, prompt: &str) -> Result<Judgment> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: 0.0,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.api_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .context("Failed to send request to the verification oracle")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StatusError { status, body }.into());
        }

        let parsed: MessagesResponse = response
            .json()
            .context("Failed to decode oracle response body")?;
        let text = parsed
            .text()
            .ok_or_else(|| anyhow!("Oracle response had no text content"))?;
        debug!("Raw oracle reply: {}", text);
        parse_judgment(&text)
    }
}

impl VerificationOracle for AnthropicOracle {
    fn name(&self) -> &str {
        &self.config.model
    }

    fn judge(
        &self,
        query_label: &str,
        candidate_name: &str,
        candidate_location: Option<&str>,
    ) -> Result<Judgment> {
        let prompt = build_prompt(query_label, candidate_name, candidate_location);
        let attempts = self.config.max_retries + 1;
        let mut last_error = anyhow!("Oracle was never called");

        for attempt in 1..=attempts {
            match self.attempt(&prompt) {
                Ok(judgment) => return Ok(judgment),
                Err(e) => {
                    if !should_retry(&e) {
                        debug!("Oracle attempt {} failed, not retrying: {:#}", attempt, e);
                        return Err(e);
                    }
                    if attempt < attempts {
                        debug!("Oracle attempt {} failed, retrying: {:#}", attempt, e);
                        thread::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64));
                    }
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

pub fn build_prompt(
    query_label: &str,
    candidate_name: &str,
    candidate_location: Option<&str>,
) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are matching restaurant deal listings to a restaurant directory.\n\n");
    prompt.push_str(&format!("Deal Name: \"{}\"\n", query_label));
    prompt.push_str(&format!("Restaurant Name: \"{}\"\n", candidate_name));
    prompt.push_str(&format!(
        "Location Name: \"{}\"\n\n",
        candidate_location.unwrap_or("[No Location]")
    ));
    prompt.push_str(
        "Do the deal and the restaurant refer to the same real-world place? Consider \
         neighborhood names, street names, location descriptors and abbreviations.\n\n",
    );
    prompt.push_str("Respond with exactly one JSON object and nothing else:\n");
    prompt.push_str(
        "{\"verdict\": \"ACCEPT\" or \"REJECT\", \"confidence\": \"HIGH\", \"MEDIUM\" or \"LOW\", \"reason\": \"<one sentence>\"}",
    );
    prompt
}
