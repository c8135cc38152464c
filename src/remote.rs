//! Remote vision-language fallback.
//!
//! When local geometric extraction is unsuitable or has failed, the full
//! uncropped frame is sent to a remote vision-language endpoint together
//! with one fixed instruction, and whatever text comes back is the reading.
//! No local validation of the response format is attempted; transport and
//! inference errors propagate with the underlying message preserved so the
//! Presenter can display it verbatim.
//!
//! The remote call is network-bound with unbounded latency, so an explicit
//! request timeout is always imposed.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use base64::Engine as _;
use serde_json::json;
use url::Url;

use crate::frame::Frame;

/// The single instruction sent with every frame.
pub const READ_INSTRUCTION: &str =
    "Read this analog watch and return only the time as HH:MM.";

/// Default cap on one remote request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// JPEG quality for the request payload. Keeps the upload small without
/// blurring the hands away.
const PAYLOAD_JPEG_QUALITY: u8 = 85;

/// Configuration for the remote reader.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    /// OpenAI-compatible chat-completions endpoint URL.
    pub endpoint: String,
    /// Model name passed through in the request.
    pub model: String,
    /// Bearer token, if the endpoint requires one.
    pub api_key: Option<String>,
    /// Hard cap on one request.
    pub timeout: Duration,
}

/// Reads the time straight off a frame via remote inference.
pub struct RemoteTimeReader {
    config: RemoteConfig,
    agent: ureq::Agent,
}

impl RemoteTimeReader {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let url = Url::parse(&config.endpoint).context("parse remote endpoint")?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "unsupported remote endpoint scheme '{}'; expected http(s)",
                    other
                ))
            }
        }
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Ok(Self { config, agent })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Send the frame and return the response text verbatim.
    pub fn read(&self, frame: &Frame) -> Result<String> {
        let jpeg = frame.encode_jpeg(PAYLOAD_JPEG_QUALITY)?;
        let data_url = format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&jpeg)
        );
        let payload = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": READ_INSTRUCTION },
                    { "type": "image_url", "image_url": { "url": data_url } },
                ],
            }],
            "max_tokens": 16,
        });

        log::debug!(
            "remote read: {} bytes of jpeg to {}",
            jpeg.len(),
            self.config.endpoint
        );

        let mut request = self
            .agent
            .post(&self.config.endpoint)
            .set("Content-Type", "application/json");
        if let Some(key) = &self.config.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key));
        }

        let response = request
            .send_string(&payload.to_string())
            .map_err(|e| anyhow!("remote time reading failed: {}", e))?;
        let body = response
            .into_string()
            .context("read remote response body")?;
        let value: serde_json::Value =
            serde_json::from_str(&body).context("parse remote response as JSON")?;
        let text = value
            .pointer("/choices/0/message/content")
            .and_then(|content| content.as_str())
            .ok_or_else(|| anyhow!("remote response missing message content"))?;

        Ok(text.trim().to_string())
    }
}
