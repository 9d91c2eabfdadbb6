//! Ollama client - chat-completion transport against an Ollama server
//!
//! Speaks the streaming `/api/chat` endpoint: one request carries the
//! system/user message pair, the response arrives as newline-delimited JSON
//! with one content fragment per line.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use tokio_stream::{Stream, StreamExt};

use crate::llm::streamer::{CompletionAttempt, CompletionBackend};

/// Ollama API client
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize, Debug)]
struct ChatChunk {
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChunkMessage {
    content: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".to_string()),
            model: model.unwrap_or_else(|| "llama3.2".to_string()),
            client: Client::new(),
        }
    }

    /// Check if the Ollama server is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    async fn begin(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Box<dyn CompletionAttempt>> {
        let url = format!("{}/api/chat", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt.to_string(),
                },
            ],
            stream: true,
            options: ChatOptions {
                num_predict: Some(1024),
                temperature: Some(0.1),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Ollama returned status {}: {}", status, body);
        }

        Ok(Box::new(OllamaAttempt {
            bytes: Box::pin(response.bytes_stream()),
            buffer: Vec::new(),
            pending: VecDeque::new(),
            done: false,
        }))
    }
}

/// One in-flight streaming response, decoded line by line
struct OllamaAttempt {
    bytes: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    done: bool,
}

impl OllamaAttempt {
    /// Split complete NDJSON lines out of the buffer into pending fragments
    fn drain_lines(&mut self) -> Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let mut line = &line[..line.len() - 1];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            if line.is_empty() {
                continue;
            }

            let chunk: ChatChunk =
                serde_json::from_slice(line).context("Malformed streaming chunk from Ollama")?;
            if let Some(error) = chunk.error {
                bail!("Ollama stream error: {}", error);
            }
            if let Some(message) = chunk.message {
                if !message.content.is_empty() {
                    self.pending.push_back(message.content);
                }
            }
            if chunk.done {
                self.done = true;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CompletionAttempt for OllamaAttempt {
    async fn next_fragment(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(fragment) = self.pending.pop_front() {
                return Ok(Some(fragment));
            }
            if self.done {
                return Ok(None);
            }
            match self.bytes.next().await {
                Some(Ok(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    self.drain_lines()?;
                }
                Some(Err(err)) => {
                    return Err(err).context("Failed to read Ollama stream");
                }
                // Connection closed without a done marker; treat as end of stream
                None => {
                    self.done = true;
                }
            }
        }
    }
}
