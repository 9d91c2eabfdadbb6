//! Completion streaming with bounded retry
//!
//! `CompletionStreamer` turns one logical completion request into a live
//! fragment stream. Failed attempts are re-issued from scratch up to the
//! retry ceiling, but only while nothing has been delivered yet; a failed
//! attempt never leaks partial text into the stream. Once a fragment is out,
//! a later transport failure is terminal and the consumer owns whatever text
//! it already received.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::error::PipelineError;

/// Item type of the fragment stream
pub type FragmentResult = Result<String, PipelineError>;

/// Live stream of completion fragments for one request
pub type FragmentStream = ReceiverStream<FragmentResult>;

/// Transport that can open one streaming completion attempt
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn begin(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Box<dyn CompletionAttempt>>;
}

/// One in-flight attempt; `None` means the stream closed normally
#[async_trait]
pub trait CompletionAttempt: Send {
    async fn next_fragment(&mut self) -> Result<Option<String>>;
}

/// Retry wrapper around a completion backend
pub struct CompletionStreamer {
    backend: Arc<dyn CompletionBackend>,
    max_retries: usize,
    retry_delay: Duration,
}

impl CompletionStreamer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_retry_policy(mut self, max_retries: usize, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Start one completion and stream its fragments
    ///
    /// The request runs on its own task; dropping the returned stream lets
    /// the task wind down on its next send.
    pub fn stream_completion(&self, system_prompt: &str, user_prompt: &str) -> FragmentStream {
        let (tx, rx) = mpsc::channel(32);
        let backend = Arc::clone(&self.backend);
        let max_retries = self.max_retries;
        let retry_delay = self.retry_delay;
        let system_prompt = system_prompt.to_string();
        let user_prompt = user_prompt.to_string();

        tokio::spawn(async move {
            let mut last_error: Option<anyhow::Error> = None;

            for attempt in 1..=max_retries {
                let mut delivered = false;
                match run_attempt(
                    backend.as_ref(),
                    &system_prompt,
                    &user_prompt,
                    &tx,
                    &mut delivered,
                )
                .await
                {
                    Ok(()) => return,
                    Err(err) => {
                        warn!("streaming attempt {} failed: {:#}", attempt, err);
                        if delivered {
                            // Fragments are already out; a retry would splice
                            // a second answer onto a partial one
                            let _ = tx
                                .send(Err(PipelineError::completion_exhausted(
                                    attempt,
                                    format!("{:#}", err),
                                )))
                                .await;
                            return;
                        }
                        last_error = Some(err);
                        if attempt < max_retries {
                            info!("retrying streaming in {}ms", retry_delay.as_millis());
                            tokio::time::sleep(retry_delay).await;
                        }
                    }
                }
            }

            let message = last_error
                .map(|err| format!("{:#}", err))
                .unwrap_or_else(|| "Unknown streaming error".to_string());
            let _ = tx
                .send(Err(PipelineError::completion_exhausted(
                    max_retries,
                    message,
                )))
                .await;
        });

        ReceiverStream::new(rx)
    }
}

/// Run a single attempt, forwarding fragments as they arrive
async fn run_attempt(
    backend: &dyn CompletionBackend,
    system_prompt: &str,
    user_prompt: &str,
    tx: &mpsc::Sender<FragmentResult>,
    delivered: &mut bool,
) -> Result<()> {
    let mut attempt = backend.begin(system_prompt, user_prompt).await?;
    while let Some(fragment) = attempt.next_fragment().await? {
        if tx.send(Ok(fragment)).await.is_err() {
            // Receiver dropped; stop generating
            return Ok(());
        }
        *delivered = true;
    }
    Ok(())
}
