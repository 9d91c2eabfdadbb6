//! Staged progress protocol for one pipeline run
//!
//! A run reports progress as an ordered sequence of events: numbered status
//! updates, one sql-chunk per generated fragment, then exactly one complete
//! or error terminal. Events are write-once and fire-and-forget; a sink that
//! stopped listening never stalls the run.

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::debug;

/// One result record, column name to value in catalog order
pub type ResultRow = Map<String, Value>;

/// Events emitted over one run, in emission order
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PipelineEvent {
    Status {
        message: String,
        step: u8,
    },
    SqlChunk {
        chunk: String,
    },
    Complete {
        query: String,
        data: Vec<ResultRow>,
        message: String,
    },
    Error {
        message: String,
    },
}

impl PipelineEvent {
    pub fn status(message: impl Into<String>, step: u8) -> Self {
        Self::Status {
            message: message.into(),
            step,
        }
    }

    pub fn sql_chunk(chunk: impl Into<String>) -> Self {
        Self::SqlChunk {
            chunk: chunk.into(),
        }
    }

    pub fn complete(query: impl Into<String>, data: Vec<ResultRow>) -> Self {
        Self::Complete {
            query: query.into(),
            data,
            message: "Query executed successfully".to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Wire name of the event, used as the SSE event field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::SqlChunk { .. } => "sql-chunk",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}

/// Injection point the orchestrator reports through
///
/// Emission is synchronous and infallible from the pipeline's point of view;
/// delivery problems belong to the sink, not the run.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Sink backed by an unbounded channel, for forwarding events to a response
/// stream on another task
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: PipelineEvent) {
        if self.tx.send(event).is_err() {
            // Receiver went away; the run keeps going and drops the rest
            debug!("event receiver closed, dropping event");
        }
    }
}

/// Sink that records every event, for embedding and tests
#[derive(Default)]
pub struct CaptureSink {
    events: std::sync::Mutex<Vec<PipelineEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for CaptureSink {
    fn emit(&self, event: PipelineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
