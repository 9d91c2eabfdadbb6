//! Pipeline orchestrator - one prompt in, staged events out
//!
//! `run` walks the fixed sequence: validate prompt, locate schema, compile
//! prompts, stream the completion, sanitize and guard, execute, report. Any
//! failure aborts the rest of the sequence and is returned to the caller,
//! which turns it into the run's single error event. Retries happen only
//! inside the completion streamer.

use std::sync::Arc;
use std::time::Instant;
use tokio_stream::StreamExt;
use tracing::info;

use crate::db::QueryExecutor;
use crate::error::{PipelineError, PipelineResult};
use crate::events::{EventSink, PipelineEvent};
use crate::llm::{prompt, sanitize, AuditLog, CompletionStreamer};
use crate::schema::SchemaLocator;

pub struct QueryPipeline {
    locator: SchemaLocator,
    streamer: CompletionStreamer,
    executor: Arc<dyn QueryExecutor>,
    audit: Arc<AuditLog>,
}

impl QueryPipeline {
    pub fn new(
        locator: SchemaLocator,
        streamer: CompletionStreamer,
        executor: Arc<dyn QueryExecutor>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            locator,
            streamer,
            executor,
            audit,
        }
    }

    pub fn audit_log(&self) -> Arc<AuditLog> {
        Arc::clone(&self.audit)
    }

    /// Run one prompt through the pipeline, reporting progress to the sink
    pub async fn run(&self, prompt_text: &str, sink: &dyn EventSink) -> PipelineResult<()> {
        if prompt_text.trim().is_empty() {
            // No events before this check; an invalid call leaves no trace
            return Err(PipelineError::MissingPrompt);
        }

        let started = Instant::now();
        info!("starting pipeline run");
        sink.emit(PipelineEvent::status("Starting query generation...", 1));

        let tables = self.locator.find_relevant_tables(prompt_text).await?;
        let schema = self.locator.describe_schema(&tables, prompt_text).await?;
        info!(tables = tables.len(), "located relevant tables");

        let system_prompt = prompt::build_system_prompt(&schema);
        let user_prompt = prompt::build_user_prompt(prompt_text);

        sink.emit(PipelineEvent::status("Generating SQL query...", 2));
        let mut generated_sql = String::new();
        let mut fragments = self.streamer.stream_completion(&system_prompt, &user_prompt);
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            generated_sql.push_str(&fragment);
            sink.emit(PipelineEvent::sql_chunk(fragment));
        }

        let validated_sql = sanitize::clean(&generated_sql);
        sanitize::assert_safe(&validated_sql)?;

        sink.emit(PipelineEvent::status("Executing query...", 3));
        let rows = self
            .executor
            .query(&validated_sql)
            .await?
            .ok_or(PipelineError::EmptyResult)?;

        let duration_ms = started.elapsed().as_millis() as u64;
        self.audit
            .record(prompt_text, &validated_sql, rows.len(), duration_ms);
        info!(rows = rows.len(), duration_ms, "query executed");

        sink.emit(PipelineEvent::complete(validated_sql, rows));
        sink.emit(PipelineEvent::status("Query execution completed", 4));
        Ok(())
    }
}
