use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use querysmith::db::QueryExecutor;
use querysmith::llm::{AuditLog, CompletionAttempt, CompletionBackend, CompletionStreamer};
use querysmith::schema::SchemaLocator;
use querysmith::{CaptureSink, PipelineEvent, PipelineResult, QueryPipeline, ResultRow};

/// Backend that answers every request with the same canned completion, so the
/// pipeline can be exercised without a model server
struct CannedBackend {
    fragments: Vec<&'static str>,
}

#[async_trait]
impl CompletionBackend for CannedBackend {
    async fn begin(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> Result<Box<dyn CompletionAttempt>> {
        Ok(Box::new(CannedAttempt {
            fragments: self.fragments.clone().into(),
        }))
    }
}

struct CannedAttempt {
    fragments: VecDeque<&'static str>,
}

#[async_trait]
impl CompletionAttempt for CannedAttempt {
    async fn next_fragment(&mut self) -> Result<Option<String>> {
        Ok(self.fragments.pop_front().map(str::to_string))
    }
}

/// Executor that serves a tiny fixed catalog instead of a live database
struct DemoExecutor;

#[async_trait]
impl QueryExecutor for DemoExecutor {
    async fn query(&self, sql: &str) -> PipelineResult<Option<Vec<ResultRow>>> {
        if sql.contains("information_schema.tables") {
            return Ok(Some(rows(&[json!({ "table_name": "orders" })])));
        }
        if sql.contains("information_schema.columns") {
            return Ok(Some(rows(&[
                json!({ "table_name": "orders", "column_name": "id", "data_type": "integer" }),
                json!({ "table_name": "orders", "column_name": "total", "data_type": "numeric" }),
                json!({ "table_name": "orders", "column_name": "placed_at", "data_type": "timestamp" }),
            ])));
        }
        Ok(Some(rows(&[
            json!({ "id": 1, "total": "19.99" }),
            json!({ "id": 2, "total": "5.00" }),
        ])))
    }
}

fn rows(values: &[Value]) -> Vec<ResultRow> {
    values
        .iter()
        .filter_map(|value| value.as_object().cloned())
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("querysmith - Basic Usage Example");

    let executor = Arc::new(DemoExecutor);
    let backend = Arc::new(CannedBackend {
        fragments: vec!["```sql\nSELECT * FROM orders\n", "LIMIT 30\n```"],
    });

    let pipeline = QueryPipeline::new(
        SchemaLocator::new(executor.clone(), "public"),
        CompletionStreamer::new(backend),
        executor,
        Arc::new(AuditLog::default()),
    );

    let sink = CaptureSink::new();
    let prompt = "show me recent orders";
    println!("\nPrompt: {prompt}");

    match pipeline.run(prompt, &sink).await {
        Ok(()) => println!("✓ Pipeline run completed"),
        Err(e) => println!("✗ Pipeline error: {e}"),
    }

    println!("\n--- Events ---");
    for event in sink.events() {
        match &event {
            PipelineEvent::Status { message, step } => println!("[status {step}] {message}"),
            PipelineEvent::SqlChunk { chunk } => println!("[sql-chunk] {chunk:?}"),
            PipelineEvent::Complete { query, data, .. } => {
                println!("[complete] {query}");
                println!("           {} rows returned", data.len());
            }
            PipelineEvent::Error { message } => println!("[error] {message}"),
        }
    }

    for entry in pipeline.audit_log().entries() {
        println!(
            "\nAudited as {}: {} rows in {} ms",
            entry.id, entry.row_count, entry.duration_ms
        );
    }

    Ok(())
}
