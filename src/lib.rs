//! # querysmith
//!
//! Turns a natural-language request into a validated, read-only SQL query
//! and streams progress and results to the caller as staged events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use querysmith::config::ServiceConfig;
//! use querysmith::db::PostgresExecutor;
//! use querysmith::llm::{AuditLog, CompletionStreamer, OllamaClient};
//! use querysmith::pipeline::QueryPipeline;
//! use querysmith::schema::SchemaLocator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServiceConfig::from_env();
//!
//!     let executor = Arc::new(PostgresExecutor::connect(&config.database.url).await?);
//!     let backend = Arc::new(OllamaClient::new(
//!         Some(config.llm.base_url.clone()),
//!         Some(config.llm.model.clone()),
//!     ));
//!
//!     let pipeline = QueryPipeline::new(
//!         SchemaLocator::new(executor.clone(), &config.database.schema),
//!         CompletionStreamer::new(backend),
//!         executor,
//!         Arc::new(AuditLog::default()),
//!     );
//!
//!     querysmith::web::start_server(pipeline, &config.server.host, config.server.port).await
//! }
//! ```
//!
//! ## How a run works
//!
//! - **Locate**: keyword-match the prompt against the table catalog, then
//!   describe the matching tables' columns as a compact text schema
//! - **Generate**: stream a completion from the model, forwarding each
//!   fragment as a `sql-chunk` event, with bounded retry on transport failure
//! - **Guard**: strip fencing artifacts and enforce the single-SELECT policy
//!   before anything executes
//! - **Execute**: run the validated SQL and emit one `complete` event with
//!   the rows, or one `error` event if any step failed

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod llm;
pub mod pipeline;
pub mod schema;
pub mod web;

pub use error::{PipelineError, PipelineResult};
pub use events::{CaptureSink, ChannelSink, EventSink, PipelineEvent, ResultRow};
pub use pipeline::QueryPipeline;
