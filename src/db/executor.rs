//! Query execution boundary
//!
//! The pipeline never talks to the database directly; it goes through
//! `QueryExecutor`, which runs SQL exactly as given. Policy lives upstream
//! in the guard, not here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::error;

use crate::error::PipelineResult;
use crate::events::ResultRow;

/// Read-side query capability
///
/// `Ok(None)` means the statement produced no row set at all, as opposed to
/// a row set with zero rows.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn query(&self, sql: &str) -> PipelineResult<Option<Vec<ResultRow>>>;
}

/// Executor backed by one tokio-postgres connection
///
/// Uses the simple query protocol, so every value comes back text-encoded;
/// rows map column names to JSON strings, SQL NULL to JSON null.
pub struct PostgresExecutor {
    client: Client,
}

impl PostgresExecutor {
    /// Connect and spawn the connection driver task
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .context("Failed to connect to PostgreSQL")?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                error!("PostgreSQL connection error: {}", err);
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    async fn query(&self, sql: &str) -> PipelineResult<Option<Vec<ResultRow>>> {
        let messages = self.client.simple_query(sql).await?;

        let mut saw_row_set = false;
        let mut rows = Vec::new();
        for message in messages {
            match message {
                SimpleQueryMessage::RowDescription(_) => {
                    saw_row_set = true;
                }
                SimpleQueryMessage::Row(row) => {
                    saw_row_set = true;
                    let mut record = ResultRow::new();
                    for (idx, column) in row.columns().iter().enumerate() {
                        let value = match row.get(idx) {
                            Some(text) => Value::String(text.to_string()),
                            None => Value::Null,
                        };
                        record.insert(column.name().to_string(), value);
                    }
                    rows.push(record);
                }
                _ => {}
            }
        }

        if saw_row_set {
            Ok(Some(rows))
        } else {
            Ok(None)
        }
    }
}
