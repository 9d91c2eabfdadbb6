//! Schema locator - narrows a prompt to relevant tables and describes them
//!
//! Relevance is lexical: a table qualifies when its lowercased name contains
//! any keyword from the normalized prompt as a substring. The description is
//! the compact one-line-per-table form the prompt template embeds.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use crate::db::QueryExecutor;
use crate::error::{PipelineError, PipelineResult};

pub struct SchemaLocator {
    executor: Arc<dyn QueryExecutor>,
    schema: String,
}

impl SchemaLocator {
    pub fn new(executor: Arc<dyn QueryExecutor>, schema: impl Into<String>) -> Self {
        Self {
            executor,
            schema: schema.into(),
        }
    }

    /// Lowercase, drop everything outside [a-z0-9 whitespace], split
    pub fn normalize_keywords(prompt: &str) -> Vec<String> {
        prompt
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
            .collect::<String>()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Keep tables whose lowercased name contains any keyword as a substring
    pub fn match_tables(tables: &[String], keywords: &[String]) -> Vec<String> {
        tables
            .iter()
            .filter(|table| {
                let lower = table.to_lowercase();
                keywords.iter().any(|keyword| lower.contains(keyword.as_str()))
            })
            .cloned()
            .collect()
    }

    /// Tables relevant to the prompt, in catalog order
    pub async fn find_relevant_tables(&self, prompt: &str) -> PipelineResult<Vec<String>> {
        let keywords = Self::normalize_keywords(prompt);
        let catalog = self.fetch_catalog().await?;
        Ok(Self::match_tables(&catalog, &keywords))
    }

    /// One line per table: `table: col (type), col (type)`
    ///
    /// Fails with `NoMatchingTables` on an empty table set; there is no
    /// fallback to describing the whole catalog.
    pub async fn describe_schema(&self, tables: &[String], prompt: &str) -> PipelineResult<String> {
        if tables.is_empty() {
            return Err(PipelineError::no_matching_tables(prompt));
        }

        let table_list = tables
            .iter()
            .map(|table| format!("'{}'", sql_escape(table)))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "SELECT table_name, column_name, data_type \
             FROM information_schema.columns \
             WHERE table_schema = '{}' AND table_name IN ({}) \
             ORDER BY table_name, ordinal_position",
            sql_escape(&self.schema),
            table_list
        );
        let rows = self
            .executor
            .query(&sql)
            .await
            .map_err(as_schema_fetch)?
            .ok_or_else(|| PipelineError::schema_fetch("column query returned no result set"))?;

        let mut columns_by_table: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in &rows {
            let table = row.get("table_name").and_then(Value::as_str);
            let column = row.get("column_name").and_then(Value::as_str);
            let data_type = row.get("data_type").and_then(Value::as_str);

            match (table, column, data_type) {
                (Some(table), Some(column), Some(data_type)) => {
                    columns_by_table
                        .entry(table.to_string())
                        .or_default()
                        .push(format!("{} ({})", column, data_type));
                }
                _ => {
                    warn!("skipping column row with missing fields: {:?}", row);
                }
            }
        }

        Ok(columns_by_table
            .into_iter()
            .map(|(table, columns)| format!("{}: {}", table, columns.join(", ")))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn fetch_catalog(&self) -> PipelineResult<Vec<String>> {
        let sql = format!(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' AND table_schema = '{}'",
            sql_escape(&self.schema)
        );
        let rows = self
            .executor
            .query(&sql)
            .await
            .map_err(as_schema_fetch)?
            .ok_or_else(|| PipelineError::schema_fetch("catalog query returned no result set"))?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            match row.get("table_name").and_then(Value::as_str) {
                Some(name) => tables.push(name.to_string()),
                None => {
                    return Err(PipelineError::schema_fetch(
                        "catalog row missing table_name",
                    ));
                }
            }
        }
        Ok(tables)
    }
}

/// Double single quotes for embedding in a literal
fn sql_escape(raw: &str) -> String {
    raw.replace('\'', "''")
}

/// Executor failures during metadata lookups are schema-fetch failures, not
/// query-execution failures
fn as_schema_fetch(err: PipelineError) -> PipelineError {
    match err {
        PipelineError::Execution { message } => PipelineError::schema_fetch(message),
        other => other,
    }
}
