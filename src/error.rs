//! Unified error type for the query pipeline
//!
//! Every failure a run can surface maps to exactly one variant here.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// Prompt was empty or all whitespace
    #[error("Prompt parameter is required")]
    MissingPrompt,

    /// Table catalog or column metadata fetch returned a malformed shape
    #[error("Failed to fetch tables: {message}")]
    SchemaFetch { message: String },

    /// Keyword matching produced an empty relevant-table set
    #[error("No matching tables found for prompt: \"{prompt}\"")]
    NoMatchingTables { prompt: String },

    /// Completion transport failed on every attempt
    #[error("Streaming failed after {attempts} attempts: {message}")]
    CompletionExhausted { attempts: usize, message: String },

    /// Generated statement does not start with SELECT
    #[error("Generated query must be a SELECT statement")]
    NotSelect,

    /// Generated statement contains more than one statement
    #[error("Generated query must be a single statement")]
    MultipleStatements,

    /// Generated statement contains a write/DDL keyword
    #[error("Generated query contains forbidden keyword: {keyword}")]
    ForbiddenKeyword { keyword: String },

    /// Executor returned no row set
    #[error("Query execution returned no results")]
    EmptyResult,

    /// Executor-level failures: connection loss, SQL errors from the database
    #[error("Query execution failed: {message}")]
    Execution { message: String },
}

impl PipelineError {
    pub fn schema_fetch(message: impl Into<String>) -> Self {
        Self::SchemaFetch {
            message: message.into(),
        }
    }

    pub fn no_matching_tables(prompt: impl Into<String>) -> Self {
        Self::NoMatchingTables {
            prompt: prompt.into(),
        }
    }

    pub fn completion_exhausted(attempts: usize, message: impl Into<String>) -> Self {
        Self::CompletionExhausted {
            attempts,
            message: message.into(),
        }
    }

    pub fn forbidden_keyword(keyword: impl Into<String>) -> Self {
        Self::ForbiddenKeyword {
            keyword: keyword.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }
}

impl From<tokio_postgres::Error> for PipelineError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::Execution {
            message: err.to_string(),
        }
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
