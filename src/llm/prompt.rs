//! Prompt templates for SQL generation
//!
//! The system prompt pins the model to the supplied schema and to a plain
//! text output contract the sanitizer downstream relies on. The sentinel
//! literal is reproduced exactly: a model answering with it fails the
//! SELECT-prefix guard and surfaces as a generation error instead of
//! reaching the database.

/// Literal the model must return when the request cannot be answered from
/// the known schema
pub const SCHEMA_ERROR_SENTINEL: &str = "ERROR: Unknown table or column";

/// Row limit applied when the user does not ask for one
pub const DEFAULT_ROW_LIMIT: u32 = 30;

/// Render the system-role instruction text for one request
pub fn build_system_prompt(schema: &str) -> String {
    format!(
        r#"You are a PostgreSQL query builder.

DATABASE SCHEMA:
{schema}

TASK:
Given a user request, generate a valid SQL query using ONLY tables and columns from the schema above.

VALIDATION:
- DO NOT guess, infer, or suggest alternative tables/columns.
- If any table or column in the request does NOT exist in the schema, return EXACTLY:
  {sentinel}
- Otherwise, return ONLY the SQL query.

CRITICAL RULES:
1. Column names are CASE-SENSITIVE.
2. No table aliases - always use full table names.
3. Double-quote "TableName"."ColumnName" only when required (spaces, reserved words, mixed case).
4. Use LIMIT {limit} by default unless the user specifies a different limit.
5. Write clean, readable SQL.

OUTPUT FORMAT:
- Return ONLY the raw SQL query text.
- DO NOT wrap the SQL in markdown code blocks or backticks.
- DO NOT add any explanations, comments, or formatting.
- Just the plain SQL query string."#,
        schema = schema,
        sentinel = SCHEMA_ERROR_SENTINEL,
        limit = DEFAULT_ROW_LIMIT,
    )
}

/// Render the user-role text for one request
pub fn build_user_prompt(prompt: &str) -> String {
    format!("Generate SQL for: {}", prompt)
}
