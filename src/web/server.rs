//! HTTP boundary
//!
//! One POST endpoint runs the pipeline and answers with an SSE stream that
//! forwards pipeline events in arrival order. Prompt presence and length are
//! checked here, before any pipeline work starts; a failed run becomes the
//! stream's single error event.

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::events::{ChannelSink, EventSink, PipelineEvent};
use crate::llm::AuditEntry;
use crate::pipeline::QueryPipeline;

/// Shared application state
pub type AppState = Arc<QueryPipeline>;

/// Longest accepted prompt, in characters
const MAX_PROMPT_CHARS: usize = 2000;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/table-builder", post(table_builder))
        .route("/audit", get(list_audit_entries))
        .route("/health", get(health_check))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

/// Start the web server
pub async fn start_server(pipeline: QueryPipeline, host: &str, port: u16) -> Result<()> {
    let app = router(Arc::new(pipeline));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    info!("querysmith listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Deserialize)]
struct TableBuilderRequest {
    prompt: Option<String>,
}

type EventStream = Sse<BoxedSseStream>;
type BoxedSseStream = std::pin::Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

/// Run the pipeline for one prompt, streaming progress as SSE
async fn table_builder(
    State(state): State<AppState>,
    Json(request): Json<TableBuilderRequest>,
) -> Result<EventStream, (StatusCode, Json<serde_json::Value>)> {
    let prompt = request.prompt.unwrap_or_default();
    if prompt.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "message": "Prompt parameter is required" })),
        ));
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(serde_json::json!({ "message": "Prompt is too long" })),
        ));
    }

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let sink = ChannelSink::new(tx);
        if let Err(err) = state.run(&prompt, &sink).await {
            error!("pipeline run failed: {}", err);
            sink.emit(PipelineEvent::error(err.to_string()));
        }
        // Sink drops here, closing the SSE stream
    });

    let stream: BoxedSseStream = Box::pin(UnboundedReceiverStream::new(rx).map(to_sse_event));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: PipelineEvent) -> Result<Event, Infallible> {
    let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
    Ok(Event::default().event(event.kind()).data(data))
}

async fn list_audit_entries(State(state): State<AppState>) -> Json<Vec<AuditEntry>> {
    Json(state.audit_log().entries())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
