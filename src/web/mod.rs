//! HTTP server and routes

pub mod server;

pub use server::{router, start_server, AppState};
