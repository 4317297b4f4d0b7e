//! CancinHub HTTP API
//!
//! axum routes over the [`Casino`](crate::casino::Casino) service. Every
//! response uses the `{success, message, data}` envelope; failures carry a
//! machine-readable code and the request id.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod monitoring;
pub mod routes;
pub mod server;

pub use server::{create_app, init_tracing, ApiServer};
