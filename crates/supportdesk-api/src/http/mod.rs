//! HTTP/REST API layer for Supportdesk.
//!
//! Axum-based JSON API with bearer-token authentication, per-IP rate limits,
//! CORS, and production security headers.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;

#[cfg(test)]
mod tests;
