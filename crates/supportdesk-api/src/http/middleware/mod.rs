//! Request middleware: per-IP rate limits and security headers.

pub mod rate_limit;
pub mod security_headers;
