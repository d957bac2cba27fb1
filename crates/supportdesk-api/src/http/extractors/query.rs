//! Query parameter extractors for list endpoints.

use serde::Deserialize;

/// Query parameters for `GET /chat/history`.
#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    /// Maximum number of conversations; clamped to 1..=100, default 10.
    pub limit: Option<u32>,
}
