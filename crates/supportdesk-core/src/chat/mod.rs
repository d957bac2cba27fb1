//! Chat-turn orchestration and history management.
//!
//! - `store`: conversation lookup, listing, soft delete, persistence
//! - `title`: first-exchange title derivation
//! - `gateway`: bounded context + completion call + failure classification
//! - `orchestrator`: the per-message state machine tying them together

pub mod gateway;
pub mod orchestrator;
pub mod store;
pub mod title;
