//! Shared domain types for Supportdesk.
//!
//! This crate contains the core domain types used across the support chat
//! backend: users, conversations and turns, completion requests, runtime
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod user;
