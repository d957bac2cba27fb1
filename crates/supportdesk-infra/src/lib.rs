//! Infrastructure layer for Supportdesk.
//!
//! Contains implementations of the ports defined in `supportdesk-core`:
//! SQLite storage, Argon2 password hashing, JWT bearer tokens, the
//! OpenAI-compatible completion client, and configuration loading.

pub mod config;
pub mod crypto;
pub mod llm;
pub mod sqlite;
