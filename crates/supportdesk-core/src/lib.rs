//! Business logic and repository trait definitions for Supportdesk.
//!
//! This crate defines the "ports" (repository, provider, and credential
//! traits) that the infrastructure layer implements, plus the services built
//! on them: authentication, the conversation store, the completion gateway,
//! and the chat orchestrator. It depends only on `supportdesk-types` -- never
//! on `supportdesk-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
pub mod repository;
pub mod service;

#[cfg(test)]
mod test_support;
