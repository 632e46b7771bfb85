//! Core pipeline for an LLM-driven block-game agent: text extraction,
//! validation, authorization, and bounded sequential execution.
//!
//! World interaction and network session plumbing live behind the
//! [`agent::GameApi`] and [`agent::LlmClient`] traits so host binaries can
//! supply their own collaborators.

pub mod agent;
pub mod llm;
