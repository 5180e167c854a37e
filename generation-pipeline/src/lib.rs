#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod client;
pub mod orchestrator;
pub mod persister;
pub mod services;

pub use client::GenerationApiClient;
pub use orchestrator::{GenerationOrchestrator, OrchestratorTuning};
pub use persister::ResultPersister;
pub use services::{DefaultGenerationServices, GenerationServices};
