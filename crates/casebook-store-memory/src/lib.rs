//! In-process backend for the Casebook repository.
//!
//! Each entity store owns its own [`tokio::sync::RwLock`]; no lock is ever
//! held across two stores, so cross-store operations (case cascades, join
//! lookups) are sequences of independent steps rather than transactions.

mod cases;
mod content;
mod risks;
mod slack;
mod store;
mod table;
mod timeline;

pub use cases::{Actions, Cases};
pub use content::{KnowledgeBase, Memories, Sources};
pub use risks::{Responses, RiskResponses, Risks};
pub use slack::SlackUsers;
pub use store::InMemoryStore;
pub use timeline::{AssistLogs, CaseMessages};

#[cfg(test)]
mod tests;
