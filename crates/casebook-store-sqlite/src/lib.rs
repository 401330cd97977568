//! SQLite document-store backend for the Casebook repository.
//!
//! Every record is a JSON document in a named collection, the way a hosted
//! document database would hold it. Collections are named
//! `{prefix}/{workspace}/{kind}`, with `%` and `/` escaped inside the prefix
//! and workspace; installation-wide data lives in `{prefix}/slack_users`,
//! `{prefix}/slack_user_metadata` and `{prefix}/tokens`. Access goes through
//! [`tokio_rusqlite`] so queries run on a dedicated thread without blocking
//! the async runtime.

mod cases;
mod content;
mod docstore;
mod encode;
mod risks;
mod schema;
mod slack;
mod store;
mod timeline;

pub mod error;

pub use cases::{Actions, Cases};
pub use content::{KnowledgeBase, Memories, Sources};
pub use error::{Error, Result};
pub use risks::{Responses, RiskResponses, Risks};
pub use slack::SlackUsers;
pub use store::SqliteStore;
pub use timeline::{AssistLogs, CaseMessages};

#[cfg(test)]
mod tests;
