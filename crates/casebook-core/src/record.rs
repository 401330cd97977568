//! The [`Record`] trait and the identity rules shared by every entity kind.
//!
//! Backends never inspect entity fields directly for bookkeeping; they go
//! through this trait so ID assignment and timestamp handling are the same
//! whichever adapter persists the value.

use std::{fmt, hash::Hash};

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Result, clock};

// ─── Entity kind ─────────────────────────────────────────────────────────────

/// Discriminant naming each entity kind; used in errors and as the
/// collection name in document backends.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Case,
  Action,
  Knowledge,
  Memory,
  Source,
  SlackUser,
  SlackUserMetadata,
  CaseMessage,
  AssistLog,
  Response,
  Risk,
  RiskResponse,
  Token,
  /// Per-workspace auto-increment counters.
  Counter,
}

impl EntityKind {
  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted entity.
///
/// `Clone` is the copy boundary: stores take ownership of what callers hand
/// them and return clones, so no caller ever holds a reference into stored
/// state.
pub trait Record:
  Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
  const KIND: EntityKind;

  type Id: Clone
    + Eq
    + Hash
    + Ord
    + fmt::Display
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static;

  fn id(&self) -> Self::Id;

  fn created_at(&self) -> DateTime<Utc>;

  /// Entities without a separate modification time report `created_at`.
  fn updated_at(&self) -> DateTime<Utc> { self.created_at() }

  /// Overwrite the server-managed timestamps.
  fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);

  /// Reject content no backend can store faithfully. Checked by every
  /// `create` and `update` before anything is written.
  fn validate(&self) -> Result<()> { Ok(()) }
}

/// Relational entities whose IDs come from a per-workspace counter.
pub trait Sequential: Record<Id = i64> {
  fn set_id(&mut self, id: i64);
}

/// Content-addressed entities with globally unique string IDs.
pub trait Opaque: Record<Id = String> {
  fn id_mut(&mut self) -> &mut String;
}

/// Entities that may carry an embedding vector. An empty slice means the
/// entity has no embedding.
pub trait Embedded {
  fn embedding(&self) -> &[f32];
}

/// Entities owned by a case.
pub trait CaseScoped {
  fn case_id(&self) -> i64;
}

// ─── Lifecycle helpers ───────────────────────────────────────────────────────

/// Stamp a record that is about to be inserted for the first time. Any
/// timestamps the caller supplied are discarded.
pub fn stamp_created<R: Record>(record: &mut R) {
  let now = clock::now();
  record.set_timestamps(now, now);
}

/// Stamp a replacement for `existing`: `created_at` is carried over and
/// `updated_at` moves strictly forward.
pub fn stamp_updated<R: Record>(record: &mut R, existing: &R) {
  record.set_timestamps(
    existing.created_at(),
    clock::advance(existing.updated_at()),
  );
}

/// Generate an opaque ID unless the caller already supplied one.
pub fn ensure_opaque_id<R: Opaque>(record: &mut R) {
  let id = record.id_mut();
  if id.is_empty() {
    *id = new_opaque_id();
  }
}

pub fn new_opaque_id() -> String { Uuid::new_v4().to_string() }

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::memory::Memory;

  #[test]
  fn entity_kind_names_are_snake_case() {
    assert_eq!(EntityKind::CaseMessage.as_str(), "case_message");
    assert_eq!(EntityKind::SlackUserMetadata.to_string(), "slack_user_metadata");
    assert_eq!("risk_response".parse::<EntityKind>().ok(), Some(EntityKind::RiskResponse));
  }

  #[test]
  fn supplied_opaque_id_is_preserved() {
    let mut m = Memory { id: "mem-fixed".into(), ..Default::default() };
    ensure_opaque_id(&mut m);
    assert_eq!(m.id, "mem-fixed");

    let mut m = Memory::default();
    ensure_opaque_id(&mut m);
    assert!(Uuid::parse_str(&m.id).is_ok());
  }

  #[test]
  fn stamp_updated_keeps_created_at() {
    let mut old = Memory::default();
    stamp_created(&mut old);

    let mut new = old.clone();
    new.set_timestamps(DateTime::<Utc>::UNIX_EPOCH, DateTime::<Utc>::UNIX_EPOCH);
    stamp_updated(&mut new, &old);

    assert_eq!(new.created_at, old.created_at);
    assert!(new.updated_at > old.updated_at);
  }
}
