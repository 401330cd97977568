//! CaseMessage: a Slack message mirrored into a case timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{CaseScoped, EntityKind, Record};

/// Keyed by `(workspace, case_id, id)`; `id` is the Slack message timestamp,
/// so re-delivering the same message overwrites rather than duplicates.
///
/// `created_at` is the time the message was posted in Slack and is kept as
/// given, which is what timeline ordering and pruning operate on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseMessage {
  pub id:         String,
  pub case_id:    i64,
  pub user_id:    String,
  pub user_name:  String,
  pub text:       String,
  pub created_at: DateTime<Utc>,
}

impl Record for CaseMessage {
  const KIND: EntityKind = EntityKind::CaseMessage;
  type Id = String;

  fn id(&self) -> String { self.id.clone() }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn set_timestamps(&mut self, created_at: DateTime<Utc>, _updated_at: DateTime<Utc>) {
    self.created_at = created_at;
  }
}

impl CaseScoped for CaseMessage {
  fn case_id(&self) -> i64 { self.case_id }
}
