//! AssistLog: an append-only record of one assistant run on a case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{CaseScoped, EntityKind, Opaque, Record};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistLog {
  pub id:         String,
  pub case_id:    i64,
  pub summary:    String,
  /// What the assistant did during the run.
  pub actions:    String,
  pub reasoning:  String,
  pub next_steps: String,
  pub created_at: DateTime<Utc>,
}

impl Record for AssistLog {
  const KIND: EntityKind = EntityKind::AssistLog;
  type Id = String;

  fn id(&self) -> String { self.id.clone() }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn set_timestamps(&mut self, created_at: DateTime<Utc>, _updated_at: DateTime<Utc>) {
    self.created_at = created_at;
  }
}

impl Opaque for AssistLog {
  fn id_mut(&mut self) -> &mut String { &mut self.id }
}

impl CaseScoped for AssistLog {
  fn case_id(&self) -> i64 { self.case_id }
}
