//! Action: a unit of follow-up work belonging to a case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{CaseScoped, EntityKind, Record, Sequential};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ActionStatus {
  #[default]
  Backlog,
  Todo,
  InProgress,
  Blocked,
  Completed,
  Abandoned,
}

impl ActionStatus {
  /// Completed and abandoned actions need no further attention.
  pub fn is_closed(self) -> bool { matches!(self, Self::Completed | Self::Abandoned) }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
  pub id:               i64,
  pub case_id:          i64,
  pub title:            String,
  pub description:      String,
  pub assignee_ids:     Vec<String>,
  /// Timestamp of the Slack message that tracks this action.
  pub slack_message_ts: Option<String>,
  pub status:           ActionStatus,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Action {
  pub fn new(case_id: i64, title: impl Into<String>) -> Self {
    Self { case_id, title: title.into(), ..Default::default() }
  }
}

impl Record for Action {
  const KIND: EntityKind = EntityKind::Action;
  type Id = i64;

  fn id(&self) -> i64 { self.id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

  fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
    self.created_at = created_at;
    self.updated_at = updated_at;
  }
}

impl Sequential for Action {
  fn set_id(&mut self, id: i64) { self.id = id; }
}

impl CaseScoped for Action {
  fn case_id(&self) -> i64 { self.case_id }
}
