//! Risks, the responses that mitigate them, and the link table between the
//! two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{EntityKind, Record, Sequential};

// ─── Risk ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Risk {
  pub id:                   i64,
  pub name:                 String,
  pub description:          String,
  pub category_ids:         Vec<String>,
  /// How this risk would hurt this particular organisation.
  pub specific_impact:      String,
  pub likelihood_id:        String,
  pub impact_id:            String,
  pub response_team_ids:    Vec<String>,
  pub assignee_ids:         Vec<String>,
  pub detection_indicators: String,
  pub created_at:           DateTime<Utc>,
  pub updated_at:           DateTime<Utc>,
}

impl Record for Risk {
  const KIND: EntityKind = EntityKind::Risk;
  type Id = i64;

  fn id(&self) -> i64 { self.id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

  fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
    self.created_at = created_at;
    self.updated_at = updated_at;
  }
}

impl Sequential for Risk {
  fn set_id(&mut self, id: i64) { self.id = id; }
}

// ─── Response ────────────────────────────────────────────────────────────────

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
pub enum ResponseStatus {
  #[default]
  Backlog,
  Todo,
  InProgress,
  Blocked,
  Completed,
  Abandoned,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
  pub id:            i64,
  pub title:         String,
  pub description:   String,
  pub responder_ids: Vec<String>,
  pub url:           String,
  pub status:        ResponseStatus,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Record for Response {
  const KIND: EntityKind = EntityKind::Response;
  type Id = i64;

  fn id(&self) -> i64 { self.id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

  fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
    self.created_at = created_at;
    self.updated_at = updated_at;
  }
}

impl Sequential for Response {
  fn set_id(&mut self, id: i64) { self.id = id; }
}

// ─── Link ────────────────────────────────────────────────────────────────────

/// One row of the risk ↔ response join table. A pair is linked at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskResponseLink {
  pub risk_id:     i64,
  pub response_id: i64,
  pub created_at:  DateTime<Utc>,
}

impl RiskResponseLink {
  /// Document key of the pair.
  pub fn key(risk_id: i64, response_id: i64) -> String {
    format!("{risk_id}:{response_id}")
  }
}
