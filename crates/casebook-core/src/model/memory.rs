//! Memory: a short claim the assistant keeps about a case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  record::{CaseScoped, Embedded, EntityKind, Opaque, Record},
  similarity,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Memory {
  pub id:         String,
  pub case_id:    i64,
  pub claim:      String,
  pub embedding:  Vec<f32>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Memory {
  pub fn new(case_id: i64, claim: impl Into<String>, embedding: Vec<f32>) -> Self {
    Self { case_id, claim: claim.into(), embedding, ..Default::default() }
  }
}

impl Record for Memory {
  const KIND: EntityKind = EntityKind::Memory;
  type Id = String;

  fn id(&self) -> String { self.id.clone() }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

  fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
    self.created_at = created_at;
    self.updated_at = updated_at;
  }

  fn validate(&self) -> Result<()> { similarity::validate_embedding(&self.embedding) }
}

impl Opaque for Memory {
  fn id_mut(&mut self) -> &mut String { &mut self.id }
}

impl Embedded for Memory {
  fn embedding(&self) -> &[f32] { &self.embedding }
}

impl CaseScoped for Memory {
  fn case_id(&self) -> i64 { self.case_id }
}
