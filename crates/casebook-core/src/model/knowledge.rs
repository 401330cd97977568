//! Knowledge: a summarised finding pulled from a source into a case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  record::{CaseScoped, Embedded, EntityKind, Opaque, Record},
  similarity,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Knowledge {
  /// Generated on create unless supplied.
  pub id:          String,
  pub case_id:     i64,
  /// The [`Source`](super::Source) the finding came from.
  pub source_id:   String,
  pub source_urls: Vec<String>,
  pub title:       String,
  pub summary:     String,
  /// Empty when no embedding has been computed.
  pub embedding:   Vec<f32>,
  /// When the underlying material was captured from the source.
  pub sourced_at:  Option<DateTime<Utc>>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Record for Knowledge {
  const KIND: EntityKind = EntityKind::Knowledge;
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

impl Opaque for Knowledge {
  fn id_mut(&mut self) -> &mut String { &mut self.id }
}

impl Embedded for Knowledge {
  fn embedding(&self) -> &[f32] { &self.embedding }
}

impl CaseScoped for Knowledge {
  fn case_id(&self) -> i64 { self.case_id }
}
