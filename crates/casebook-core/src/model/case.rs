//! Case: the top-level unit of work in a workspace.
//!
//! Actions, knowledge, and memories hang off a case by `case_id` and are
//! removed with it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  field::FieldValue,
  record::{EntityKind, Record, Sequential},
};

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CaseStatus {
  #[default]
  Open,
  Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Case {
  /// Per-workspace auto-increment; `0` until the case is created.
  pub id:               i64,
  pub title:            String,
  pub description:      String,
  pub assignee_ids:     Vec<String>,
  /// Channel created for the case, if any.
  pub slack_channel_id: Option<String>,
  pub status:           CaseStatus,
  /// Custom field values keyed by field ID. Each key must equal its value's
  /// `field_id`; [`Case::set_field`] keeps them in step.
  pub field_values:     BTreeMap<String, FieldValue>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Case {
  pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      description: description.into(),
      ..Default::default()
    }
  }

  /// Insert or replace the value stored under `value.field_id`.
  pub fn set_field(&mut self, value: FieldValue) {
    self.field_values.insert(value.field_id.clone(), value);
  }
}

impl Record for Case {
  const KIND: EntityKind = EntityKind::Case;
  type Id = i64;

  fn id(&self) -> i64 { self.id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

  fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
    self.created_at = created_at;
    self.updated_at = updated_at;
  }

  fn validate(&self) -> Result<()> {
    for (key, value) in &self.field_values {
      if *key != value.field_id {
        return Err(Error::validation(format!(
          "field value for {:?} stored under key {key:?}",
          value.field_id
        )));
      }
      value.validate()?;
    }
    Ok(())
  }
}

impl Sequential for Case {
  fn set_id(&mut self, id: i64) { self.id = id; }
}

/// Filter for [`crate::store::CaseStore::list`].
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
  pub status: Option<CaseStatus>,
}

impl CaseFilter {
  pub fn matches(&self, case: &Case) -> bool {
    self.status.is_none_or(|s| s == case.status)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::field::Value;

  #[test]
  fn set_field_passes_validation() {
    let mut case = Case::new("c", "");
    case.set_field(FieldValue::new("severity", Value::Select("high".into())));
    case.validate().unwrap();
  }

  #[test]
  fn mismatched_field_key_is_rejected() {
    let mut case = Case::new("c", "");
    case
      .field_values
      .insert("priority".into(), FieldValue::new("severity", Value::Select("high".into())));
    assert!(case.validate().unwrap_err().is_validation());
  }

  #[test]
  fn non_finite_field_number_is_rejected() {
    let mut case = Case::new("c", "");
    case.set_field(FieldValue::new("score", Value::Number(f64::NAN)));
    assert!(case.validate().unwrap_err().is_validation());
  }
}
