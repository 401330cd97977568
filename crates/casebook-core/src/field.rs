//! User-defined case fields.
//!
//! A [`FieldValue`] pairs a field ID with a [`Value`] whose variant *is* the
//! declared [`FieldType`], so a value can never disagree with its type once
//! constructed. Untyped input (e.g. JSON from a GraphQL resolver) goes
//! through [`FieldValue::from_raw`], which rejects shape mismatches.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, model::case::Case};

// ─── Types ───────────────────────────────────────────────────────────────────

/// The declared type of a custom field.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FieldType {
  Text,
  Number,
  Select,
  MultiSelect,
  Url,
  Date,
}

/// A typed field payload. The serde tag doubles as the stored field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Value {
  Text(String),
  Number(f64),
  Select(String),
  MultiSelect(Vec<String>),
  Url(String),
  Date(DateTime<Utc>),
}

impl Value {
  pub fn field_type(&self) -> FieldType {
    match self {
      Self::Text(_) => FieldType::Text,
      Self::Number(_) => FieldType::Number,
      Self::Select(_) => FieldType::Select,
      Self::MultiSelect(_) => FieldType::MultiSelect,
      Self::Url(_) => FieldType::Url,
      Self::Date(_) => FieldType::Date,
    }
  }
}

/// A value stored on a case under a caller-defined field ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
  pub field_id: String,
  pub value:    Value,
}

impl FieldValue {
  pub fn new(field_id: impl Into<String>, value: Value) -> Self {
    Self { field_id: field_id.into(), value }
  }

  pub fn field_type(&self) -> FieldType { self.value.field_type() }

  /// Numbers must be finite; JSON has no encoding for NaN or infinity.
  pub fn validate(&self) -> Result<()> {
    match self.value {
      Value::Number(n) if !n.is_finite() => Err(Error::validation(format!(
        "field {:?}: number {n} is not finite",
        self.field_id
      ))),
      _ => Ok(()),
    }
  }

  /// Build a typed value from untyped JSON.
  ///
  /// Multi-select accepts any JSON array whose elements are all strings.
  /// Dates must be RFC 3339 strings.
  pub fn from_raw(
    field_id: impl Into<String>,
    field_type: FieldType,
    raw: serde_json::Value,
  ) -> Result<Self> {
    let field_id = field_id.into();
    let mismatch = || {
      Error::validation(format!(
        "field {field_id:?}: value does not match declared type {field_type}"
      ))
    };

    let value = match (field_type, raw) {
      (FieldType::Text, serde_json::Value::String(s)) => Value::Text(s),
      (FieldType::Url, serde_json::Value::String(s)) => Value::Url(s),
      (FieldType::Select, serde_json::Value::String(s)) => Value::Select(s),
      (FieldType::Number, serde_json::Value::Number(n)) => {
        Value::Number(n.as_f64().ok_or_else(mismatch)?)
      }
      (FieldType::Date, serde_json::Value::String(s)) => {
        let dt = DateTime::parse_from_rfc3339(&s).map_err(|_| mismatch())?;
        Value::Date(dt.with_timezone(&Utc))
      }
      (FieldType::MultiSelect, serde_json::Value::Array(items)) => {
        let options = items
          .into_iter()
          .map(|item| match item {
            serde_json::Value::String(s) => Ok(s),
            _ => Err(mismatch()),
          })
          .collect::<Result<Vec<_>>>()?;
        Value::MultiSelect(options)
      }
      _ => return Err(mismatch()),
    };

    Ok(Self { field_id, value })
  }
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Whether `value` conforms to `declared` and, for select types, to
/// `options`.
///
/// A value of another type is invalid. A multi-select value is invalid as
/// soon as any single element is outside `options`. When `options` is `None`
/// only the type is checked.
pub fn is_valid(
  value: &FieldValue,
  declared: FieldType,
  options: Option<&HashSet<String>>,
) -> bool {
  if value.field_type() != declared {
    return false;
  }
  let Some(options) = options else { return true };

  match &value.value {
    Value::Select(choice) => options.contains(choice),
    Value::MultiSelect(choices) => choices.iter().all(|c| options.contains(c)),
    _ => true,
  }
}

/// Result of [`count_field_values`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValueCount {
  /// Cases holding a value of the declared type under the field ID.
  pub total: usize,
  /// The subset of `total` that passes [`is_valid`].
  pub valid: usize,
}

/// Count values stored under `field_id` with exactly `declared` type. Cases
/// whose value under that ID has another type are left out of both counts.
pub fn count_field_values<'a>(
  cases: impl IntoIterator<Item = &'a Case>,
  field_id: &str,
  declared: FieldType,
  options: Option<&HashSet<String>>,
) -> FieldValueCount {
  cases
    .into_iter()
    .filter_map(|case| case.field_values.get(field_id))
    .filter(|fv| fv.field_type() == declared)
    .fold(FieldValueCount::default(), |mut acc, fv| {
      acc.total += 1;
      if is_valid(fv, declared, options) {
        acc.valid += 1;
      }
      acc
    })
}

/// The first case in iteration order whose value under `field_id` has the
/// declared type but fails validation.
pub fn find_invalid<'a>(
  cases: impl IntoIterator<Item = &'a Case>,
  field_id: &str,
  declared: FieldType,
  options: Option<&HashSet<String>>,
) -> Option<&'a Case> {
  cases.into_iter().find(|case| {
    case
      .field_values
      .get(field_id)
      .is_some_and(|fv| fv.field_type() == declared && !is_valid(fv, declared, options))
  })
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn options(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
  }

  fn case_with(field_id: &str, value: Value) -> Case {
    let mut case = Case::new("c", "");
    case.set_field(FieldValue::new(field_id, value));
    case
  }

  #[test]
  fn multi_select_requires_every_element() {
    let valid_set = options(&["network", "malware", "phishing"]);

    let bad = FieldValue::new(
      "category",
      Value::MultiSelect(vec!["network".into(), "bogus".into()]),
    );
    assert!(!is_valid(&bad, FieldType::MultiSelect, Some(&valid_set)));

    let good = FieldValue::new(
      "category",
      Value::MultiSelect(vec!["network".into(), "malware".into()]),
    );
    assert!(is_valid(&good, FieldType::MultiSelect, Some(&valid_set)));
  }

  #[test]
  fn select_checks_membership() {
    let valid_set = options(&["high", "medium", "low"]);
    let v = FieldValue::new("severity", Value::Select("high".into()));
    assert!(is_valid(&v, FieldType::Select, Some(&valid_set)));

    let v = FieldValue::new("severity", Value::Select("critical".into()));
    assert!(!is_valid(&v, FieldType::Select, Some(&valid_set)));
    assert!(is_valid(&v, FieldType::Select, None));
  }

  #[test]
  fn type_mismatch_is_invalid_not_an_error() {
    let v = FieldValue::new("severity", Value::Text("high".into()));
    assert!(!is_valid(&v, FieldType::Select, None));
  }

  #[test]
  fn from_raw_accepts_generic_string_sequences() {
    let fv = FieldValue::from_raw(
      "tags",
      FieldType::MultiSelect,
      json!(["a", "b"]),
    )
    .unwrap();
    assert_eq!(fv.value, Value::MultiSelect(vec!["a".into(), "b".into()]));

    let err = FieldValue::from_raw("tags", FieldType::MultiSelect, json!(["a", 1]))
      .unwrap_err();
    assert!(err.is_validation());
  }

  #[test]
  fn from_raw_rejects_shape_mismatch() {
    assert!(FieldValue::from_raw("n", FieldType::Number, json!("3")).is_err());
    assert!(FieldValue::from_raw("d", FieldType::Date, json!("yesterday")).is_err());

    let fv = FieldValue::from_raw("n", FieldType::Number, json!(3.5)).unwrap();
    assert_eq!(fv.value, Value::Number(3.5));

    let fv =
      FieldValue::from_raw("d", FieldType::Date, json!("2024-05-01T10:00:00Z"))
        .unwrap();
    assert_eq!(fv.field_type(), FieldType::Date);
  }

  #[test]
  fn non_finite_numbers_are_rejected() {
    for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
      let fv = FieldValue::new("score", Value::Number(n));
      assert!(fv.validate().unwrap_err().is_validation());
    }
    FieldValue::new("score", Value::Number(-2.5)).validate().unwrap();
    FieldValue::new("name", Value::Text("NaN".into())).validate().unwrap();
  }

  #[test]
  fn count_excludes_values_of_other_types() {
    let valid_set = options(&["high", "medium", "low"]);
    let cases = vec![
      case_with("severity", Value::Select("high".into())),
      case_with("severity", Value::Select("medium".into())),
      case_with("severity", Value::Select("invalid-opt".into())),
      case_with("severity", Value::Text("high".into())),
      case_with("other", Value::Select("high".into())),
    ];

    let count =
      count_field_values(&cases, "severity", FieldType::Select, Some(&valid_set));
    assert_eq!(count, FieldValueCount { total: 3, valid: 2 });

    let invalid =
      find_invalid(&cases, "severity", FieldType::Select, Some(&valid_set)).unwrap();
    assert_eq!(
      invalid.field_values["severity"].value,
      Value::Select("invalid-opt".into())
    );
  }

  #[test]
  fn serialized_tag_is_the_field_type() {
    let fv = FieldValue::new("tags", Value::MultiSelect(vec!["x".into()]));
    let json = serde_json::to_value(&fv).unwrap();
    assert_eq!(json["value"]["type"], "multi-select");
    let back: FieldValue = serde_json::from_value(json).unwrap();
    assert_eq!(back, fv);
  }
}
