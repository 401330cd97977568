//! JSON encoding of documents and the SQL values used to query them.

use casebook_core::record::EntityKind;
use rusqlite::types::Value;
use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

pub fn encode<T: Serialize>(doc: &T) -> Result<String> { Ok(serde_json::to_string(doc)?) }

pub fn decode<T: DeserializeOwned>(collection: &str, body: &str) -> Result<T> {
  serde_json::from_str(body).map_err(|e| Error::Corrupt {
    collection: collection.to_owned(),
    reason:     e.to_string(),
  })
}

pub fn decode_all<T: DeserializeOwned>(collection: &str, bodies: Vec<String>) -> Result<Vec<T>> {
  bodies.iter().map(|b| decode(collection, b)).collect()
}

/// Serde failures inside a `Connection::call` closure.
pub fn in_call(err: serde_json::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(Error::Json(err)))
}

// ─── Collection names ───────────────────────────────────────────────────────

/// Escape `%` and `/` so a caller-chosen component can never contain the
/// separator.
fn escape(component: &str) -> String { component.replace('%', "%25").replace('/', "%2F") }

/// `{prefix}/{workspace}/{kind}`.
pub fn workspace_collection(prefix: &str, workspace: &str, kind: EntityKind) -> String {
  format!("{}/{}/{kind}", escape(prefix), escape(workspace))
}

/// `{prefix}/{workspace}/case_message/{case_id}`: one timeline per case.
pub fn timeline_collection(prefix: &str, workspace: &str, case_id: i64) -> String {
  format!("{}/{}/{}/{case_id}", escape(prefix), escape(workspace), EntityKind::CaseMessage)
}

/// `{prefix}/{name}`.
pub fn global_collection(prefix: &str, name: &str) -> String {
  format!("{}/{name}", escape(prefix))
}

// ─── Query values ────────────────────────────────────────────────────────────

pub fn text(s: impl Into<String>) -> Value { Value::Text(s.into()) }

pub fn integer(i: i64) -> Value { Value::Integer(i) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collection_names() {
    assert_eq!(workspace_collection("", "ws1", EntityKind::Case), "/ws1/case");
    assert_eq!(workspace_collection("t_", "ws1", EntityKind::RiskResponse), "t_/ws1/risk_response");
    assert_eq!(timeline_collection("", "ws1", 7), "/ws1/case_message/7");
    assert_eq!(global_collection("t_", "tokens"), "t_/tokens");
  }

  #[test]
  fn prefix_and_workspace_never_run_together() {
    assert_ne!(
      workspace_collection("t1", "0ws", EntityKind::Case),
      workspace_collection("t10", "ws", EntityKind::Case),
    );
    assert_ne!(
      workspace_collection("a/b", "c", EntityKind::Case),
      workspace_collection("a", "b/c", EntityKind::Case),
    );
    assert_eq!(workspace_collection("a/b", "c%", EntityKind::Case), "a%2Fb/c%25/case");
  }

  #[test]
  fn decode_reports_collection() {
    let err = decode::<serde_json::Value>("ws1/case", "{not json").unwrap_err();
    match err {
      Error::Corrupt { collection, .. } => assert_eq!(collection, "ws1/case"),
      other => panic!("unexpected error: {other:?}"),
    }
  }
}
