//! Error types for `casebook-core`.
//!
//! Every backend returns this one type, so callers can match on
//! [`Error::NotFound`] without knowing which adapter they are talking to.

use thiserror::Error;

use crate::record::EntityKind;

#[derive(Debug, Error)]
pub enum Error {
  /// A workspace, entity, or link lookup found nothing.
  ///
  /// `workspace` is `None` for installation-wide records (Slack users,
  /// tokens).
  #[error("{kind} not found: {key}")]
  NotFound {
    kind:      EntityKind,
    workspace: Option<String>,
    key:       String,
  },

  /// The input violates a shape or schema rule.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Transport or storage failure inside a backend. Never retried here.
  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// A missing workspace-scoped record.
  pub fn not_found(
    kind: EntityKind,
    workspace: &str,
    key: impl ToString,
  ) -> Self {
    Self::NotFound {
      kind,
      workspace: Some(workspace.to_owned()),
      key: key.to_string(),
    }
  }

  /// A missing installation-wide record.
  pub fn global_not_found(kind: EntityKind, key: impl ToString) -> Self {
    Self::NotFound { kind, workspace: None, key: key.to_string() }
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  pub fn backend<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Backend(Box::new(err))
  }

  pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound { .. }) }

  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Validation(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn not_found_carries_context() {
    let err = Error::not_found(EntityKind::Case, "ws1", 42);
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "case not found: 42");
    match err {
      Error::NotFound { kind, workspace, key } => {
        assert_eq!(kind, EntityKind::Case);
        assert_eq!(workspace.as_deref(), Some("ws1"));
        assert_eq!(key, "42");
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn global_not_found_has_no_workspace() {
    let err = Error::global_not_found(EntityKind::Token, "abc");
    assert!(matches!(err, Error::NotFound { workspace: None, .. }));
  }
}
