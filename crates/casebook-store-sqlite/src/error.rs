//! Error type for `casebook-store-sqlite`.
//!
//! Store trait methods return [`casebook_core::Error`]; this type covers
//! opening the database and is folded into the core error everywhere else.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A stored document or counter that cannot be interpreted.
  #[error("corrupt document in {collection}: {reason}")]
  Corrupt { collection: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for casebook_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Json(e) => casebook_core::Error::Serialization(e),
      other => casebook_core::Error::backend(other),
    }
  }
}

