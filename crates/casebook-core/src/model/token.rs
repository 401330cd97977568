//! Session tokens issued after sign-in.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, clock};

/// How long a freshly issued token stays valid, in days.
pub const DEFAULT_TOKEN_LIFETIME_DAYS: i64 = 7;

/// Public half of a session credential; safe to log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TokenId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Secret half of a session credential. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);

impl TokenSecret {
  pub fn new(secret: impl Into<String>) -> Self { Self(secret.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Debug for TokenSecret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("TokenSecret(<redacted>)")
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
  pub id:         TokenId,
  pub secret:     TokenSecret,
  /// Subject (user ID) the token was issued to.
  pub sub:        String,
  pub email:      String,
  pub name:       String,
  pub expires_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

fn random_hex(len: usize) -> String {
  let mut buf = vec![0_u8; len];
  OsRng.fill_bytes(&mut buf);
  hex::encode(buf)
}

impl Token {
  /// Issue a token with a random ID and secret and the default lifetime.
  pub fn new(
    sub: impl Into<String>,
    email: impl Into<String>,
    name: impl Into<String>,
  ) -> Self {
    let now = clock::now();
    Self {
      id:         TokenId(random_hex(16)),
      secret:     TokenSecret(random_hex(32)),
      sub:        sub.into(),
      email:      email.into(),
      name:       name.into(),
      expires_at: now + TimeDelta::days(DEFAULT_TOKEN_LIFETIME_DAYS),
      created_at: now,
    }
  }

  pub fn is_expired(&self) -> bool { self.expires_at <= clock::now() }

  /// Check the invariants every stored token must satisfy.
  pub fn validate(&self) -> Result<()> {
    if self.id.0.is_empty() {
      return Err(Error::validation("token id is empty"));
    }
    if self.secret.0.is_empty() {
      return Err(Error::validation("token secret is empty"));
    }
    if self.sub.is_empty() {
      return Err(Error::validation("token subject is empty"));
    }
    if self.expires_at <= self.created_at {
      return Err(Error::validation("token expires before it was created"));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_token_is_valid_and_unique() {
    let a = Token::new("U123", "a@example.com", "Alice");
    let b = Token::new("U123", "a@example.com", "Alice");
    a.validate().unwrap();
    assert_ne!(a.id, b.id);
    assert_ne!(a.secret, b.secret);
    assert_eq!(a.id.as_str().len(), 32);
    assert!(!a.is_expired());
  }

  #[test]
  fn validate_rejects_broken_tokens() {
    let mut t = Token::new("U1", "", "");
    t.sub.clear();
    assert!(t.validate().unwrap_err().is_validation());

    let mut t = Token::new("U1", "", "");
    t.expires_at = t.created_at;
    assert!(t.validate().is_err());

    let mut t = Token::new("U1", "", "");
    t.secret = TokenSecret::new("");
    assert!(t.validate().is_err());
  }

  #[test]
  fn secret_debug_is_redacted() {
    let t = Token::new("U1", "", "");
    let dbg = format!("{t:?}");
    assert!(!dbg.contains(t.secret.as_str()));
  }
}
