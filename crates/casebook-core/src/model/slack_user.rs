//! Slack user directory cache, shared by the whole installation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{EntityKind, Record};

/// A cached Slack user profile, keyed by the Slack user ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackUser {
  pub id:           String,
  pub name:         String,
  pub real_name:    String,
  pub display_name: String,
  pub email:        String,
  pub image_url:    String,
  /// Last time this profile was written to the cache.
  pub updated_at:   DateTime<Utc>,
}

impl Record for SlackUser {
  const KIND: EntityKind = EntityKind::SlackUser;
  type Id = String;

  fn id(&self) -> String { self.id.clone() }

  fn created_at(&self) -> DateTime<Utc> { self.updated_at }

  fn set_timestamps(&mut self, _created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
    self.updated_at = updated_at;
  }
}

/// Singleton bookkeeping for the user cache refresh job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackUserMetadata {
  pub last_refresh_success: Option<DateTime<Utc>>,
  pub last_refresh_attempt: Option<DateTime<Utc>>,
  pub user_count:           usize,
}
