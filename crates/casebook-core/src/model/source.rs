//! Source: an external system knowledge is ingested from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{EntityKind, Opaque, Record};

/// The kind of external system a [`Source`] points at.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceType {
  NotionDb,
  NotionPage,
  Slack,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionDbConfig {
  pub database_id:    String,
  pub database_title: String,
  pub database_url:   String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionPageConfig {
  pub page_id:    String,
  pub page_title: String,
  pub page_url:   String,
  /// Follow child pages.
  pub recursive:  bool,
  /// Depth limit when `recursive` is set; `0` means unlimited.
  pub max_depth:  u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackChannel {
  pub id:   String,
  pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackConfig {
  pub channels: Vec<SlackChannel>,
}

/// Type-specific configuration. The variant is the source's type
/// discriminator, so a config can never disagree with its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum SourceConfig {
  NotionDb(NotionDbConfig),
  NotionPage(NotionPageConfig),
  Slack(SlackConfig),
}

impl Default for SourceConfig {
  fn default() -> Self { Self::Slack(SlackConfig::default()) }
}

impl SourceConfig {
  pub fn source_type(&self) -> SourceType {
    match self {
      Self::NotionDb(_) => SourceType::NotionDb,
      Self::NotionPage(_) => SourceType::NotionPage,
      Self::Slack(_) => SourceType::Slack,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
  pub id:          String,
  pub name:        String,
  pub description: String,
  pub config:      SourceConfig,
  pub enabled:     bool,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Source {
  pub fn source_type(&self) -> SourceType { self.config.source_type() }
}

impl Record for Source {
  const KIND: EntityKind = EntityKind::Source;
  type Id = String;

  fn id(&self) -> String { self.id.clone() }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

  fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
    self.created_at = created_at;
    self.updated_at = updated_at;
  }
}

impl Opaque for Source {
  fn id_mut(&mut self) -> &mut String { &mut self.id }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn config_tag_is_the_source_type() {
    let source = Source {
      name: "Runbooks".into(),
      config: SourceConfig::NotionDb(NotionDbConfig {
        database_id: "db-1".into(),
        ..Default::default()
      }),
      ..Default::default()
    };
    assert_eq!(source.source_type(), SourceType::NotionDb);

    let json = serde_json::to_value(&source).unwrap();
    assert_eq!(json["config"]["type"], "notion_db");
    assert_eq!(json["config"]["config"]["database_id"], "db-1");
  }
}
