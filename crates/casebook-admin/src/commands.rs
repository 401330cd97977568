//! Maintenance commands, written against [`Repository`] so they run the same
//! way on every backend.

use std::{collections::HashSet, io::Write};

use anyhow::Context as _;
use casebook_core::{
  field::FieldType,
  model::{CaseFilter, CaseStatus, TokenId},
  pagination::Cursor,
  store::{CaseMessageStore, CaseStore, KnowledgeStore, Repository, SlackUserStore},
};
use chrono::{TimeDelta, Utc};
use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
  /// List the cases of a workspace.
  Cases {
    workspace: String,
    /// Only cases with this status (`open` or `closed`).
    #[arg(long)]
    status:    Option<CaseStatus>,
  },

  /// Page through a workspace's knowledge, newest first.
  Knowledge {
    workspace: String,
    #[arg(long, default_value_t = 20)]
    limit:     usize,
    /// Cursor printed by the previous page.
    #[arg(long)]
    cursor:    Option<Cursor>,
  },

  /// Count values stored for a custom field and report the first invalid
  /// case.
  FieldAudit {
    workspace:  String,
    field_id:   String,
    /// `text`, `number`, `select`, `multi-select`, `url` or `date`.
    field_type: FieldType,
    /// Allowed option IDs for select fields, comma separated.
    #[arg(long, value_delimiter = ',')]
    options:    Vec<String>,
  },

  /// Delete a case's mirrored Slack messages older than the given age.
  PruneMessages {
    workspace:       String,
    case_id:         i64,
    #[arg(long, default_value_t = 30)]
    older_than_days: i64,
  },

  /// Delete an issued access token.
  RevokeToken { token_id: String },

  /// Show the state of the Slack user cache.
  SlackUsers,
}

/// Run `command` against `repo`, writing a human-readable report to `out`.
pub async fn run<R: Repository>(
  repo: &R,
  command: Command,
  out: &mut impl Write,
) -> anyhow::Result<()> {
  match command {
    Command::Cases { workspace, status } => {
      let cases = repo
        .case()
        .list(&workspace, CaseFilter { status })
        .await
        .context("failed to list cases")?;
      for case in &cases {
        writeln!(out, "{:>6}  {:<6}  {}", case.id, case.status, case.title)?;
      }
      writeln!(out, "{} case(s)", cases.len())?;
    }

    Command::Knowledge { workspace, limit, cursor } => {
      let page = repo
        .knowledge()
        .list_paged(&workspace, limit, cursor.as_ref())
        .await
        .context("failed to list knowledge")?;
      for entry in &page.items {
        writeln!(out, "{}  case {:>4}  {}", entry.id, entry.case_id, entry.title)?;
      }
      match page.next_cursor {
        Some(next) => writeln!(out, "next cursor: {next}")?,
        None => writeln!(out, "end of results")?,
      }
    }

    Command::FieldAudit { workspace, field_id, field_type, options } => {
      let options: HashSet<String> = options.into_iter().collect();
      let options = (!options.is_empty()).then_some(&options);

      let counts = repo
        .case()
        .count_field_values(&workspace, &field_id, field_type, options)
        .await
        .context("failed to count field values")?;
      writeln!(out, "{field_id} ({field_type}): {} total, {} valid", counts.total, counts.valid)?;

      let invalid = repo
        .case()
        .find_case_with_invalid_field_value(&workspace, &field_id, field_type, options)
        .await
        .context("failed to look for invalid field values")?;
      match invalid {
        Some(case) => writeln!(out, "first invalid: case {} ({})", case.id, case.title)?,
        None => writeln!(out, "all values valid")?,
      }
    }

    Command::PruneMessages { workspace, case_id, older_than_days } => {
      let before = Utc::now() - TimeDelta::days(older_than_days);
      let removed = repo
        .case_message()
        .prune(&workspace, case_id, before)
        .await
        .context("failed to prune case messages")?;
      tracing::info!(workspace, case_id, removed, %before, "pruned case messages");
      writeln!(out, "removed {removed} message(s)")?;
    }

    Command::RevokeToken { token_id } => {
      repo
        .delete_token(&TokenId::new(token_id.clone()))
        .await
        .with_context(|| format!("failed to revoke token {token_id}"))?;
      tracing::info!(token_id, "revoked token");
      writeln!(out, "revoked {token_id}")?;
    }

    Command::SlackUsers => {
      let users = repo.slack_user();
      let meta = users.get_metadata().await.context("failed to read cache metadata")?;
      let cached = users.get_all().await.context("failed to read cached users")?.len();

      let fmt = |t: Option<chrono::DateTime<Utc>>| {
        t.map_or_else(|| "never".to_owned(), |t| t.to_rfc3339())
      };
      writeln!(out, "cached users:        {cached}")?;
      writeln!(out, "reported user count: {}", meta.user_count)?;
      writeln!(out, "last refresh:        {}", fmt(meta.last_refresh_success))?;
      writeln!(out, "last attempt:        {}", fmt(meta.last_refresh_attempt))?;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use casebook_core::{
    field::{FieldValue, Value},
    model::{Case, CaseMessage, Knowledge, SlackUser, SlackUserMetadata, Token},
  };
  use casebook_store_memory::InMemoryStore;

  use super::*;

  async fn run_to_string(repo: &InMemoryStore, command: Command) -> String {
    let mut out = Vec::new();
    run(repo, command, &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
  }

  #[tokio::test]
  async fn cases_lists_matching_status() {
    let repo = InMemoryStore::new();
    repo.case().create("ws", Case::new("phishing wave", "")).await.unwrap();
    let mut closed = repo.case().create("ws", Case::new("old leak", "")).await.unwrap();
    closed.status = CaseStatus::Closed;
    repo.case().update("ws", closed).await.unwrap();

    let out = run_to_string(&repo, Command::Cases {
      workspace: "ws".into(),
      status:    Some(CaseStatus::Open),
    })
    .await;
    assert!(out.contains("phishing wave"));
    assert!(!out.contains("old leak"));
    assert!(out.ends_with("1 case(s)\n"));
  }

  #[tokio::test]
  async fn field_audit_reports_counts_and_offender() {
    let repo = InMemoryStore::new();
    for choice in ["high", "medium", "invalid-opt"] {
      let mut case = Case::new(format!("sev {choice}"), "");
      case.set_field(FieldValue::new("severity", Value::Select(choice.into())));
      repo.case().create("ws", case).await.unwrap();
    }

    let out = run_to_string(&repo, Command::FieldAudit {
      workspace:  "ws".into(),
      field_id:   "severity".into(),
      field_type: FieldType::Select,
      options:    vec!["high".into(), "medium".into(), "low".into()],
    })
    .await;
    assert!(out.contains("3 total, 2 valid"), "{out}");
    assert!(out.contains("first invalid: case 3 (sev invalid-opt)"), "{out}");
  }

  #[tokio::test]
  async fn knowledge_prints_next_cursor() {
    let repo = InMemoryStore::new();
    for i in 0..3 {
      repo
        .knowledge()
        .create("ws", Knowledge { title: format!("k{i}"), ..Default::default() })
        .await
        .unwrap();
    }

    let out = run_to_string(&repo, Command::Knowledge {
      workspace: "ws".into(),
      limit:     2,
      cursor:    None,
    })
    .await;
    let cursor: Cursor = out
      .lines()
      .find_map(|l| l.strip_prefix("next cursor: "))
      .unwrap()
      .parse()
      .unwrap();

    let rest = run_to_string(&repo, Command::Knowledge {
      workspace: "ws".into(),
      limit:     2,
      cursor:    Some(cursor),
    })
    .await;
    assert_eq!(rest.lines().count(), 2);
    assert!(rest.ends_with("end of results\n"));
  }

  #[tokio::test]
  async fn prune_messages_removes_old_entries() {
    let repo = InMemoryStore::new();
    for (id, age_days) in [("1.0", 40), ("2.0", 35), ("3.0", 1)] {
      repo
        .case_message()
        .put("ws", CaseMessage {
          id: id.into(),
          case_id: 1,
          created_at: Utc::now() - TimeDelta::days(age_days),
          ..Default::default()
        })
        .await
        .unwrap();
    }

    let out = run_to_string(&repo, Command::PruneMessages {
      workspace:       "ws".into(),
      case_id:         1,
      older_than_days: 30,
    })
    .await;
    assert_eq!(out, "removed 2 message(s)\n");
  }

  #[tokio::test]
  async fn revoke_token_deletes_and_reports_missing() {
    let repo = InMemoryStore::new();
    let token = repo.put_token(Token::new("U1", "a@example.com", "A")).await.unwrap();

    let out = run_to_string(&repo, Command::RevokeToken { token_id: token.id.to_string() }).await;
    assert!(out.starts_with("revoked"));
    assert!(repo.get_token(&token.id).await.unwrap_err().is_not_found());

    let mut sink = Vec::new();
    let err = run(&repo, Command::RevokeToken { token_id: token.id.to_string() }, &mut sink)
      .await
      .unwrap_err();
    let core = err.downcast_ref::<casebook_core::Error>().unwrap();
    assert!(core.is_not_found());
  }

  #[tokio::test]
  async fn slack_users_reports_cache_state() {
    let repo = InMemoryStore::new();
    let out = run_to_string(&repo, Command::SlackUsers).await;
    assert!(out.contains("cached users:        0"));
    assert!(out.contains("last refresh:        never"));

    repo
      .slack_user()
      .save_many(vec![SlackUser { id: "U1".into(), ..Default::default() }])
      .await
      .unwrap();
    repo
      .slack_user()
      .save_metadata(SlackUserMetadata {
        last_refresh_success: Some(Utc::now()),
        last_refresh_attempt: Some(Utc::now()),
        user_count:           1,
      })
      .await
      .unwrap();

    let out = run_to_string(&repo, Command::SlackUsers).await;
    assert!(out.contains("cached users:        1"));
    assert!(!out.contains("never"));
  }
}
