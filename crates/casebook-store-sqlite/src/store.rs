//! [`SqliteStore`]: the document-store implementation of [`Repository`].

use std::path::Path;

use casebook_core::{
  Error as CoreError,
  model::{Token, TokenId},
  record::EntityKind,
  store::Repository,
};

use crate::{
  Result,
  cases::{Actions, Cases},
  content::{KnowledgeBase, Memories, Sources},
  docstore::DocStore,
  encode::{decode, encode},
  risks::{Responses, RiskResponses, Risks},
  slack::SlackUsers,
  timeline::{AssistLogs, CaseMessages},
};

const TOKENS: &str = "tokens";

/// A Casebook repository backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  db:             DocStore,
  cases:          Cases,
  actions:        Actions,
  knowledge:      KnowledgeBase,
  memories:       Memories,
  sources:        Sources,
  slack_users:    SlackUsers,
  case_messages:  CaseMessages,
  assist_logs:    AssistLogs,
  responses:      Responses,
  risks:          Risks,
  risk_responses: RiskResponses,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with_prefix(path, "").await
  }

  /// Open a store whose collection names all start with `prefix`, so several
  /// deployments (or test runs) can share one database file.
  pub async fn open_with_prefix(path: impl AsRef<Path>, prefix: &str) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self::from_db(DocStore::new(conn, prefix).await?))
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self::from_db(DocStore::new(conn, "").await?))
  }

  fn from_db(db: DocStore) -> Self {
    Self {
      cases:          Cases::new(db.clone()),
      actions:        Actions::new(db.clone()),
      knowledge:      KnowledgeBase::new(db.clone()),
      memories:       Memories::new(db.clone()),
      sources:        Sources::new(db.clone()),
      slack_users:    SlackUsers::new(db.clone()),
      case_messages:  CaseMessages::new(db.clone()),
      assist_logs:    AssistLogs::new(db.clone()),
      responses:      Responses::new(db.clone()),
      risks:          Risks::new(db.clone()),
      risk_responses: RiskResponses::new(db.clone()),
      db,
    }
  }
}

impl Repository for SqliteStore {
  type Cases = Cases;
  type Actions = Actions;
  type Knowledge = KnowledgeBase;
  type Memories = Memories;
  type Sources = Sources;
  type SlackUsers = SlackUsers;
  type CaseMessages = CaseMessages;
  type AssistLogs = AssistLogs;
  type Responses = Responses;
  type Risks = Risks;
  type RiskResponses = RiskResponses;

  fn case(&self) -> &Cases { &self.cases }
  fn action(&self) -> &Actions { &self.actions }
  fn knowledge(&self) -> &KnowledgeBase { &self.knowledge }
  fn memory(&self) -> &Memories { &self.memories }
  fn source(&self) -> &Sources { &self.sources }
  fn slack_user(&self) -> &SlackUsers { &self.slack_users }
  fn case_message(&self) -> &CaseMessages { &self.case_messages }
  fn assist_log(&self) -> &AssistLogs { &self.assist_logs }
  fn response(&self) -> &Responses { &self.responses }
  fn risk(&self) -> &Risks { &self.risks }
  fn risk_response(&self) -> &RiskResponses { &self.risk_responses }

  async fn put_token(&self, token: Token) -> casebook_core::Result<Token> {
    token.validate()?;
    let body = encode(&token)?;
    self.db.upsert(self.db.global(TOKENS), token.id.to_string(), body).await?;
    Ok(token)
  }

  async fn get_token(&self, id: &TokenId) -> casebook_core::Result<Token> {
    let collection = self.db.global(TOKENS);
    match self.db.get_body(collection.clone(), id.to_string()).await? {
      Some(body) => Ok(decode(&collection, &body)?),
      None => Err(CoreError::global_not_found(EntityKind::Token, id)),
    }
  }

  async fn delete_token(&self, id: &TokenId) -> casebook_core::Result<()> {
    if !self.db.delete(self.db.global(TOKENS), id.to_string()).await? {
      return Err(CoreError::global_not_found(EntityKind::Token, id));
    }
    Ok(())
  }
}
