//! [`InMemoryStore`]: the in-process implementation of [`Repository`].

use std::{
  collections::{BTreeMap, HashMap},
  sync::Arc,
};

use casebook_core::{
  Error, Result,
  model::{
    Action, AssistLog, Case, CaseMessage, Knowledge, Memory, Response, Risk,
    RiskResponseLink, SlackUser, SlackUserMetadata, Source, Token, TokenId,
  },
  record::EntityKind,
  store::Repository,
};
use tokio::sync::RwLock;

use crate::{
  cases::{Actions, Cases},
  content::{KnowledgeBase, Memories, Sources},
  risks::{Responses, RiskResponses, Risks},
  slack::SlackUsers,
  table::Table,
  timeline::{AssistLogs, CaseMessages},
};

/// Case messages keyed by `(workspace, case_id)`, then by message ID.
pub(crate) type MessageMap = HashMap<(String, i64), HashMap<String, CaseMessage>>;

/// Every table, each with its own lock. Store handles share this through an
/// `Arc` and only ever lock one table at a time.
#[derive(Default)]
pub(crate) struct Tables {
  pub cases:         Table<Case>,
  pub actions:       Table<Action>,
  pub knowledge:     Table<Knowledge>,
  pub memories:      Table<Memory>,
  pub sources:       Table<Source>,
  pub assist_logs:   Table<AssistLog>,
  pub responses:     Table<Response>,
  pub risks:         Table<Risk>,
  pub case_messages: RwLock<MessageMap>,
  /// Links per workspace, in creation order.
  pub links:         RwLock<HashMap<String, Vec<RiskResponseLink>>>,
  pub slack_users:   RwLock<BTreeMap<String, SlackUser>>,
  pub slack_meta:    RwLock<Option<SlackUserMetadata>>,
  pub tokens:        RwLock<HashMap<TokenId, Token>>,
}

/// A repository held entirely in process memory.
///
/// Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct InMemoryStore {
  tables:         Arc<Tables>,
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

impl Default for InMemoryStore {
  fn default() -> Self { Self::new() }
}

impl InMemoryStore {
  pub fn new() -> Self {
    let tables = Arc::new(Tables::default());
    Self {
      cases:          Cases::new(tables.clone()),
      actions:        Actions::new(tables.clone()),
      knowledge:      KnowledgeBase::new(tables.clone()),
      memories:       Memories::new(tables.clone()),
      sources:        Sources::new(tables.clone()),
      slack_users:    SlackUsers::new(tables.clone()),
      case_messages:  CaseMessages::new(tables.clone()),
      assist_logs:    AssistLogs::new(tables.clone()),
      responses:      Responses::new(tables.clone()),
      risks:          Risks::new(tables.clone()),
      risk_responses: RiskResponses::new(tables.clone()),
      tables,
    }
  }
}

impl Repository for InMemoryStore {
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

  async fn put_token(&self, token: Token) -> Result<Token> {
    token.validate()?;
    let mut tokens = self.tables.tokens.write().await;
    tokens.insert(token.id.clone(), token.clone());
    Ok(token)
  }

  async fn get_token(&self, id: &TokenId) -> Result<Token> {
    let tokens = self.tables.tokens.read().await;
    tokens
      .get(id)
      .cloned()
      .ok_or_else(|| Error::global_not_found(EntityKind::Token, id))
  }

  async fn delete_token(&self, id: &TokenId) -> Result<()> {
    let mut tokens = self.tables.tokens.write().await;
    tokens
      .remove(id)
      .map(|_| ())
      .ok_or_else(|| Error::global_not_found(EntityKind::Token, id))
  }
}
