//! Store traits and the [`Repository`] facade.
//!
//! The traits are implemented by storage backends (`casebook-store-memory`,
//! `casebook-store-sqlite`). Transport layers (GraphQL resolvers, Slack
//! handlers) depend on this abstraction, never on a concrete backend.
//!
//! Conventions shared by every store:
//!
//! - Every workspace-scoped method takes the workspace ID first. A workspace
//!   that has never been written behaves as an empty one for reads; writes
//!   create it implicitly.
//! - `create` discards caller timestamps and assigns the ID; `update` keeps
//!   `created_at`, advances `updated_at`, and fails with
//!   [`Error::NotFound`](crate::Error::NotFound) for an unknown ID, as do
//!   `get` and `delete`.
//! - Values cross the boundary by ownership. Returned values are independent
//!   copies.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes.

use std::{
  collections::{HashMap, HashSet},
  future::Future,
};

use chrono::{DateTime, Utc};

use crate::{
  Result,
  field::{FieldType, FieldValueCount},
  model::{
    Action, AssistLog, Case, CaseFilter, CaseMessage, Knowledge, Memory, Response,
    Risk, SlackUser, SlackUserMetadata, Source, Token, TokenId,
  },
  pagination::{Cursor, Page},
};

// ─── Cases ───────────────────────────────────────────────────────────────────

pub trait CaseStore: Send + Sync {
  fn create(&self, workspace: &str, case: Case) -> impl Future<Output = Result<Case>> + Send;

  fn get(&self, workspace: &str, id: i64) -> impl Future<Output = Result<Case>> + Send;

  fn update(&self, workspace: &str, case: Case) -> impl Future<Output = Result<Case>> + Send;

  /// Delete a case, then every action, knowledge entry, and memory whose
  /// `case_id` matches. The cascade is not atomic with the case removal.
  fn delete(&self, workspace: &str, id: i64) -> impl Future<Output = Result<()>> + Send;

  /// Cases matching `filter`, ordered by ID.
  fn list(
    &self,
    workspace: &str,
    filter: CaseFilter,
  ) -> impl Future<Output = Result<Vec<Case>>> + Send;

  fn get_by_slack_channel_id(
    &self,
    workspace: &str,
    channel_id: &str,
  ) -> impl Future<Output = Result<Option<Case>>> + Send;

  /// See [`crate::field::count_field_values`].
  fn count_field_values(
    &self,
    workspace: &str,
    field_id: &str,
    field_type: FieldType,
    options: Option<&HashSet<String>>,
  ) -> impl Future<Output = Result<FieldValueCount>> + Send;

  /// Some case holding an invalid value for `field_id`, or `None` when all
  /// values of that type are valid. Both backends return the lowest ID.
  fn find_case_with_invalid_field_value(
    &self,
    workspace: &str,
    field_id: &str,
    field_type: FieldType,
    options: Option<&HashSet<String>>,
  ) -> impl Future<Output = Result<Option<Case>>> + Send;
}

// ─── Actions ─────────────────────────────────────────────────────────────────

pub trait ActionStore: Send + Sync {
  fn create(&self, workspace: &str, action: Action) -> impl Future<Output = Result<Action>> + Send;

  fn get(&self, workspace: &str, id: i64) -> impl Future<Output = Result<Action>> + Send;

  fn update(&self, workspace: &str, action: Action) -> impl Future<Output = Result<Action>> + Send;

  fn delete(&self, workspace: &str, id: i64) -> impl Future<Output = Result<()>> + Send;

  /// All actions in the workspace, ordered by ID.
  fn list(&self, workspace: &str) -> impl Future<Output = Result<Vec<Action>>> + Send;

  fn get_by_case(
    &self,
    workspace: &str,
    case_id: i64,
  ) -> impl Future<Output = Result<Vec<Action>>> + Send;

  /// Actions grouped by case. Every requested case ID is present in the
  /// result, with an empty list when it has no actions.
  fn get_by_cases(
    &self,
    workspace: &str,
    case_ids: &[i64],
  ) -> impl Future<Output = Result<HashMap<i64, Vec<Action>>>> + Send;

  fn get_by_slack_message_ts(
    &self,
    workspace: &str,
    ts: &str,
  ) -> impl Future<Output = Result<Option<Action>>> + Send;
}

// ─── Knowledge ───────────────────────────────────────────────────────────────

pub trait KnowledgeStore: Send + Sync {
  fn create(
    &self,
    workspace: &str,
    knowledge: Knowledge,
  ) -> impl Future<Output = Result<Knowledge>> + Send;

  fn get(&self, workspace: &str, id: &str) -> impl Future<Output = Result<Knowledge>> + Send;

  fn update(
    &self,
    workspace: &str,
    knowledge: Knowledge,
  ) -> impl Future<Output = Result<Knowledge>> + Send;

  fn delete(&self, workspace: &str, id: &str) -> impl Future<Output = Result<()>> + Send;

  /// Newest first.
  fn get_by_case(
    &self,
    workspace: &str,
    case_id: i64,
  ) -> impl Future<Output = Result<Vec<Knowledge>>> + Send;

  /// Newest first within each case; every requested case ID is present.
  fn get_by_cases(
    &self,
    workspace: &str,
    case_ids: &[i64],
  ) -> impl Future<Output = Result<HashMap<i64, Vec<Knowledge>>>> + Send;

  /// The `limit` entries most similar to `query`, across the workspace.
  fn find_by_embedding(
    &self,
    workspace: &str,
    query: &[f32],
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Knowledge>>> + Send;

  fn list_paged(
    &self,
    workspace: &str,
    limit: usize,
    cursor: Option<&Cursor>,
  ) -> impl Future<Output = Result<Page<Knowledge>>> + Send;
}

// ─── Memories ────────────────────────────────────────────────────────────────

pub trait MemoryStore: Send + Sync {
  fn create(&self, workspace: &str, memory: Memory) -> impl Future<Output = Result<Memory>> + Send;

  fn get(&self, workspace: &str, id: &str) -> impl Future<Output = Result<Memory>> + Send;

  fn update(&self, workspace: &str, memory: Memory) -> impl Future<Output = Result<Memory>> + Send;

  fn delete(&self, workspace: &str, id: &str) -> impl Future<Output = Result<()>> + Send;

  /// Newest first.
  fn get_by_case(
    &self,
    workspace: &str,
    case_id: i64,
  ) -> impl Future<Output = Result<Vec<Memory>>> + Send;

  /// The `limit` memories of `case_id` most similar to `query`.
  fn find_by_embedding(
    &self,
    workspace: &str,
    case_id: i64,
    query: &[f32],
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Memory>>> + Send;
}

// ─── Sources ─────────────────────────────────────────────────────────────────

pub trait SourceStore: Send + Sync {
  fn create(&self, workspace: &str, source: Source) -> impl Future<Output = Result<Source>> + Send;

  fn get(&self, workspace: &str, id: &str) -> impl Future<Output = Result<Source>> + Send;

  fn update(&self, workspace: &str, source: Source) -> impl Future<Output = Result<Source>> + Send;

  fn delete(&self, workspace: &str, id: &str) -> impl Future<Output = Result<()>> + Send;

  /// Newest first.
  fn list(&self, workspace: &str) -> impl Future<Output = Result<Vec<Source>>> + Send;
}

// ─── Slack users ─────────────────────────────────────────────────────────────

/// Installation-wide Slack user cache; not scoped by workspace.
pub trait SlackUserStore: Send + Sync {
  /// Ordered by user ID.
  fn get_all(&self) -> impl Future<Output = Result<Vec<SlackUser>>> + Send;

  fn get_by_id(&self, id: &str) -> impl Future<Output = Result<SlackUser>> + Send;

  /// Users found among `ids`, keyed by ID. Unknown IDs are skipped.
  fn get_by_ids(
    &self,
    ids: &[String],
  ) -> impl Future<Output = Result<HashMap<String, SlackUser>>> + Send;

  /// Upsert every user; either all are written or the call fails.
  fn save_many(&self, users: Vec<SlackUser>) -> impl Future<Output = Result<()>> + Send;

  fn delete_all(&self) -> impl Future<Output = Result<()>> + Send;

  /// Defaults when no refresh has ever been recorded.
  fn get_metadata(&self) -> impl Future<Output = Result<SlackUserMetadata>> + Send;

  fn save_metadata(
    &self,
    metadata: SlackUserMetadata,
  ) -> impl Future<Output = Result<()>> + Send;
}

// ─── Case messages ───────────────────────────────────────────────────────────

pub trait CaseMessageStore: Send + Sync {
  /// Insert or replace the message with `message.id` in its case timeline.
  fn put(
    &self,
    workspace: &str,
    message: CaseMessage,
  ) -> impl Future<Output = Result<CaseMessage>> + Send;

  /// Newest-first page of one case's timeline.
  fn list(
    &self,
    workspace: &str,
    case_id: i64,
    limit: usize,
    cursor: Option<&Cursor>,
  ) -> impl Future<Output = Result<Page<CaseMessage>>> + Send;

  /// Remove messages of `case_id` posted before `before`; returns how many
  /// were removed.
  fn prune(
    &self,
    workspace: &str,
    case_id: i64,
    before: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize>> + Send;
}

// ─── Assist logs ─────────────────────────────────────────────────────────────

pub trait AssistLogStore: Send + Sync {
  fn create(&self, workspace: &str, log: AssistLog) -> impl Future<Output = Result<AssistLog>> + Send;

  /// Newest-first page of one case's logs.
  fn list(
    &self,
    workspace: &str,
    case_id: i64,
    limit: usize,
    cursor: Option<&Cursor>,
  ) -> impl Future<Output = Result<Page<AssistLog>>> + Send;
}

// ─── Responses and risks ─────────────────────────────────────────────────────

pub trait ResponseStore: Send + Sync {
  fn create(&self, workspace: &str, response: Response) -> impl Future<Output = Result<Response>> + Send;

  fn get(&self, workspace: &str, id: i64) -> impl Future<Output = Result<Response>> + Send;

  fn update(&self, workspace: &str, response: Response) -> impl Future<Output = Result<Response>> + Send;

  /// Does not touch links; callers follow up with
  /// [`RiskResponseStore::delete_by_response`].
  fn delete(&self, workspace: &str, id: i64) -> impl Future<Output = Result<()>> + Send;

  /// Ordered by ID.
  fn list(&self, workspace: &str) -> impl Future<Output = Result<Vec<Response>>> + Send;
}

pub trait RiskStore: Send + Sync {
  fn create(&self, workspace: &str, risk: Risk) -> impl Future<Output = Result<Risk>> + Send;

  fn get(&self, workspace: &str, id: i64) -> impl Future<Output = Result<Risk>> + Send;

  fn update(&self, workspace: &str, risk: Risk) -> impl Future<Output = Result<Risk>> + Send;

  /// Does not touch links; callers follow up with
  /// [`RiskResponseStore::delete_by_risk`].
  fn delete(&self, workspace: &str, id: i64) -> impl Future<Output = Result<()>> + Send;

  /// Ordered by ID.
  fn list(&self, workspace: &str) -> impl Future<Output = Result<Vec<Risk>>> + Send;
}

/// The risk ↔ response join table.
///
/// Referential integrity is checked when linking only. Lookups skip links
/// whose target has since been deleted. Results follow link creation order.
pub trait RiskResponseStore: Send + Sync {
  /// Link a pair. Linking an already linked pair is a no-op. Fails with
  /// `NotFound` naming the risk or response that does not exist.
  fn link(
    &self,
    workspace: &str,
    risk_id: i64,
    response_id: i64,
  ) -> impl Future<Output = Result<()>> + Send;

  fn unlink(
    &self,
    workspace: &str,
    risk_id: i64,
    response_id: i64,
  ) -> impl Future<Output = Result<()>> + Send;

  fn get_responses_by_risk(
    &self,
    workspace: &str,
    risk_id: i64,
  ) -> impl Future<Output = Result<Vec<Response>>> + Send;

  /// Every requested risk ID is present in the result.
  fn get_responses_by_risks(
    &self,
    workspace: &str,
    risk_ids: &[i64],
  ) -> impl Future<Output = Result<HashMap<i64, Vec<Response>>>> + Send;

  fn get_risks_by_response(
    &self,
    workspace: &str,
    response_id: i64,
  ) -> impl Future<Output = Result<Vec<Risk>>> + Send;

  /// Every requested response ID is present in the result.
  fn get_risks_by_responses(
    &self,
    workspace: &str,
    response_ids: &[i64],
  ) -> impl Future<Output = Result<HashMap<i64, Vec<Risk>>>> + Send;

  fn delete_by_risk(&self, workspace: &str, risk_id: i64) -> impl Future<Output = Result<()>> + Send;

  fn delete_by_response(
    &self,
    workspace: &str,
    response_id: i64,
  ) -> impl Future<Output = Result<()>> + Send;
}

// ─── Facade ──────────────────────────────────────────────────────────────────

/// One accessor per entity kind, plus session tokens.
pub trait Repository: Send + Sync {
  type Cases: CaseStore;
  type Actions: ActionStore;
  type Knowledge: KnowledgeStore;
  type Memories: MemoryStore;
  type Sources: SourceStore;
  type SlackUsers: SlackUserStore;
  type CaseMessages: CaseMessageStore;
  type AssistLogs: AssistLogStore;
  type Responses: ResponseStore;
  type Risks: RiskStore;
  type RiskResponses: RiskResponseStore;

  fn case(&self) -> &Self::Cases;
  fn action(&self) -> &Self::Actions;
  fn knowledge(&self) -> &Self::Knowledge;
  fn memory(&self) -> &Self::Memories;
  fn source(&self) -> &Self::Sources;
  fn slack_user(&self) -> &Self::SlackUsers;
  fn case_message(&self) -> &Self::CaseMessages;
  fn assist_log(&self) -> &Self::AssistLogs;
  fn response(&self) -> &Self::Responses;
  fn risk(&self) -> &Self::Risks;
  fn risk_response(&self) -> &Self::RiskResponses;

  /// Validate and store a token, replacing any token with the same ID.
  fn put_token(&self, token: Token) -> impl Future<Output = Result<Token>> + Send;

  fn get_token(&self, id: &TokenId) -> impl Future<Output = Result<Token>> + Send;

  fn delete_token(&self, id: &TokenId) -> impl Future<Output = Result<()>> + Send;
}
