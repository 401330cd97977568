//! Behavioural checks every [`Repository`] backend must pass.
//!
//! Each check takes a freshly opened, empty repository and panics on the
//! first violation. Backends run the whole set from their own test modules
//! with [`conformance_suite!`](crate::conformance_suite):
//!
//! ```rust,ignore
//! casebook_core::conformance_suite!(InMemoryStore::new());
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
  Error,
  field::{FieldType, FieldValue, FieldValueCount, Value},
  model::{
    Action, ActionStatus, AssistLog, Case, CaseFilter, CaseMessage, CaseStatus,
    Knowledge, Memory, NotionPageConfig, Response, Risk, SlackChannel, SlackConfig,
    SlackUser, SlackUserMetadata, Source, SourceConfig, SourceType, Token, TokenId,
  },
  pagination::{self, Cursor},
  record::EntityKind,
  store::{
    ActionStore, AssistLogStore, CaseMessageStore, CaseStore, KnowledgeStore,
    MemoryStore, Repository, ResponseStore, RiskResponseStore, RiskStore,
    SlackUserStore, SourceStore,
  },
};

const WS: &str = "ws1";
const OTHER_WS: &str = "ws2";

/// Generate one `#[tokio::test]` per named check, each against a fresh
/// repository produced by `$make` (which may `.await`).
#[macro_export]
macro_rules! conformance_tests {
  ($make:expr; $($name:ident),* $(,)?) => {
    $(
      #[tokio::test]
      async fn $name() {
        let repo = $make;
        $crate::conformance::$name(&repo).await;
      }
    )*
  };
}

/// Every check in this module.
#[macro_export]
macro_rules! conformance_suite {
  ($make:expr) => {
    $crate::conformance_tests!($make;
      case_round_trip,
      sequential_ids_are_per_workspace,
      workspaces_are_isolated,
      unknown_workspace_reads_as_empty,
      update_preserves_created_at,
      update_missing_is_not_found,
      returned_values_are_independent_copies,
      case_list_filters_by_status,
      case_lookup_by_slack_channel,
      case_scenario,
      case_delete_cascades,
      action_queries,
      opaque_ids_are_generated_or_preserved,
      knowledge_pagination_is_complete,
      knowledge_stale_cursor_restarts,
      knowledge_ranked_by_cosine_similarity,
      memory_search_is_scoped_to_case,
      knowledge_grouped_by_case,
      field_value_counts,
      non_finite_values_are_rejected,
      mismatched_field_key_is_rejected,
      source_crud,
      slack_user_cache,
      case_message_timeline,
      assist_log_pages,
      risk_response_links,
      broken_links_are_skipped,
      token_lifecycle,
    );
  };
}

fn assert_not_found(err: Error, expected: EntityKind) {
  match err {
    Error::NotFound { kind, .. } => assert_eq!(kind, expected, "wrong kind in NotFound"),
    other => panic!("expected NotFound({expected}), got {other:?}"),
  }
}

fn epoch() -> DateTime<Utc> { DateTime::<Utc>::UNIX_EPOCH }

fn options(items: &[&str]) -> HashSet<String> {
  items.iter().map(|s| (*s).to_owned()).collect()
}

fn sample_case(title: &str) -> Case {
  let mut case = Case::new(title, format!("{title} description"));
  case.assignee_ids = vec!["U1".into(), "U2".into()];
  case.slack_channel_id = Some(format!("C-{title}"));
  case.set_field(FieldValue::new("severity", Value::Select("high".into())));
  case.set_field(FieldValue::new(
    "category",
    Value::MultiSelect(vec!["network".into(), "malware".into()]),
  ));
  case
}

fn knowledge(case_id: i64, title: &str, embedding: Vec<f32>) -> Knowledge {
  Knowledge {
    case_id,
    source_id: "src-1".into(),
    source_urls: vec![format!("https://example.com/{title}")],
    title: title.into(),
    summary: format!("{title} summary"),
    embedding,
    ..Default::default()
  }
}

// ─── Identity and lifecycle ──────────────────────────────────────────────────

pub async fn case_round_trip<R: Repository>(repo: &R) {
  let mut input = sample_case("C1");
  input.id = 99;
  input.created_at = epoch();
  input.updated_at = epoch();

  let created = repo.case().create(WS, input.clone()).await.unwrap();
  assert_eq!(created.id, 1, "caller-supplied ID must be ignored");
  assert!(created.created_at > epoch());
  assert_eq!(created.created_at, created.updated_at);

  let fetched = repo.case().get(WS, created.id).await.unwrap();
  assert_eq!(fetched, created);

  let mut expected = input;
  expected.id = fetched.id;
  expected.created_at = fetched.created_at;
  expected.updated_at = fetched.updated_at;
  assert_eq!(fetched, expected);
}

pub async fn sequential_ids_are_per_workspace<R: Repository>(repo: &R) {
  let a = repo.case().create(WS, Case::new("a", "")).await.unwrap();
  let b = repo.case().create(WS, Case::new("b", "")).await.unwrap();
  let c = repo.case().create(OTHER_WS, Case::new("c", "")).await.unwrap();
  assert_eq!((a.id, b.id, c.id), (1, 2, 1));

  let r1 = repo.risk().create(WS, Risk::default()).await.unwrap();
  let p1 = repo.response().create(WS, Response::default()).await.unwrap();
  let x1 = repo.action().create(WS, Action::new(a.id, "x")).await.unwrap();
  assert_eq!((r1.id, p1.id, x1.id), (1, 1, 1), "each kind has its own counter");

  // Deleting the highest ID never hands it out again.
  repo.case().delete(WS, b.id).await.unwrap();
  let d = repo.case().create(WS, Case::new("d", "")).await.unwrap();
  assert_eq!(d.id, 3);
}

pub async fn workspaces_are_isolated<R: Repository>(repo: &R) {
  let case = repo.case().create(WS, Case::new("only in ws1", "")).await.unwrap();
  let k = repo.knowledge().create(WS, knowledge(case.id, "k", vec![])).await.unwrap();

  let err = repo.knowledge().get(OTHER_WS, &k.id).await.unwrap_err();
  assert_not_found(err, EntityKind::Knowledge);

  repo.case().create(OTHER_WS, Case::new("ws2 case", "")).await.unwrap();
  let ws2 = repo.case().list(OTHER_WS, CaseFilter::default()).await.unwrap();
  assert_eq!(ws2.len(), 1);
  assert_eq!(ws2[0].title, "ws2 case");
}

pub async fn unknown_workspace_reads_as_empty<R: Repository>(repo: &R) {
  let ws = "never-written";
  assert_not_found(repo.case().get(ws, 1).await.unwrap_err(), EntityKind::Case);
  assert_not_found(repo.case().delete(ws, 1).await.unwrap_err(), EntityKind::Case);
  assert_not_found(repo.memory().get(ws, "m").await.unwrap_err(), EntityKind::Memory);
  assert!(repo.case().list(ws, CaseFilter::default()).await.unwrap().is_empty());
  assert!(repo.action().list(ws).await.unwrap().is_empty());
  assert!(repo.source().list(ws).await.unwrap().is_empty());
  assert!(repo.knowledge().find_by_embedding(ws, &[1.0], 5).await.unwrap().is_empty());

  let page = repo.knowledge().list_paged(ws, 10, None).await.unwrap();
  assert!(page.items.is_empty());
  assert!(page.next_cursor.is_none());

  let counts = repo
    .case()
    .count_field_values(ws, "severity", FieldType::Select, None)
    .await
    .unwrap();
  assert_eq!(counts, FieldValueCount::default());
}

pub async fn update_preserves_created_at<R: Repository>(repo: &R) {
  let created = repo.case().create(WS, sample_case("C")).await.unwrap();

  let mut edit = created.clone();
  edit.title = "renamed".into();
  edit.status = CaseStatus::Closed;
  edit.created_at = epoch();
  let first = repo.case().update(WS, edit.clone()).await.unwrap();
  let second = repo.case().update(WS, edit).await.unwrap();

  assert_eq!(first.created_at, created.created_at);
  assert!(first.updated_at > created.updated_at);
  assert!(second.updated_at > first.updated_at, "updated_at must move strictly forward");

  let fetched = repo.case().get(WS, created.id).await.unwrap();
  assert_eq!(fetched.title, "renamed");
  assert_eq!(fetched.status, CaseStatus::Closed);
  assert_eq!(fetched.created_at, created.created_at);
  assert_eq!(fetched.updated_at, second.updated_at);

  let m = repo.memory().create(WS, Memory::new(created.id, "claim", vec![])).await.unwrap();
  let mut m_edit = m.clone();
  m_edit.claim = "revised".into();
  let m_updated = repo.memory().update(WS, m_edit).await.unwrap();
  assert_eq!(m_updated.created_at, m.created_at);
  assert!(m_updated.updated_at > m.updated_at);
}

pub async fn update_missing_is_not_found<R: Repository>(repo: &R) {
  let mut case = Case::new("ghost", "");
  case.id = 7;
  assert_not_found(repo.case().update(WS, case).await.unwrap_err(), EntityKind::Case);

  let mut action = Action::new(1, "ghost");
  action.id = 3;
  assert_not_found(repo.action().update(WS, action).await.unwrap_err(), EntityKind::Action);

  let source = Source { id: "missing".into(), ..Default::default() };
  assert_not_found(repo.source().update(WS, source).await.unwrap_err(), EntityKind::Source);

  let mut risk = Risk::default();
  risk.id = 1;
  assert_not_found(repo.risk().update(WS, risk).await.unwrap_err(), EntityKind::Risk);
}

pub async fn returned_values_are_independent_copies<R: Repository>(repo: &R) {
  let mut created = repo.case().create(WS, sample_case("C")).await.unwrap();
  created.assignee_ids.push("U-intruder".into());
  created.field_values.clear();

  let mut first = repo.case().get(WS, created.id).await.unwrap();
  assert_eq!(first.assignee_ids, vec!["U1".to_owned(), "U2".to_owned()]);
  assert_eq!(first.field_values.len(), 2);

  first.assignee_ids.clear();
  if let Some(fv) = first.field_values.get_mut("category") {
    fv.value = Value::MultiSelect(vec!["bogus".into()]);
  }

  let second = repo.case().get(WS, created.id).await.unwrap();
  assert_eq!(second.assignee_ids.len(), 2);
  assert_eq!(
    second.field_values["category"].value,
    Value::MultiSelect(vec!["network".into(), "malware".into()])
  );

  let mut k = repo
    .knowledge()
    .create(WS, knowledge(created.id, "k", vec![1.0, 0.0]))
    .await
    .unwrap();
  k.embedding.clear();
  let fetched = repo.knowledge().get(WS, &k.id).await.unwrap();
  assert_eq!(fetched.embedding, vec![1.0, 0.0]);
}

// ─── Cases and actions ───────────────────────────────────────────────────────

pub async fn case_list_filters_by_status<R: Repository>(repo: &R) {
  for title in ["a", "b", "c"] {
    repo.case().create(WS, Case::new(title, "")).await.unwrap();
  }
  let mut b = repo.case().get(WS, 2).await.unwrap();
  b.status = CaseStatus::Closed;
  repo.case().update(WS, b).await.unwrap();

  let all = repo.case().list(WS, CaseFilter::default()).await.unwrap();
  assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3]);

  let open = repo
    .case()
    .list(WS, CaseFilter { status: Some(CaseStatus::Open) })
    .await
    .unwrap();
  assert_eq!(open.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 3]);

  let closed = repo
    .case()
    .list(WS, CaseFilter { status: Some(CaseStatus::Closed) })
    .await
    .unwrap();
  assert_eq!(closed.len(), 1);
  assert_eq!(closed[0].title, "b");
}

pub async fn case_lookup_by_slack_channel<R: Repository>(repo: &R) {
  let created = repo.case().create(WS, sample_case("C1")).await.unwrap();
  let found = repo.case().get_by_slack_channel_id(WS, "C-C1").await.unwrap();
  assert_eq!(found.map(|c| c.id), Some(created.id));
  assert!(repo.case().get_by_slack_channel_id(WS, "C-nope").await.unwrap().is_none());
  assert!(repo.case().get_by_slack_channel_id(OTHER_WS, "C-C1").await.unwrap().is_none());
}

pub async fn case_scenario<R: Repository>(repo: &R) {
  let c1 = repo.case().create(WS, Case::new("C1", "")).await.unwrap();
  let listed = repo.case().list(WS, CaseFilter::default()).await.unwrap();
  assert_eq!(listed, vec![c1.clone()]);

  repo.action().create(WS, Action::new(c1.id, "contain")).await.unwrap();
  repo.case().delete(WS, c1.id).await.unwrap();

  assert!(repo.action().get_by_case(WS, c1.id).await.unwrap().is_empty());
  assert_not_found(repo.case().get(WS, c1.id).await.unwrap_err(), EntityKind::Case);
}

pub async fn case_delete_cascades<R: Repository>(repo: &R) {
  let doomed = repo.case().create(WS, Case::new("doomed", "")).await.unwrap();
  let kept = repo.case().create(WS, Case::new("kept", "")).await.unwrap();

  for i in 0..3 {
    repo.action().create(WS, Action::new(doomed.id, format!("a{i}"))).await.unwrap();
  }
  let kept_action = repo.action().create(WS, Action::new(kept.id, "stay")).await.unwrap();
  for i in 0..2 {
    repo
      .knowledge()
      .create(WS, knowledge(doomed.id, &format!("k{i}"), vec![1.0]))
      .await
      .unwrap();
    repo
      .memory()
      .create(WS, Memory::new(doomed.id, format!("m{i}"), vec![1.0]))
      .await
      .unwrap();
  }
  let kept_memory = repo.memory().create(WS, Memory::new(kept.id, "stay", vec![])).await.unwrap();

  repo.case().delete(WS, doomed.id).await.unwrap();

  assert!(repo.action().get_by_case(WS, doomed.id).await.unwrap().is_empty());
  assert!(repo.knowledge().get_by_case(WS, doomed.id).await.unwrap().is_empty());
  assert!(repo.memory().get_by_case(WS, doomed.id).await.unwrap().is_empty());

  assert_eq!(repo.action().list(WS).await.unwrap(), vec![kept_action]);
  assert_eq!(repo.memory().get_by_case(WS, kept.id).await.unwrap(), vec![kept_memory]);
}

pub async fn action_queries<R: Repository>(repo: &R) {
  let c1 = repo.case().create(WS, Case::new("c1", "")).await.unwrap();
  let c2 = repo.case().create(WS, Case::new("c2", "")).await.unwrap();

  let mut tracked = Action::new(c1.id, "tracked");
  tracked.slack_message_ts = Some("1700000000.000100".into());
  tracked.status = ActionStatus::InProgress;
  tracked.assignee_ids = vec!["U9".into()];
  let tracked = repo.action().create(WS, tracked).await.unwrap();
  let other = repo.action().create(WS, Action::new(c1.id, "other")).await.unwrap();

  let by_case = repo.action().get_by_case(WS, c1.id).await.unwrap();
  assert_eq!(by_case, vec![tracked.clone(), other.clone()]);

  let grouped = repo.action().get_by_cases(WS, &[c1.id, c2.id, 404]).await.unwrap();
  assert_eq!(grouped.len(), 3);
  assert_eq!(grouped[&c1.id].len(), 2);
  assert!(grouped[&c2.id].is_empty());
  assert!(grouped[&404].is_empty());

  let found = repo
    .action()
    .get_by_slack_message_ts(WS, "1700000000.000100")
    .await
    .unwrap();
  assert_eq!(found, Some(tracked.clone()));
  assert!(repo.action().get_by_slack_message_ts(WS, "0").await.unwrap().is_none());

  repo.action().delete(WS, other.id).await.unwrap();
  assert_not_found(repo.action().get(WS, other.id).await.unwrap_err(), EntityKind::Action);
  assert_not_found(repo.action().delete(WS, other.id).await.unwrap_err(), EntityKind::Action);
}

// ─── Opaque IDs, pagination, similarity ──────────────────────────────────────

pub async fn opaque_ids_are_generated_or_preserved<R: Repository>(repo: &R) {
  let generated = repo.knowledge().create(WS, knowledge(1, "gen", vec![])).await.unwrap();
  assert!(!generated.id.is_empty());

  let mut supplied = knowledge(1, "fixed", vec![]);
  supplied.id = "knowledge-fixed-id".into();
  let supplied = repo.knowledge().create(WS, supplied).await.unwrap();
  assert_eq!(supplied.id, "knowledge-fixed-id");
  assert_eq!(repo.knowledge().get(WS, "knowledge-fixed-id").await.unwrap(), supplied);

  let mut dup = knowledge(1, "dup", vec![]);
  dup.id = "knowledge-fixed-id".into();
  assert!(repo.knowledge().create(WS, dup).await.unwrap_err().is_validation());

  let other = repo.knowledge().create(WS, knowledge(1, "gen2", vec![])).await.unwrap();
  assert_ne!(other.id, generated.id);

  repo.knowledge().delete(WS, &generated.id).await.unwrap();
  assert_not_found(
    repo.knowledge().delete(WS, &generated.id).await.unwrap_err(),
    EntityKind::Knowledge,
  );
}

pub async fn knowledge_pagination_is_complete<R: Repository>(repo: &R) {
  let mut created = HashSet::new();
  for i in 0..23 {
    let k = repo.knowledge().create(WS, knowledge(i % 3, &format!("k{i}"), vec![])).await.unwrap();
    created.insert(k.id);
  }

  let mut seen: Vec<Knowledge> = Vec::new();
  let mut cursor: Option<Cursor> = None;
  let mut pages = 0;
  loop {
    let page = repo.knowledge().list_paged(WS, 5, cursor.as_ref()).await.unwrap();
    pages += 1;
    assert!(page.items.len() <= 5);
    seen.extend(page.items);
    match page.next_cursor {
      Some(next) => cursor = Some(next),
      None => break,
    }
  }

  assert_eq!(pages, 5);
  assert_eq!(seen.len(), 23, "no duplicates or omissions");
  let seen_ids: HashSet<String> = seen.iter().map(|k| k.id.clone()).collect();
  assert_eq!(seen_ids, created);
  for pair in seen.windows(2) {
    assert_ne!(
      pagination::newest_first(&pair[0], &pair[1]),
      std::cmp::Ordering::Greater,
      "pages must be newest first"
    );
    assert!(pair[0].created_at >= pair[1].created_at);
  }

  let all = repo.knowledge().list_paged(WS, 0, None).await.unwrap();
  assert_eq!(all.items.len(), 23);
  assert!(all.next_cursor.is_none());
}

pub async fn knowledge_stale_cursor_restarts<R: Repository>(repo: &R) {
  for i in 0..4 {
    repo.knowledge().create(WS, knowledge(1, &format!("k{i}"), vec![])).await.unwrap();
  }
  let first = repo.knowledge().list_paged(WS, 2, None).await.unwrap();
  let cursor = first.next_cursor.clone().unwrap();

  // The cursor names the last item of the first page; remove it.
  let last = first.items.last().unwrap();
  repo.knowledge().delete(WS, &last.id).await.unwrap();

  let restarted = repo.knowledge().list_paged(WS, 2, Some(&cursor)).await.unwrap();
  assert_eq!(restarted.items[0], first.items[0]);
}

pub async fn knowledge_ranked_by_cosine_similarity<R: Repository>(repo: &R) {
  let query = [1.0, 0.0, 0.0];
  let far = repo.knowledge().create(WS, knowledge(1, "far", vec![0.1, 1.0, 0.0])).await.unwrap();
  let near = repo.knowledge().create(WS, knowledge(1, "near", vec![0.9, 0.1, 0.0])).await.unwrap();
  repo.knowledge().create(WS, knowledge(1, "none", vec![])).await.unwrap();
  let mid = repo.knowledge().create(WS, knowledge(2, "mid", vec![0.6, 0.4, 0.0])).await.unwrap();
  let stale = repo.knowledge().create(WS, knowledge(2, "stale", vec![1.0, 0.0])).await.unwrap();

  let ranked = repo.knowledge().find_by_embedding(WS, &query, 10).await.unwrap();
  let titles: Vec<&str> = ranked.iter().map(|k| k.title.as_str()).collect();
  assert_eq!(&titles[..3], &["near", "mid", "far"]);
  assert_eq!(ranked.len(), 4, "entries without an embedding never appear");
  assert_eq!(ranked[3].id, stale.id, "mismatched dimension scores zero");
  assert_eq!(ranked[0].id, near.id);
  assert_eq!(ranked[1].id, mid.id);
  assert_eq!(ranked[2].id, far.id);

  let top = repo.knowledge().find_by_embedding(WS, &query, 2).await.unwrap();
  assert_eq!(top.iter().map(|k| k.id.clone()).collect::<Vec<_>>(), vec![near.id, mid.id]);

  let empty = repo.knowledge().find_by_embedding(OTHER_WS, &query, 3).await.unwrap();
  assert!(empty.is_empty());
}

pub async fn memory_search_is_scoped_to_case<R: Repository>(repo: &R) {
  let query = [0.0, 1.0];
  let close = repo.memory().create(WS, Memory::new(1, "close", vec![0.1, 0.9])).await.unwrap();
  let loose = repo.memory().create(WS, Memory::new(1, "loose", vec![0.7, 0.3])).await.unwrap();
  repo.memory().create(WS, Memory::new(1, "blank", vec![])).await.unwrap();
  repo.memory().create(WS, Memory::new(2, "exact", vec![0.0, 1.0])).await.unwrap();

  let ranked = repo.memory().find_by_embedding(WS, 1, &query, 10).await.unwrap();
  assert_eq!(ranked, vec![close, loose]);

  assert!(repo.memory().find_by_embedding(WS, 3, &query, 10).await.unwrap().is_empty());
  assert_eq!(repo.memory().get_by_case(WS, 1).await.unwrap().len(), 3);
}

pub async fn knowledge_grouped_by_case<R: Repository>(repo: &R) {
  let mut case_ids = Vec::new();
  for i in 0..12 {
    let case = repo.case().create(WS, Case::new(format!("c{i}"), "")).await.unwrap();
    repo.knowledge().create(WS, knowledge(case.id, &format!("k{i}"), vec![])).await.unwrap();
    case_ids.push(case.id);
  }

  // Ascending IDs so an equal timestamp still sorts the newer entry first.
  let first_case = case_ids[0];
  let mut older = knowledge(first_case, "older", vec![]);
  older.id = "k-a-older".into();
  let older = repo.knowledge().create(WS, older).await.unwrap();
  let mut newer = knowledge(first_case, "newer", vec![]);
  newer.id = "k-z-newer".into();
  let newer = repo.knowledge().create(WS, newer).await.unwrap();

  let by_case = repo.knowledge().get_by_case(WS, first_case).await.unwrap();
  assert_eq!(by_case.len(), 3);
  assert_eq!(by_case[0], newer);
  assert_eq!(by_case[1], older);

  let mut requested = case_ids.clone();
  requested.push(404);
  requested.push(first_case);
  let grouped = repo.knowledge().get_by_cases(WS, &requested).await.unwrap();
  assert_eq!(grouped.len(), 13);
  assert_eq!(grouped[&first_case], by_case, "duplicate IDs must not repeat entries");
  assert!(case_ids[1..].iter().all(|id| grouped[id].len() == 1));
  assert!(grouped[&404].is_empty());

  let elsewhere = repo.knowledge().get_by_cases(OTHER_WS, &case_ids).await.unwrap();
  assert!(elsewhere[&first_case].is_empty());
}

// ─── Field values ────────────────────────────────────────────────────────────

pub async fn field_value_counts<R: Repository>(repo: &R) {
  let valid_set = options(&["high", "medium", "low"]);
  for (title, value) in [
    ("a", Value::Select("high".into())),
    ("b", Value::Select("medium".into())),
    ("c", Value::Select("invalid-opt".into())),
    ("d", Value::Text("free text".into())),
  ] {
    let mut case = Case::new(title, "");
    case.set_field(FieldValue::new("severity", value));
    repo.case().create(WS, case).await.unwrap();
  }
  repo.case().create(WS, Case::new("no fields", "")).await.unwrap();

  let counts = repo
    .case()
    .count_field_values(WS, "severity", FieldType::Select, Some(&valid_set))
    .await
    .unwrap();
  assert_eq!(counts, FieldValueCount { total: 3, valid: 2 });

  let invalid = repo
    .case()
    .find_case_with_invalid_field_value(WS, "severity", FieldType::Select, Some(&valid_set))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(invalid.title, "c");

  let widened = options(&["high", "medium", "low", "invalid-opt"]);
  assert!(
    repo
      .case()
      .find_case_with_invalid_field_value(WS, "severity", FieldType::Select, Some(&widened))
      .await
      .unwrap()
      .is_none()
  );

  let text = repo
    .case()
    .count_field_values(WS, "severity", FieldType::Text, None)
    .await
    .unwrap();
  assert_eq!(text, FieldValueCount { total: 1, valid: 1 });

  let mut multi = Case::new("multi", "");
  multi.set_field(FieldValue::new(
    "category",
    Value::MultiSelect(vec!["network".into(), "bogus".into()]),
  ));
  repo.case().create(WS, multi).await.unwrap();
  let cats = options(&["network", "malware", "phishing"]);
  let counts = repo
    .case()
    .count_field_values(WS, "category", FieldType::MultiSelect, Some(&cats))
    .await
    .unwrap();
  assert_eq!(counts, FieldValueCount { total: 1, valid: 0 });
}

pub async fn non_finite_values_are_rejected<R: Repository>(repo: &R) {
  let mut nan_case = Case::new("nan", "");
  nan_case.set_field(FieldValue::new("score", Value::Number(f64::NAN)));
  assert!(repo.case().create(WS, nan_case).await.unwrap_err().is_validation());

  let mut stored = Case::new("scored", "");
  stored.set_field(FieldValue::new("score", Value::Number(7.5)));
  let stored = repo.case().create(WS, stored).await.unwrap();
  let mut inf = stored.clone();
  inf.set_field(FieldValue::new("score", Value::Number(f64::INFINITY)));
  assert!(repo.case().update(WS, inf).await.unwrap_err().is_validation());
  assert_eq!(repo.case().get(WS, stored.id).await.unwrap(), stored);

  let bad = knowledge(stored.id, "nan", vec![f32::NAN, 1.0]);
  assert!(repo.knowledge().create(WS, bad).await.unwrap_err().is_validation());
  let good = repo.knowledge().create(WS, knowledge(stored.id, "ok", vec![1.0, 0.0])).await.unwrap();
  let mut bad = good.clone();
  bad.embedding = vec![f32::NEG_INFINITY, 0.0];
  assert!(repo.knowledge().update(WS, bad).await.unwrap_err().is_validation());

  let bad = Memory::new(stored.id, "inf", vec![f32::INFINITY]);
  assert!(repo.memory().create(WS, bad).await.unwrap_err().is_validation());

  // Nothing half-written: whole-workspace reads still succeed.
  assert_eq!(repo.case().list(WS, CaseFilter::default()).await.unwrap(), vec![stored.clone()]);
  let counts = repo.case().count_field_values(WS, "score", FieldType::Number, None).await.unwrap();
  assert_eq!(counts, FieldValueCount { total: 1, valid: 1 });
  assert_eq!(repo.knowledge().list_paged(WS, 0, None).await.unwrap().items, vec![good]);
  assert!(repo.memory().get_by_case(WS, stored.id).await.unwrap().is_empty());
}

pub async fn mismatched_field_key_is_rejected<R: Repository>(repo: &R) {
  let mut case = Case::new("mislabelled", "");
  case
    .field_values
    .insert("priority".into(), FieldValue::new("severity", Value::Select("high".into())));
  assert!(repo.case().create(WS, case).await.unwrap_err().is_validation());

  let created = repo.case().create(WS, Case::new("clean", "")).await.unwrap();
  let mut relabelled = created.clone();
  relabelled
    .field_values
    .insert("priority".into(), FieldValue::new("severity", Value::Select("low".into())));
  assert!(repo.case().update(WS, relabelled).await.unwrap_err().is_validation());

  let counts = repo
    .case()
    .count_field_values(WS, "priority", FieldType::Select, None)
    .await
    .unwrap();
  assert_eq!(counts, FieldValueCount::default());
}

// ─── Sources ─────────────────────────────────────────────────────────────────

pub async fn source_crud<R: Repository>(repo: &R) {
  let slack = repo
    .source()
    .create(WS, Source {
      name: "incident channels".into(),
      enabled: true,
      config: SourceConfig::Slack(SlackConfig {
        channels: vec![SlackChannel { id: "C1".into(), name: "sec-alerts".into() }],
      }),
      ..Default::default()
    })
    .await
    .unwrap();
  let notion = repo
    .source()
    .create(WS, Source {
      name: "runbooks".into(),
      config: SourceConfig::NotionPage(NotionPageConfig {
        page_id: "p1".into(),
        recursive: true,
        max_depth: 2,
        ..Default::default()
      }),
      ..Default::default()
    })
    .await
    .unwrap();

  let fetched = repo.source().get(WS, &notion.id).await.unwrap();
  assert_eq!(fetched.source_type(), SourceType::NotionPage);
  assert_eq!(fetched, notion);

  let listed = repo.source().list(WS).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].id, notion.id, "newest first");

  let mut disabled = slack.clone();
  disabled.enabled = false;
  let disabled = repo.source().update(WS, disabled).await.unwrap();
  assert!(!disabled.enabled);
  assert_eq!(disabled.created_at, slack.created_at);

  repo.source().delete(WS, &slack.id).await.unwrap();
  assert_not_found(repo.source().get(WS, &slack.id).await.unwrap_err(), EntityKind::Source);
}

// ─── Slack users ─────────────────────────────────────────────────────────────

pub async fn slack_user_cache<R: Repository>(repo: &R) {
  let users = repo.slack_user();
  assert!(users.get_all().await.unwrap().is_empty());
  assert_eq!(users.get_metadata().await.unwrap(), SlackUserMetadata::default());

  let batch: Vec<SlackUser> = (0..45)
    .map(|i| SlackUser {
      id: format!("U{i:03}"),
      name: format!("user{i}"),
      email: format!("user{i}@example.com"),
      ..Default::default()
    })
    .collect();
  users.save_many(batch).await.unwrap();

  let all = users.get_all().await.unwrap();
  assert_eq!(all.len(), 45);
  assert_eq!(all[0].id, "U000");
  assert!(all.iter().all(|u| u.updated_at > epoch()));

  let ids: Vec<String> = (0..30).map(|i| format!("U{i:03}")).chain(["UNKNOWN".into()]).collect();
  let found = users.get_by_ids(&ids).await.unwrap();
  assert_eq!(found.len(), 30);
  assert_eq!(found["U007"].name, "user7");

  assert_not_found(users.get_by_id("UNKNOWN").await.unwrap_err(), EntityKind::SlackUser);

  users
    .save_many(vec![SlackUser { id: "U001".into(), name: "renamed".into(), ..Default::default() }])
    .await
    .unwrap();
  assert_eq!(users.get_by_id("U001").await.unwrap().name, "renamed");
  assert_eq!(users.get_all().await.unwrap().len(), 45);

  let now = Utc::now();
  let meta = SlackUserMetadata {
    last_refresh_success: Some(now),
    last_refresh_attempt: Some(now),
    user_count:           45,
  };
  users.save_metadata(meta.clone()).await.unwrap();
  assert_eq!(users.get_metadata().await.unwrap(), meta);

  users.delete_all().await.unwrap();
  assert!(users.get_all().await.unwrap().is_empty());
}

// ─── Timelines ───────────────────────────────────────────────────────────────

pub async fn case_message_timeline<R: Repository>(repo: &R) {
  let base = Utc::now() - TimeDelta::hours(1);
  for i in 0..6 {
    repo
      .case_message()
      .put(WS, CaseMessage {
        id: format!("17000000{i:02}.000100"),
        case_id: 1,
        user_id: "U1".into(),
        user_name: "alice".into(),
        text: format!("message {i}"),
        created_at: base + TimeDelta::minutes(i),
      })
      .await
      .unwrap();
  }
  repo
    .case_message()
    .put(WS, CaseMessage { id: "other".into(), case_id: 2, created_at: base, ..Default::default() })
    .await
    .unwrap();

  // Upsert by message ID.
  repo
    .case_message()
    .put(WS, CaseMessage {
      id: "1700000005.000100".into(),
      case_id: 1,
      text: "edited".into(),
      created_at: base + TimeDelta::minutes(5),
      ..Default::default()
    })
    .await
    .unwrap();

  let first = repo.case_message().list(WS, 1, 4, None).await.unwrap();
  assert_eq!(first.items.len(), 4);
  assert_eq!(first.items[0].text, "edited");
  let second = repo.case_message().list(WS, 1, 4, first.next_cursor.as_ref()).await.unwrap();
  assert_eq!(second.items.len(), 2);
  assert!(second.next_cursor.is_none());
  assert_eq!(second.items[1].text, "message 0");

  let removed = repo
    .case_message()
    .prune(WS, 1, base + TimeDelta::minutes(2))
    .await
    .unwrap();
  assert_eq!(removed, 2);
  let rest = repo.case_message().list(WS, 1, 0, None).await.unwrap();
  assert_eq!(rest.items.len(), 4);
  assert_eq!(repo.case_message().list(WS, 2, 0, None).await.unwrap().items.len(), 1);
  assert_eq!(repo.case_message().prune(OTHER_WS, 1, Utc::now()).await.unwrap(), 0);
}

pub async fn assist_log_pages<R: Repository>(repo: &R) {
  for i in 0..5 {
    repo
      .assist_log()
      .create(WS, AssistLog {
        case_id: 1,
        summary: format!("run {i}"),
        created_at: epoch(),
        ..Default::default()
      })
      .await
      .unwrap();
  }
  repo
    .assist_log()
    .create(WS, AssistLog { case_id: 2, summary: "elsewhere".into(), ..Default::default() })
    .await
    .unwrap();

  let first = repo.assist_log().list(WS, 1, 3, None).await.unwrap();
  assert_eq!(first.items.len(), 3);
  assert!(first.items.iter().all(|l| l.created_at > epoch()));
  let second = repo.assist_log().list(WS, 1, 3, first.next_cursor.as_ref()).await.unwrap();
  assert_eq!(second.items.len(), 2);
  assert!(second.next_cursor.is_none());

  let ids: HashSet<String> = first.items.iter().chain(&second.items).map(|l| l.id.clone()).collect();
  assert_eq!(ids.len(), 5);
}

// ─── Risk ↔ response links ───────────────────────────────────────────────────

pub async fn risk_response_links<R: Repository>(repo: &R) {
  let risk = repo
    .risk()
    .create(WS, Risk { name: "credential leak".into(), ..Default::default() })
    .await
    .unwrap();
  let other_risk = repo
    .risk()
    .create(WS, Risk { name: "ransomware".into(), ..Default::default() })
    .await
    .unwrap();
  let mfa = repo
    .response()
    .create(WS, Response { title: "enforce MFA".into(), ..Default::default() })
    .await
    .unwrap();
  let rotate = repo
    .response()
    .create(WS, Response { title: "rotate keys".into(), ..Default::default() })
    .await
    .unwrap();

  let links = repo.risk_response();
  links.link(WS, risk.id, mfa.id).await.unwrap();
  links.link(WS, risk.id, mfa.id).await.unwrap();
  assert_eq!(links.get_responses_by_risk(WS, risk.id).await.unwrap(), vec![mfa.clone()]);

  links.link(WS, risk.id, rotate.id).await.unwrap();
  links.link(WS, other_risk.id, rotate.id).await.unwrap();

  let responses = links.get_responses_by_risk(WS, risk.id).await.unwrap();
  assert_eq!(responses, vec![mfa.clone(), rotate.clone()]);
  let risks = links.get_risks_by_response(WS, rotate.id).await.unwrap();
  assert_eq!(risks, vec![risk.clone(), other_risk.clone()]);

  let by_risks = links.get_responses_by_risks(WS, &[risk.id, other_risk.id, 99]).await.unwrap();
  assert_eq!(by_risks[&risk.id].len(), 2);
  assert_eq!(by_risks[&other_risk.id], vec![rotate.clone()]);
  assert!(by_risks[&99].is_empty());

  let by_responses: HashMap<i64, Vec<Risk>> =
    links.get_risks_by_responses(WS, &[mfa.id, rotate.id]).await.unwrap();
  assert_eq!(by_responses[&mfa.id], vec![risk.clone()]);
  assert_eq!(by_responses[&rotate.id].len(), 2);

  assert_not_found(links.link(WS, 404, mfa.id).await.unwrap_err(), EntityKind::Risk);
  assert_not_found(links.link(WS, risk.id, 404).await.unwrap_err(), EntityKind::Response);
  assert_not_found(links.link(OTHER_WS, risk.id, mfa.id).await.unwrap_err(), EntityKind::Risk);

  links.unlink(WS, risk.id, mfa.id).await.unwrap();
  assert_not_found(
    links.unlink(WS, risk.id, mfa.id).await.unwrap_err(),
    EntityKind::RiskResponse,
  );
  assert_eq!(links.get_responses_by_risk(WS, risk.id).await.unwrap(), vec![rotate.clone()]);

  links.delete_by_response(WS, rotate.id).await.unwrap();
  assert!(links.get_risks_by_response(WS, rotate.id).await.unwrap().is_empty());
  assert!(links.get_responses_by_risk(WS, other_risk.id).await.unwrap().is_empty());

  links.link(WS, risk.id, mfa.id).await.unwrap();
  links.delete_by_risk(WS, risk.id).await.unwrap();
  assert!(links.get_risks_by_response(WS, mfa.id).await.unwrap().is_empty());
}

pub async fn broken_links_are_skipped<R: Repository>(repo: &R) {
  let risk = repo.risk().create(WS, Risk::default()).await.unwrap();
  let kept = repo.response().create(WS, Response { title: "kept".into(), ..Default::default() }).await.unwrap();
  let gone = repo.response().create(WS, Response { title: "gone".into(), ..Default::default() }).await.unwrap();

  repo.risk_response().link(WS, risk.id, gone.id).await.unwrap();
  repo.risk_response().link(WS, risk.id, kept.id).await.unwrap();

  // Deleting a response leaves its link rows behind.
  repo.response().delete(WS, gone.id).await.unwrap();
  let responses = repo.risk_response().get_responses_by_risk(WS, risk.id).await.unwrap();
  assert_eq!(responses, vec![kept.clone()]);

  repo.risk().delete(WS, risk.id).await.unwrap();
  assert!(repo.risk_response().get_risks_by_response(WS, kept.id).await.unwrap().is_empty());
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

pub async fn token_lifecycle<R: Repository>(repo: &R) {
  let token = Token::new("U123", "alice@example.com", "Alice");
  let stored = repo.put_token(token.clone()).await.unwrap();
  assert_eq!(stored, token);
  assert_eq!(repo.get_token(&token.id).await.unwrap(), token);

  let mut broken = Token::new("U456", "bob@example.com", "Bob");
  broken.sub.clear();
  assert!(repo.put_token(broken.clone()).await.unwrap_err().is_validation());
  assert_not_found(repo.get_token(&broken.id).await.unwrap_err(), EntityKind::Token);

  repo.delete_token(&token.id).await.unwrap();
  assert_not_found(repo.get_token(&token.id).await.unwrap_err(), EntityKind::Token);
  assert_not_found(
    repo.delete_token(&TokenId::new("missing")).await.unwrap_err(),
    EntityKind::Token,
  );
}
