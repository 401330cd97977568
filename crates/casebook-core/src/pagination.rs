//! Backend-neutral cursor pagination.
//!
//! Candidates are ordered newest-first by `created_at`, with the record ID
//! (descending) breaking ties so the order is total. A [`Cursor`] names the
//! last item of the previous page; the next page starts strictly after it.
//! Both adapters fetch the candidate set and hand it to [`paginate`], so page
//! boundaries cannot drift between backends.

use std::{cmp::Ordering, fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, record::Record};

/// Page size used when the caller asks for zero items.
pub const DEFAULT_PAGE_SIZE: usize = 100;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Opaque resume token. Callers must not decode it; it is only valid for the
/// query that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
  /// The cursor that resumes after the record with `id`.
  pub fn after(id: &impl fmt::Display) -> Self {
    Self(URL_SAFE_NO_PAD.encode(id.to_string()))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  /// The record ID this cursor points at.
  fn position(&self) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD
      .decode(&self.0)
      .map_err(|_| Error::validation("malformed pagination cursor"))?;
    String::from_utf8(bytes)
      .map_err(|_| Error::validation("malformed pagination cursor"))
  }
}

impl fmt::Display for Cursor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl FromStr for Cursor {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let cursor = Self(s.to_owned());
    cursor.position()?;
    Ok(cursor)
  }
}

// ─── Page ────────────────────────────────────────────────────────────────────

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:       Vec<T>,
  /// `None` once the final page has been returned.
  pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
  pub fn empty() -> Self { Self { items: Vec::new(), next_cursor: None } }
}

// ─── Ordering ────────────────────────────────────────────────────────────────

/// Newest `created_at` first; equal timestamps fall back to the larger ID.
pub fn newest_first<R: Record>(a: &R, b: &R) -> Ordering {
  b.created_at()
    .cmp(&a.created_at())
    .then_with(|| b.id().cmp(&a.id()))
}

/// Sort `items` newest-first and cut out the page after `cursor`.
///
/// A cursor naming an item that is no longer present restarts from the
/// beginning rather than failing.
pub fn paginate<R: Record>(
  mut items: Vec<R>,
  limit: usize,
  cursor: Option<&Cursor>,
) -> Result<Page<R>> {
  let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
  items.sort_by(newest_first);

  let start = match cursor {
    None => 0,
    Some(cursor) => {
      let last_seen = cursor.position()?;
      match items.iter().position(|r| r.id().to_string() == last_seen) {
        Some(idx) => idx + 1,
        None => {
          tracing::debug!(
            kind = %R::KIND,
            cursor = %cursor,
            "cursor no longer matches any item; restarting from the first page"
          );
          0
        }
      }
    }
  };

  let remaining = items.len().saturating_sub(start);
  let has_more = remaining > limit;
  let page: Vec<R> = items.into_iter().skip(start).take(limit).collect();

  let next_cursor = if has_more {
    page.last().map(|last| Cursor::after(&last.id()))
  } else {
    None
  };

  Ok(Page { items: page, next_cursor })
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, TimeDelta, Utc};

  use super::*;
  use crate::model::memory::Memory;

  fn memory(id: &str, offset_secs: i64) -> Memory {
    let at = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(offset_secs);
    Memory {
      id: id.into(),
      created_at: at,
      updated_at: at,
      ..Default::default()
    }
  }

  fn ids(page: &Page<Memory>) -> Vec<&str> {
    page.items.iter().map(|m| m.id.as_str()).collect()
  }

  #[test]
  fn pages_walk_the_full_set_newest_first() {
    let items: Vec<Memory> =
      (0..7).map(|i| memory(&format!("m{i}"), i)).collect();

    let mut seen = Vec::new();
    let mut cursor: Option<Cursor> = None;
    loop {
      let page = paginate(items.clone(), 3, cursor.as_ref()).unwrap();
      seen.extend(page.items.iter().map(|m| m.id.clone()));
      match page.next_cursor {
        Some(next) => cursor = Some(next),
        None => break,
      }
    }

    assert_eq!(seen, vec!["m6", "m5", "m4", "m3", "m2", "m1", "m0"]);
  }

  #[test]
  fn exact_multiple_has_no_trailing_cursor() {
    let items: Vec<Memory> =
      (0..4).map(|i| memory(&format!("m{i}"), i)).collect();
    let first = paginate(items.clone(), 2, None).unwrap();
    assert!(first.next_cursor.is_some());
    let second = paginate(items, 2, first.next_cursor.as_ref()).unwrap();
    assert_eq!(ids(&second), vec!["m1", "m0"]);
    assert!(second.next_cursor.is_none());
  }

  #[test]
  fn equal_timestamps_order_by_id() {
    let items = vec![memory("a", 5), memory("c", 5), memory("b", 5)];
    let page = paginate(items, 0, None).unwrap();
    assert_eq!(ids(&page), vec!["c", "b", "a"]);
  }

  #[test]
  fn stale_cursor_restarts() {
    let items = vec![memory("a", 1), memory("b", 2)];
    let stale = Cursor::after(&"gone");
    let page = paginate(items, 10, Some(&stale)).unwrap();
    assert_eq!(ids(&page), vec!["b", "a"]);
  }

  #[test]
  fn malformed_cursor_is_rejected() {
    assert!("not base64!".parse::<Cursor>().is_err());
    let parsed: Cursor = Cursor::after(&42).to_string().parse().unwrap();
    assert_eq!(parsed, Cursor::after(&42));
  }

  #[test]
  fn zero_limit_uses_default() {
    let items: Vec<Memory> =
      (0..150).map(|i| memory(&format!("m{i:03}"), i)).collect();
    let page = paginate(items, 0, None).unwrap();
    assert_eq!(page.items.len(), DEFAULT_PAGE_SIZE);
    assert!(page.next_cursor.is_some());
  }
}
