//! Wall-clock helpers for server-assigned timestamps.

use chrono::{DateTime, TimeDelta, Utc};

pub fn now() -> DateTime<Utc> { Utc::now() }

/// The current instant, or one microsecond past `previous` if the clock has
/// not moved beyond it yet. Successive writes to one record therefore always
/// observe a strictly increasing `updated_at`.
pub fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
  let now = Utc::now();
  if now > previous {
    now
  } else {
    previous + TimeDelta::microseconds(1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn advance_moves_past_a_future_timestamp() {
    let future = Utc::now() + TimeDelta::hours(1);
    let next = advance(future);
    assert_eq!(next, future + TimeDelta::microseconds(1));
  }

  #[test]
  fn advance_uses_wall_clock_when_ahead() {
    let past = DateTime::<Utc>::UNIX_EPOCH;
    assert!(advance(past) > past + TimeDelta::days(365));
  }
}
