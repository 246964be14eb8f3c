//! Dedup, cap and expiry rules shared by both backends.
//!
//! The relational backend expresses these rules in SQL; the key/value
//! backend applies them to in-memory collections. Keeping the arithmetic here
//! lets both produce the same observable results.

use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use ecoair_types::city_key;

/// Current time truncated to whole seconds.
///
/// Timestamps round-trip through unix seconds in SQLite, so values handed out
/// by either backend never carry sub-second precision.
pub fn now_utc() -> OffsetDateTime {
    truncate_to_seconds(OffsetDateTime::now_utc())
}

pub fn truncate_to_seconds(at: OffsetDateTime) -> OffsetDateTime {
    at - Duration::nanoseconds(i64::from(at.nanosecond()))
}

/// `at` moved by `seconds`, saturating at the representable range.
///
/// `None` means the offset itself overflowed; `forward` picks the bound.
fn saturating_shift(at: OffsetDateTime, seconds: Option<i64>, forward: bool) -> OffsetDateTime {
    seconds
        .and_then(|s| at.checked_add(Duration::seconds(s)))
        .unwrap_or_else(|| {
            if forward {
                PrimitiveDateTime::MAX.assume_utc()
            } else {
                PrimitiveDateTime::MIN.assume_utc()
            }
        })
}

/// Expiry instant of an entry cached at `now`.
pub fn expires_at(now: OffsetDateTime, ttl_minutes: i64) -> OffsetDateTime {
    saturating_shift(now, ttl_minutes.checked_mul(60), ttl_minutes > 0)
}

/// Start of the trailing window of `days` ending at `now`.
pub fn window_start(now: OffsetDateTime, days: i64) -> OffsetDateTime {
    saturating_shift(
        now,
        days.checked_mul(86_400).and_then(i64::checked_neg),
        days < 0,
    )
}

/// An entry is stale from its expiry instant onwards.
pub fn is_expired(now: OffsetDateTime, expires_at: OffsetDateTime) -> bool {
    now >= expires_at
}

/// How many of `len` items exceed `cap`.
pub fn excess(len: usize, cap: usize) -> usize {
    len.saturating_sub(cap)
}

/// Insert `item` at the front, dropping earlier items equal to it and
/// anything past `cap`.
pub fn push_front_dedup<T, F>(items: &mut Vec<T>, item: T, cap: usize, same: F)
where
    F: Fn(&T, &T) -> bool,
{
    items.retain(|existing| !same(existing, &item));
    items.insert(0, item);
    items.truncate(cap);
}

/// Keep the first occurrence of each city name, ignoring case.
pub fn dedup_case_insensitive<I>(names: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(city_key(name)))
        .take(limit)
        .collect()
}

/// Identifier for a new record in a key/value collection.
///
/// Derived from the clock in milliseconds, bumped past the largest existing
/// id so that ids stay unique and increasing even within one millisecond.
pub fn next_id<I>(existing: I, now: OffsetDateTime) -> i64
where
    I: IntoIterator<Item = i64>,
{
    let now_ms = i64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX);
    match existing.into_iter().max() {
        Some(max) => now_ms.max(max.saturating_add(1)),
        None => now_ms,
    }
}

/// Whether two names refer to the same city.
pub fn same_city(a: &str, b: &str) -> bool {
    city_key(a) == city_key(b)
}
