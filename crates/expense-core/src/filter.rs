//! Compiles loosely-typed client filter parameters into an [`ExpenseQuery`].
//!
//! Two keys are reserved for paging: `page` (default 0) and `size` (default
//! 1000, at most 10 000). Every other key becomes an equality predicate, in
//! insertion order, combined with AND. The `datetime` key is parsed from the
//! wire pattern `yyyy-MM-dd'T'HH:mm:ss'Z'`.
//!
//! # Datetime normalisation
//!
//! The filter value is first read as wall-clock time in the configured
//! [`FilterZone`], and the zone's UTC offset observed at that instant is then
//! added on top. The net effect is that the literal digits are taken as UTC.
//! Deployed clients rely on this, so it is kept even though it counts the
//! offset twice for non-UTC zones.

use chrono::{
  DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, Offset as _,
  TimeDelta, TimeZone, Utc,
};
use serde::Deserialize;

use crate::{Error, Result};

pub const PAGE_KEY: &str = "page";
pub const SIZE_KEY: &str = "size";
pub const DATETIME_KEY: &str = "datetime";

pub const DEFAULT_PAGE_SIZE: u32 = 1000;
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// `chrono` spelling of the wire pattern `yyyy-MM-dd'T'HH:mm:ss'Z'`.
pub const DATETIME_FILTER_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// ─── Query types ─────────────────────────────────────────────────────────────

/// The right-hand side of an equality predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
  Text(String),
  Instant(DateTime<Utc>),
}

/// `field == value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
  pub field: String,
  pub value: FilterValue,
}

/// A compiled, bounds-checked listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseQuery {
  /// Combined with logical AND.
  pub predicates: Vec<Predicate>,
  /// Zero-based page index.
  pub page:       u32,
  pub size:       u32,
}

impl Default for ExpenseQuery {
  fn default() -> Self {
    Self { predicates: Vec::new(), page: 0, size: DEFAULT_PAGE_SIZE }
  }
}

impl ExpenseQuery {
  /// No predicates remain; a plain paginated fetch suffices.
  pub fn is_unfiltered(&self) -> bool { self.predicates.is_empty() }

  /// Number of records to skip before the page starts.
  pub fn offset(&self) -> u64 { u64::from(self.page) * u64::from(self.size) }
}

// ─── Zone ────────────────────────────────────────────────────────────────────

/// The timezone the `datetime` filter is read in.
///
/// Deserialises from `"local"`, `"utc"`, or a fixed offset such as `"+09:00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum FilterZone {
  /// The server process's local timezone.
  #[default]
  Local,
  Fixed(FixedOffset),
}

impl FilterZone {
  pub fn utc() -> Self { Self::Fixed(Utc.fix()) }

  /// Read `wall` in this zone, then add the offset observed at that instant.
  /// Ambiguous times take the earlier instant; times inside a forward gap are
  /// rolled past it.
  pub fn normalize(self, wall: NaiveDateTime) -> Option<DateTime<Utc>> {
    match self {
      Self::Local => double_shift(&Local, wall),
      Self::Fixed(offset) => double_shift(&offset, wall),
    }
  }
}

impl TryFrom<String> for FilterZone {
  type Error = String;

  fn try_from(s: String) -> Result<Self, Self::Error> {
    match s.trim().to_ascii_lowercase().as_str() {
      "local" => Ok(Self::Local),
      "utc" | "z" => Ok(Self::utc()),
      other => other
        .parse::<FixedOffset>()
        .map(Self::Fixed)
        .map_err(|_| format!("invalid filter timezone: {s:?}")),
    }
  }
}

fn double_shift<Tz: TimeZone>(
  zone: &Tz,
  wall: NaiveDateTime,
) -> Option<DateTime<Utc>> {
  let instant = match zone.from_local_datetime(&wall) {
    LocalResult::Single(dt) => dt.with_timezone(&Utc),
    LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
    LocalResult::None => roll_forward(zone, wall)?,
  };
  let offset = zone
    .offset_from_utc_datetime(&instant.naive_utc())
    .fix()
    .local_minus_utc();
  Some(instant + TimeDelta::seconds(i64::from(offset)))
}

/// A wall-clock time skipped by a forward transition is read with the offset
/// in force before the gap, which lands it past the gap.
fn roll_forward<Tz: TimeZone>(
  zone: &Tz,
  wall: NaiveDateTime,
) -> Option<DateTime<Utc>> {
  let earlier = wall.checked_sub_signed(TimeDelta::days(1))?;
  let before = zone.offset_from_utc_datetime(&earlier).fix().local_minus_utc();
  let utc = wall.checked_sub_signed(TimeDelta::seconds(i64::from(before)))?;
  Some(Utc.from_utc_datetime(&utc))
}

// ─── Compiler ────────────────────────────────────────────────────────────────

/// Compile `filters` into a query, enforcing paging bounds.
///
/// Repeated keys behave like a map: the first occurrence fixes the position,
/// the last one supplies the value.
pub fn compile<I>(filters: I, zone: FilterZone) -> Result<ExpenseQuery>
where
  I: IntoIterator<Item = (String, String)>,
{
  let mut page = None;
  let mut size = None;
  let mut fields: Vec<(String, String)> = Vec::new();

  for (key, value) in filters {
    match key.as_str() {
      PAGE_KEY => page = Some(value),
      SIZE_KEY => size = Some(value),
      _ => match fields.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => fields.push((key, value)),
      },
    }
  }

  let page = page.as_deref().map(parse_page).transpose()?.unwrap_or(0);
  let size = size
    .as_deref()
    .map(parse_size)
    .transpose()?
    .unwrap_or(DEFAULT_PAGE_SIZE);

  let predicates = fields
    .into_iter()
    .map(|(field, raw)| -> Result<Predicate> {
      let value = if field == DATETIME_KEY {
        FilterValue::Instant(parse_datetime(&raw, zone)?)
      } else {
        FilterValue::Text(raw)
      };
      Ok(Predicate { field, value })
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(ExpenseQuery { predicates, page, size })
}

/// Parse a `datetime` filter value. Pure: the zone is passed in, nothing is
/// shared between calls.
pub fn parse_datetime(raw: &str, zone: FilterZone) -> Result<DateTime<Utc>> {
  NaiveDateTime::parse_from_str(raw, DATETIME_FILTER_FORMAT)
    .ok()
    .and_then(|wall| zone.normalize(wall))
    .ok_or_else(|| {
      Error::OutOfBounds(format!(
        "Unable to parse requested date filter [{raw}]"
      ))
    })
}

fn parse_page(raw: &str) -> Result<u32> {
  raw
    .parse::<i32>()
    .ok()
    .and_then(|p| u32::try_from(p).ok())
    .ok_or_else(|| {
      Error::OutOfBounds(
        "Paged result set page must be greater than or equal to 0.".into(),
      )
    })
}

fn parse_size(raw: &str) -> Result<u32> {
  raw
    .parse::<i32>()
    .ok()
    .and_then(|s| u32::try_from(s).ok())
    .filter(|s| *s <= MAX_PAGE_SIZE)
    .ok_or_else(|| {
      Error::OutOfBounds(
        "Paged result set size must be between 0 and 10,000.".into(),
      )
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
      .iter()
      .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
      .collect()
  }

  fn compile_utc(items: &[(&str, &str)]) -> Result<ExpenseQuery> {
    compile(pairs(items), FilterZone::utc())
  }

  fn out_of_bounds(err: Error) -> String {
    match err {
      Error::OutOfBounds(m) => m,
      other => panic!("expected an out-of-bounds error, got {other:?}"),
    }
  }

  // ── Paging ────────────────────────────────────────────────────────────────

  #[test]
  fn defaults_when_no_paging_given() {
    let q = compile_utc(&[]).unwrap();
    assert_eq!(q, ExpenseQuery::default());
    assert!(q.is_unfiltered());
    assert_eq!(q.offset(), 0);
  }

  #[test]
  fn paging_keys_are_not_predicates() {
    let q = compile_utc(&[("page", "2"), ("size", "25")]).unwrap();
    assert!(q.is_unfiltered());
    assert_eq!((q.page, q.size), (2, 25));
    assert_eq!(q.offset(), 50);
  }

  #[test]
  fn negative_page_is_out_of_bounds() {
    let err = compile_utc(&[("page", "-1")]).unwrap_err();
    assert_eq!(
      out_of_bounds(err),
      "Paged result set page must be greater than or equal to 0."
    );
  }

  #[test]
  fn size_outside_range_is_out_of_bounds() {
    for bad in ["-1", "10001", "lots"] {
      let err = compile_utc(&[("size", bad)]).unwrap_err();
      assert_eq!(
        out_of_bounds(err),
        "Paged result set size must be between 0 and 10,000."
      );
    }
  }

  #[test]
  fn size_bounds_are_inclusive() {
    assert_eq!(compile_utc(&[("size", "0")]).unwrap().size, 0);
    assert_eq!(compile_utc(&[("size", "10000")]).unwrap().size, 10_000);
  }

  #[test]
  fn page_is_checked_before_size() {
    let err = compile_utc(&[("size", "-1"), ("page", "-1")]).unwrap_err();
    assert!(out_of_bounds(err).contains("page"));
  }

  // ── Predicates ────────────────────────────────────────────────────────────

  #[test]
  fn predicates_keep_insertion_order() {
    let q = compile_utc(&[
      ("status", "new"),
      ("page", "0"),
      ("merchant", "Starbucks"),
    ])
    .unwrap();

    let fields: Vec<_> = q.predicates.iter().map(|p| p.field.as_str()).collect();
    assert_eq!(fields, ["status", "merchant"]);
    assert_eq!(q.predicates[0].value, FilterValue::Text("new".into()));
  }

  #[test]
  fn repeated_key_keeps_first_position_and_last_value() {
    let q = compile_utc(&[
      ("merchant", "a"),
      ("status", "new"),
      ("merchant", "b"),
    ])
    .unwrap();

    assert_eq!(q.predicates.len(), 2);
    assert_eq!(q.predicates[0].field, "merchant");
    assert_eq!(q.predicates[0].value, FilterValue::Text("b".into()));
  }

  // ── Datetime ──────────────────────────────────────────────────────────────

  #[test]
  fn datetime_digits_are_read_as_utc_in_a_fixed_zone() {
    let tokyo = FilterZone::Fixed(FixedOffset::east_opt(9 * 3600).unwrap());
    let q = compile(pairs(&[("datetime", "2017-01-01T10:00:00Z")]), tokyo)
      .unwrap();

    let expected = Utc.with_ymd_and_hms(2017, 1, 1, 10, 0, 0).unwrap();
    assert_eq!(q.predicates[0].value, FilterValue::Instant(expected));
  }

  #[test]
  fn datetime_digits_are_read_as_utc_in_the_local_zone() {
    let parsed = parse_datetime("2017-01-01T12:00:00Z", FilterZone::Local)
      .unwrap();
    assert_eq!(parsed, Utc.with_ymd_and_hms(2017, 1, 1, 12, 0, 0).unwrap());
  }

  // ── Daylight saving ───────────────────────────────────────────────────────

  fn new_york(
    y: i32,
    mo: u32,
    d: u32,
    h: u32,
    mi: u32,
  ) -> Option<DateTime<Utc>> {
    let wall = chrono::NaiveDate::from_ymd_opt(y, mo, d)
      .unwrap()
      .and_hms_opt(h, mi, 0)
      .unwrap();
    double_shift(&chrono_tz::America::New_York, wall)
  }

  fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
  }

  #[test]
  fn digits_read_as_utc_on_a_transition_day() {
    assert_eq!(new_york(2017, 3, 12, 12, 0), Some(utc(2017, 3, 12, 12, 0)));
    assert_eq!(new_york(2017, 7, 1, 9, 15), Some(utc(2017, 7, 1, 9, 15)));
  }

  #[test]
  fn time_inside_spring_gap_rolls_forward() {
    // 02:30 does not exist on 2017-03-12 in New York; it reads as 03:30 EDT.
    assert_eq!(new_york(2017, 3, 12, 2, 30), Some(utc(2017, 3, 12, 3, 30)));
  }

  #[test]
  fn ambiguous_fall_back_time_takes_the_earlier_instant() {
    assert_eq!(new_york(2017, 11, 5, 1, 30), Some(utc(2017, 11, 5, 1, 30)));
  }

  #[test]
  fn unparsable_datetime_names_the_input() {
    let err = compile_utc(&[("datetime", "01/01/2017")]).unwrap_err();
    assert_eq!(
      out_of_bounds(err),
      "Unable to parse requested date filter [01/01/2017]"
    );
  }

  // ── Zone config ───────────────────────────────────────────────────────────

  #[test]
  fn zone_deserialises_from_config_strings() {
    let z: FilterZone = serde_json::from_str("\"local\"").unwrap();
    assert_eq!(z, FilterZone::Local);

    let z: FilterZone = serde_json::from_str("\"UTC\"").unwrap();
    assert_eq!(z, FilterZone::utc());

    let z: FilterZone = serde_json::from_str("\"+09:00\"").unwrap();
    assert_eq!(z, FilterZone::Fixed(FixedOffset::east_opt(9 * 3600).unwrap()));

    assert!(serde_json::from_str::<FilterZone>("\"mars\"").is_err());
  }
}
