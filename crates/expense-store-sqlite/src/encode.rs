//! Encoding and decoding helpers between expense types and the values stored
//! in SQLite columns.
//!
//! Datetimes are stored as epoch milliseconds, totals as decimal text and
//! statuses as their wire spelling.

use chrono::{DateTime, Utc};
use expense_core::{
  expense::{Expense, Status},
  filter::{FilterValue, Predicate},
};
use rusqlite::types::Value;
use rust_decimal::Decimal;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> i64 { dt.timestamp_millis() }

pub fn decode_dt(ms: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_millis(ms)
    .ok_or_else(|| Error::DateParse(format!("timestamp out of range: {ms}")))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_total(total: Decimal) -> String { total.to_string() }

pub fn decode_total(s: &str) -> Result<Decimal> { Ok(s.parse::<Decimal>()?) }

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn encode_status(status: Status) -> &'static str { status.as_str() }

pub fn decode_status(s: &str) -> Result<Status> {
  Status::parse(s).ok_or_else(|| Error::UnknownStatus(s.to_owned()))
}

// ─── Predicates ──────────────────────────────────────────────────────────────

/// Map a predicate onto a `column = ?` condition and its bound value.
///
/// `None` means the predicate can never match: the field is unknown, or the
/// value kind does not fit the column.
pub fn encode_predicate(p: &Predicate) -> Option<(&'static str, Value)> {
  match (p.field.as_str(), &p.value) {
    ("datetime", FilterValue::Instant(at)) => {
      Some(("datetime_ms = ?", Value::Integer(encode_dt(*at))))
    }
    (field, FilterValue::Text(text)) => {
      let cond = match field {
        "id" => "expense_id = ?",
        "merchant" => "merchant = ?",
        "total" => "total = ?",
        "comments" => "comments = ?",
        "status" => "status = ?",
        _ => return None,
      };
      Some((cond, Value::Text(text.clone())))
    }
    _ => None,
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawExpense::from_row`].
pub const EXPENSE_COLUMNS: &str =
  "expense_id, merchant, total, datetime_ms, comments, status";

/// Raw values read directly from an `expenses` row.
pub struct RawExpense {
  pub expense_id:  String,
  pub merchant:    String,
  pub total:       String,
  pub datetime_ms: i64,
  pub comments:    Option<String>,
  pub status:      String,
}

impl RawExpense {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      expense_id:  row.get(0)?,
      merchant:    row.get(1)?,
      total:       row.get(2)?,
      datetime_ms: row.get(3)?,
      comments:    row.get(4)?,
      status:      row.get(5)?,
    })
  }

  pub fn into_expense(self) -> Result<Expense> {
    Ok(Expense {
      id:       self.expense_id,
      merchant: self.merchant,
      total:    decode_total(&self.total)?,
      datetime: decode_dt(self.datetime_ms)?,
      comments: self.comments,
      status:   decode_status(&self.status)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn datetime_keeps_millisecond_precision() {
    let at = Utc.with_ymd_and_hms(2017, 1, 1, 10, 0, 0).unwrap()
      + chrono::TimeDelta::milliseconds(123);
    assert_eq!(decode_dt(encode_dt(at)).unwrap(), at);
  }

  #[test]
  fn total_keeps_scale() {
    let total: Decimal = "12.50".parse().unwrap();
    assert_eq!(encode_total(total), "12.50");
    assert_eq!(decode_total("12.50").unwrap().scale(), 2);
  }

  #[test]
  fn unknown_status_is_an_error() {
    assert!(matches!(decode_status("paid"), Err(Error::UnknownStatus(_))));
  }

  #[test]
  fn predicates_map_to_columns() {
    let p = Predicate { field: "id".into(), value: FilterValue::Text("x".into()) };
    assert_eq!(
      encode_predicate(&p),
      Some(("expense_id = ?", Value::Text("x".into())))
    );

    let at = Utc.with_ymd_and_hms(2017, 1, 1, 10, 0, 0).unwrap();
    let p = Predicate { field: "datetime".into(), value: FilterValue::Instant(at) };
    assert_eq!(
      encode_predicate(&p),
      Some(("datetime_ms = ?", Value::Integer(at.timestamp_millis())))
    );
  }

  #[test]
  fn unknown_fields_never_match() {
    let p = Predicate { field: "vendor".into(), value: FilterValue::Text("x".into()) };
    assert_eq!(encode_predicate(&p), None);

    let p = Predicate { field: "datetime".into(), value: FilterValue::Text("x".into()) };
    assert_eq!(encode_predicate(&p), None);
  }
}
