//! Expense types: the stored record, the loosely-typed client payload, and
//! the typed forms the validator produces from it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status of an expense. `Reimbursed` is terminal.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  #[default]
  New,
  Reimbursed,
}

impl Status {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::New => "new",
      Self::Reimbursed => "reimbursed",
    }
  }

  /// Parse the wire spelling. Anything other than `new` or `reimbursed` is
  /// rejected.
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "new" => Some(Self::New),
      "reimbursed" => Some(Self::Reimbursed),
      _ => None,
    }
  }

  /// Whether a record in this status may still be updated or deleted.
  pub fn is_mutable(self) -> bool { matches!(self, Self::New) }
}

// ─── Stored record ───────────────────────────────────────────────────────────

/// A persisted expense. The `id` is assigned by storage and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
  pub id:       String,
  pub merchant: String,
  pub total:    Decimal,
  pub datetime: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comments: Option<String>,
  pub status:   Status,
}

/// A validated expense that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
  pub merchant: String,
  pub total:    Decimal,
  pub datetime: DateTime<Utc>,
  pub comments: Option<String>,
  pub status:   Status,
}

impl NewExpense {
  /// Attach the storage-assigned id.
  pub fn with_id(self, id: String) -> Expense {
    Expense {
      id,
      merchant: self.merchant,
      total: self.total,
      datetime: self.datetime,
      comments: self.comments,
      status: self.status,
    }
  }
}

// ─── Client payload ──────────────────────────────────────────────────────────

/// The body a client submits for create or update. Every field is optional;
/// which ones are required depends on the intent, see [`crate::validate`].
///
/// `status` stays a plain string here so an unknown value surfaces as a
/// validation error rather than a deserialisation failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseInput {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub merchant: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total:    Option<Decimal>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub datetime: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comments: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status:   Option<String>,
}

/// A validated sparse update. `None` means "leave the stored value alone".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpensePatch {
  pub merchant: Option<String>,
  pub total:    Option<Decimal>,
  pub datetime: Option<DateTime<Utc>>,
  pub comments: Option<String>,
  pub status:   Option<Status>,
}
