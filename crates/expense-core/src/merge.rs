//! Applies a validated sparse patch onto a stored expense.
//!
//! Each field is copied explicitly, so there is no lookup that can fail at
//! runtime. `id` never comes from the patch.

use crate::expense::{Expense, ExpensePatch};

/// Separator placed between existing and appended comments.
pub const COMMENT_SEPARATOR: &str = "\n";

/// Merge `patch` into `stored`, keeping the stored identity.
///
/// Present patch values replace stored ones; absent values leave the stored
/// value untouched. Comments are append-only.
pub fn apply(stored: Expense, patch: ExpensePatch) -> Expense {
  Expense {
    id:       stored.id,
    merchant: patch.merchant.unwrap_or(stored.merchant),
    total:    patch.total.unwrap_or(stored.total),
    datetime: patch.datetime.unwrap_or(stored.datetime),
    comments: append_comments(stored.comments, patch.comments),
    status:   patch.status.unwrap_or(stored.status),
  }
}

fn append_comments(
  stored: Option<String>,
  added:  Option<String>,
) -> Option<String> {
  match (stored, added) {
    (Some(mut old), Some(new)) => {
      old.push_str(COMMENT_SEPARATOR);
      old.push_str(&new);
      Some(old)
    }
    (old, new) => new.or(old),
  }
}
