//! Payload validation for the create and update intents.
//!
//! Create requires `merchant`, `total` and `datetime`; update treats every
//! field as optional. When a field is present, both intents hold it to the
//! same value rules, checked in the order merchant, total, datetime, status.
//! Messages are part of the public contract and must not change.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
  Error, Result,
  expense::{ExpenseInput, ExpensePatch, NewExpense, Status},
};

const NULL_EXPENSE: &str = "Submitted expense must not be null";

/// Validate a create payload and produce the record to insert.
///
/// A client-supplied `id` is ignored here; the service discards it.
pub fn validate_for_create(input: Option<ExpenseInput>) -> Result<NewExpense> {
  let input = input.ok_or_else(|| invalid(NULL_EXPENSE))?;

  let Some(merchant) = input.merchant else {
    return Err(invalid("Expense merchant is required."));
  };
  let Some(total) = input.total else {
    return Err(invalid("Expense total is required."));
  };
  let Some(datetime) = input.datetime else {
    return Err(invalid("Expense datetime is required."));
  };

  let status = check_values(
    Some(&merchant),
    Some(&total),
    Some(&datetime),
    input.status.as_deref(),
  )?;

  Ok(NewExpense {
    merchant,
    total,
    datetime,
    comments: input.comments,
    status: status.unwrap_or_default(),
  })
}

/// Validate a sparse update payload and produce the patch to merge.
pub fn validate_for_update(input: Option<ExpenseInput>) -> Result<ExpensePatch> {
  let input = input.ok_or_else(|| invalid(NULL_EXPENSE))?;

  if input.id.as_deref().is_some_and(|id| !id.is_empty()) {
    return Err(invalid("Expense Id cannot be updated."));
  }

  let status = check_values(
    input.merchant.as_deref(),
    input.total.as_ref(),
    input.datetime.as_ref(),
    input.status.as_deref(),
  )?;

  Ok(ExpensePatch {
    merchant: input.merchant,
    total: input.total,
    datetime: input.datetime,
    comments: input.comments,
    status,
  })
}

/// Value rules shared by both intents. Absent fields pass.
fn check_values(
  merchant: Option<&str>,
  total:    Option<&Decimal>,
  datetime: Option<&DateTime<Utc>>,
  status:   Option<&str>,
) -> Result<Option<Status>> {
  if merchant.is_some_and(str::is_empty) {
    return Err(invalid("Expense merchant cannot be empty."));
  }

  if total.is_some_and(|t| *t <= Decimal::ZERO) {
    return Err(invalid("Expense total cannot be negative."));
  }

  if datetime.is_some_and(|dt| dt.timestamp_millis() < 0) {
    return Err(invalid(
      "Expense datetime is invalid (cannot be prior to 1970).",
    ));
  }

  status
    .map(|s| {
      Status::parse(s).ok_or_else(|| {
        invalid(
          "Expense status is invalid (must be either 'new' or 'reimbursed')",
        )
      })
    })
    .transpose()
}

fn invalid(message: &str) -> Error { Error::Validation(message.to_owned()) }

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn complete() -> ExpenseInput {
    ExpenseInput {
      merchant: Some("merchant".into()),
      total: Some(Decimal::new(10, 1)),
      datetime: Some(Utc.with_ymd_and_hms(2017, 3, 14, 9, 30, 0).unwrap()),
      ..Default::default()
    }
  }

  fn message(err: Error) -> String {
    match err {
      Error::Validation(m) => m,
      other => panic!("expected a validation error, got {other:?}"),
    }
  }

  fn before_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap()
  }

  // ── Create ────────────────────────────────────────────────────────────────

  #[test]
  fn create_rejects_missing_payload() {
    let err = validate_for_create(None).unwrap_err();
    assert_eq!(message(err), "Submitted expense must not be null");
  }

  #[test]
  fn create_requires_core_fields_in_order() {
    let err = validate_for_create(Some(ExpenseInput::default())).unwrap_err();
    assert_eq!(message(err), "Expense merchant is required.");

    let mut input = complete();
    input.total = None;
    input.datetime = None;
    let err = validate_for_create(Some(input)).unwrap_err();
    assert_eq!(message(err), "Expense total is required.");

    let mut input = complete();
    input.datetime = None;
    let err = validate_for_create(Some(input)).unwrap_err();
    assert_eq!(message(err), "Expense datetime is required.");
  }

  #[test]
  fn create_applies_value_rules() {
    let mut input = complete();
    input.total = Some("-1.0".parse().unwrap());
    let err = validate_for_create(Some(input)).unwrap_err();
    assert_eq!(message(err), "Expense total cannot be negative.");

    let mut input = complete();
    input.total = Some(Decimal::ZERO);
    assert!(validate_for_create(Some(input)).is_err());

    let mut input = complete();
    input.datetime = Some(before_epoch());
    let err = validate_for_create(Some(input)).unwrap_err();
    assert_eq!(
      message(err),
      "Expense datetime is invalid (cannot be prior to 1970)."
    );
  }

  #[test]
  fn create_defaults_status_and_ignores_id() {
    let mut input = complete();
    input.id = Some("client-chosen".into());
    input.comments = Some("lunch".into());

    let new = validate_for_create(Some(input)).unwrap();
    assert_eq!(new.status, Status::New);
    assert_eq!(new.comments.as_deref(), Some("lunch"));
  }

  #[test]
  fn create_keeps_explicit_reimbursed_status() {
    let mut input = complete();
    input.status = Some("reimbursed".into());
    let new = validate_for_create(Some(input)).unwrap();
    assert_eq!(new.status, Status::Reimbursed);
  }

  // ── Update ────────────────────────────────────────────────────────────────

  #[test]
  fn update_rejects_missing_payload() {
    let err = validate_for_update(None).unwrap_err();
    assert_eq!(message(err), "Submitted expense must not be null");
  }

  #[test]
  fn update_rejects_id_relocation() {
    let input = ExpenseInput { id: Some("one".into()), ..Default::default() };
    let err = validate_for_update(Some(input)).unwrap_err();
    assert_eq!(message(err), "Expense Id cannot be updated.");

    // An empty id is not a relocation.
    let input = ExpenseInput { id: Some(String::new()), ..Default::default() };
    assert!(validate_for_update(Some(input)).is_ok());
  }

  #[test]
  fn update_accepts_empty_patch() {
    let patch = validate_for_update(Some(ExpenseInput::default())).unwrap();
    assert_eq!(patch, ExpensePatch::default());
  }

  #[test]
  fn update_constrains_present_fields() {
    let input =
      ExpenseInput { merchant: Some(String::new()), ..Default::default() };
    let err = validate_for_update(Some(input)).unwrap_err();
    assert_eq!(message(err), "Expense merchant cannot be empty.");

    let input = ExpenseInput {
      total: Some("-1.0".parse().unwrap()),
      ..Default::default()
    };
    let err = validate_for_update(Some(input)).unwrap_err();
    assert_eq!(message(err), "Expense total cannot be negative.");

    let input =
      ExpenseInput { datetime: Some(before_epoch()), ..Default::default() };
    let err = validate_for_update(Some(input)).unwrap_err();
    assert_eq!(
      message(err),
      "Expense datetime is invalid (cannot be prior to 1970)."
    );

    let input =
      ExpenseInput { status: Some("invalid".into()), ..Default::default() };
    let err = validate_for_update(Some(input)).unwrap_err();
    assert_eq!(
      message(err),
      "Expense status is invalid (must be either 'new' or 'reimbursed')"
    );
  }

  #[test]
  fn update_reports_merchant_before_status() {
    let input = ExpenseInput {
      merchant: Some(String::new()),
      status: Some("invalid".into()),
      ..Default::default()
    };
    let err = validate_for_update(Some(input)).unwrap_err();
    assert_eq!(message(err), "Expense merchant cannot be empty.");
  }

  #[test]
  fn value_rules_report_in_field_order() {
    let input = ExpenseInput {
      merchant: Some(String::new()),
      total: Some("-1.0".parse().unwrap()),
      datetime: Some(before_epoch()),
      status: Some("invalid".into()),
      ..Default::default()
    };
    let err = validate_for_update(Some(input.clone())).unwrap_err();
    assert_eq!(message(err), "Expense merchant cannot be empty.");
    let err = validate_for_create(Some(input.clone())).unwrap_err();
    assert_eq!(message(err), "Expense merchant cannot be empty.");

    let input = ExpenseInput { merchant: None, ..input };
    let err = validate_for_update(Some(input.clone())).unwrap_err();
    assert_eq!(message(err), "Expense total cannot be negative.");

    let input = ExpenseInput { total: None, ..input };
    let err = validate_for_update(Some(input)).unwrap_err();
    assert_eq!(
      message(err),
      "Expense datetime is invalid (cannot be prior to 1970)."
    );
  }

  #[test]
  fn update_parses_status() {
    let input =
      ExpenseInput { status: Some("reimbursed".into()), ..Default::default() };
    let patch = validate_for_update(Some(input)).unwrap();
    assert_eq!(patch.status, Some(Status::Reimbursed));
  }
}
