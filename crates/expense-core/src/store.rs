//! The `ExpenseStore` trait and its write-outcome type.
//!
//! The trait is implemented by storage backends (e.g. `expense-store-sqlite`).
//! [`crate::ExpenseService`] depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::{
  expense::{Expense, NewExpense},
  filter::Predicate,
};

// ─── Conditional writes ──────────────────────────────────────────────────────

/// Outcome of a write that only applies to a record still open for mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
  /// The write happened.
  Applied(T),
  /// The stored record is reimbursed; nothing was written.
  Reimbursed,
  /// No record with that id exists; nothing was written.
  Missing,
}

impl<T> Guarded<T> {
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Guarded<U> {
    match self {
      Self::Applied(t) => Guarded::Applied(f(t)),
      Self::Reimbursed => Guarded::Reimbursed,
      Self::Missing => Guarded::Missing,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an expense storage backend.
///
/// Overwrites and deletes are conditional: the backend must check that the
/// stored status is not reimbursed and perform the write as one atomic step.
/// The service relies on this instead of its own read-then-write.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ExpenseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve an expense by id. Returns `None` if not found.
  fn find_by_id<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Expense>, Self::Error>> + Send + 'a;

  /// One page of all expenses in insertion order, skipping `page * size`.
  fn find_all(
    &self,
    page: u32,
    size: u32,
  ) -> impl Future<Output = Result<Vec<Expense>, Self::Error>> + Send + '_;

  /// One page of the expenses matching every predicate, with the same
  /// windowing as [`ExpenseStore::find_all`]. A predicate on a field the
  /// backend does not know matches nothing.
  fn find_by_predicates<'a>(
    &'a self,
    predicates: &'a [Predicate],
    page: u32,
    size: u32,
  ) -> impl Future<Output = Result<Vec<Expense>, Self::Error>> + Send + 'a;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist a new expense and return it with its storage-assigned id.
  fn insert(
    &self,
    expense: NewExpense,
  ) -> impl Future<Output = Result<Expense, Self::Error>> + Send + '_;

  /// Overwrite the stored expense with the same id, unless it is reimbursed.
  fn save(
    &self,
    expense: Expense,
  ) -> impl Future<Output = Result<Guarded<Expense>, Self::Error>> + Send + '_;

  /// Delete the expense with `id`, unless it is reimbursed.
  fn delete_by_id<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Guarded<()>, Self::Error>> + Send + 'a;
}
