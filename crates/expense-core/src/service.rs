//! [`ExpenseService`]: create, update, delete, find and list over any
//! [`ExpenseStore`], enforcing the reimbursed-status gate.

use crate::{
  Error, Result,
  expense::{Expense, ExpenseInput},
  filter::{self, FilterZone},
  merge,
  store::{ExpenseStore, Guarded},
  validate::{validate_for_create, validate_for_update},
};

const CANNOT_UPDATE: &str = "Reimbursed expense cannot be updated.";
const CANNOT_DELETE: &str = "Reimbursed expense cannot be deleted.";

/// The expense service. Holds no mutable state of its own; everything lives
/// in the store.
#[derive(Debug, Clone)]
pub struct ExpenseService<S> {
  store: S,
  zone:  FilterZone,
}

impl<S: ExpenseStore> ExpenseService<S> {
  /// A service that reads `datetime` filters in the process-local timezone.
  pub fn new(store: S) -> Self { Self::with_zone(store, FilterZone::Local) }

  pub fn with_zone(store: S, zone: FilterZone) -> Self { Self { store, zone } }

  pub fn store(&self) -> &S { &self.store }

  /// Validate and persist a new expense, returning its id.
  ///
  /// Any client-supplied id is discarded; status defaults to `new`.
  pub async fn create(&self, input: Option<ExpenseInput>) -> Result<String> {
    let new = validate_for_create(input)?;

    let stored = self
      .store
      .insert(new)
      .await
      .map_err(|e| storage_failure("Error creating expense.", e))?;

    tracing::info!(id = %stored.id, "expense created");
    Ok(stored.id)
  }

  /// Apply a sparse patch to the expense `id`, returning the id.
  pub async fn update(
    &self,
    id: &str,
    input: Option<ExpenseInput>,
  ) -> Result<String> {
    let stored = self.load(id).await?;

    if !stored.status.is_mutable() {
      return Err(Error::Validation(CANNOT_UPDATE.into()));
    }

    let patch = validate_for_update(input)?;
    let merged = merge::apply(stored, patch);

    let outcome = self
      .store
      .save(merged)
      .await
      .map_err(|e| storage_failure("Error updating expense.", e))?;

    match outcome {
      Guarded::Applied(saved) => {
        tracing::info!(id = %saved.id, status = saved.status.as_str(), "expense updated");
        Ok(saved.id)
      }
      Guarded::Reimbursed => {
        tracing::warn!(id, "update refused: reimbursed concurrently");
        Err(Error::Validation(CANNOT_UPDATE.into()))
      }
      Guarded::Missing => Err(Error::not_found(id)),
    }
  }

  /// Delete the expense `id`.
  pub async fn delete(&self, id: &str) -> Result<()> {
    let stored = self.load(id).await?;

    if !stored.status.is_mutable() {
      return Err(Error::Validation(CANNOT_DELETE.into()));
    }

    let outcome = self
      .store
      .delete_by_id(id)
      .await
      .map_err(|e| storage_failure("Error deleting expense.", e))?;

    match outcome {
      Guarded::Applied(()) => {
        tracing::info!(id, "expense deleted");
        Ok(())
      }
      Guarded::Reimbursed => {
        tracing::warn!(id, "delete refused: reimbursed concurrently");
        Err(Error::Validation(CANNOT_DELETE.into()))
      }
      Guarded::Missing => Err(Error::not_found(id)),
    }
  }

  /// Fetch a single expense.
  pub async fn find(&self, id: &str) -> Result<Expense> { self.load(id).await }

  /// List one page of expenses matching `filters`.
  ///
  /// See [`crate::filter`] for the filter vocabulary.
  pub async fn list<I>(&self, filters: I) -> Result<Vec<Expense>>
  where
    I: IntoIterator<Item = (String, String)>,
  {
    let query = filter::compile(filters, self.zone)?;
    tracing::debug!(?query, "listing expenses");

    let page = if query.is_unfiltered() {
      self.store.find_all(query.page, query.size).await
    } else {
      self
        .store
        .find_by_predicates(&query.predicates, query.page, query.size)
        .await
    };

    page.map_err(|e| storage_failure("Error listing expenses.", e))
  }

  async fn load(&self, id: &str) -> Result<Expense> {
    if id.is_empty() {
      return Err(Error::not_found(id));
    }

    self
      .store
      .find_by_id(id)
      .await
      .map_err(|e| storage_failure("Error finding expense.", e))?
      .ok_or_else(|| Error::not_found(id))
  }
}

fn storage_failure<E>(message: &str, source: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  tracing::error!(error = %source, "{message}");
  Error::service(message, source)
}
