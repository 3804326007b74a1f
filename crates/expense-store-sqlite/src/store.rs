//! [`SqliteStore`], the SQLite implementation of [`ExpenseStore`].

use std::path::Path;

use expense_core::{
  expense::{Expense, NewExpense, Status},
  filter::Predicate,
  store::{ExpenseStore, Guarded},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior, types::Value};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    EXPENSE_COLUMNS, RawExpense, decode_dt, encode_dt, encode_predicate,
    encode_status, encode_total,
  },
  error::Error,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An expense store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for SqliteStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SqliteStore").finish_non_exhaustive()
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a windowed `SELECT` over `expenses` in insertion order.
  async fn select_page(
    &self,
    conds: Vec<&'static str>,
    mut params: Vec<Value>,
    page: u32,
    size: u32,
  ) -> Result<Vec<Expense>> {
    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let offset = i64::from(page) * i64::from(size);
    params.push(Value::Integer(i64::from(size)));
    params.push(Value::Integer(offset));

    let raws: Vec<RawExpense> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {EXPENSE_COLUMNS} FROM expenses
           {where_clause}
           ORDER BY seq
           LIMIT ? OFFSET ?"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawExpense::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawExpense::into_expense).collect()
  }
}

/// Read the stored status of `id` inside `tx`.
fn stored_status(
  tx: &rusqlite::Transaction<'_>,
  id: &str,
) -> rusqlite::Result<Option<String>> {
  tx.query_row(
    "SELECT status FROM expenses WHERE expense_id = ?1",
    rusqlite::params![id],
    |r| r.get(0),
  )
  .optional()
}

/// Whether a stored status string still permits writes. Unknown spellings are
/// treated as locked.
fn writable(status: &str) -> bool {
  Status::parse(status).is_some_and(Status::is_mutable)
}

// ─── ExpenseStore impl ───────────────────────────────────────────────────────

impl ExpenseStore for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn find_by_id(&self, id: &str) -> Result<Option<Expense>> {
    let id = id.to_owned();

    let raw: Option<RawExpense> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE expense_id = ?1"
            ),
            rusqlite::params![id],
            RawExpense::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawExpense::into_expense).transpose()
  }

  async fn find_all(&self, page: u32, size: u32) -> Result<Vec<Expense>> {
    self.select_page(Vec::new(), Vec::new(), page, size).await
  }

  async fn find_by_predicates(
    &self,
    predicates: &[Predicate],
    page: u32,
    size: u32,
  ) -> Result<Vec<Expense>> {
    let mut conds = Vec::with_capacity(predicates.len());
    let mut params = Vec::with_capacity(predicates.len() + 2);

    for predicate in predicates {
      let Some((cond, value)) = encode_predicate(predicate) else {
        tracing::debug!(field = %predicate.field, "predicate matches nothing");
        return Ok(Vec::new());
      };
      conds.push(cond);
      params.push(value);
    }

    self.select_page(conds, params, page, size).await
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert(&self, expense: NewExpense) -> Result<Expense> {
    let id = Uuid::new_v4().hyphenated().to_string();

    let id_str       = id.clone();
    let merchant     = expense.merchant.clone();
    let total_str    = encode_total(expense.total);
    let datetime_ms  = encode_dt(expense.datetime);
    let comments     = expense.comments.clone();
    let status_str   = encode_status(expense.status);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO expenses (
             expense_id, merchant, total, datetime_ms, comments, status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            merchant,
            total_str,
            datetime_ms,
            comments,
            status_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    // Report what was stored, at storage precision.
    let mut stored = expense.with_id(id);
    stored.datetime = decode_dt(datetime_ms)?;
    Ok(stored)
  }

  async fn save(&self, expense: Expense) -> Result<Guarded<Expense>> {
    let id_str      = expense.id.clone();
    let merchant    = expense.merchant.clone();
    let total_str   = encode_total(expense.total);
    let datetime_ms = encode_dt(expense.datetime);
    let comments    = expense.comments.clone();
    let status_str  = encode_status(expense.status);

    let outcome: Guarded<()> = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let outcome = match stored_status(&tx, &id_str)? {
          None => Guarded::Missing,
          Some(s) if !writable(&s) => Guarded::Reimbursed,
          Some(_) => {
            tx.execute(
              "UPDATE expenses
               SET merchant = ?2, total = ?3, datetime_ms = ?4,
                   comments = ?5, status = ?6
               WHERE expense_id = ?1",
              rusqlite::params![
                id_str,
                merchant,
                total_str,
                datetime_ms,
                comments,
                status_str,
              ],
            )?;
            Guarded::Applied(())
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    let mut saved = expense;
    saved.datetime = decode_dt(datetime_ms)?;
    Ok(outcome.map(|()| saved))
  }

  async fn delete_by_id(&self, id: &str) -> Result<Guarded<()>> {
    let id = id.to_owned();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let outcome = match stored_status(&tx, &id)? {
          None => Guarded::Missing,
          Some(s) if !writable(&s) => Guarded::Reimbursed,
          Some(_) => {
            tx.execute(
              "DELETE FROM expenses WHERE expense_id = ?1",
              rusqlite::params![id],
            )?;
            Guarded::Applied(())
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    Ok(outcome)
  }
}
