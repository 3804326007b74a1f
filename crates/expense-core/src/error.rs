//! Error types for `expense-core`.
//!
//! Every service operation fails with exactly one of these kinds. Transports
//! map them to their own status codes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The payload violates a structural or business rule.
  #[error("{0}")]
  Validation(String),

  /// The referenced id does not resolve to a stored record.
  #[error("{0}")]
  NotFound(String),

  /// Paging or filter values are outside the allowed ranges.
  #[error("{0}")]
  OutOfBounds(String),

  /// Unexpected internal failure, usually from the storage backend.
  #[error("{message}")]
  Service {
    message: String,
    #[source]
    source:  Box<dyn std::error::Error + Send + Sync>,
  },
}

impl Error {
  pub(crate) fn not_found(id: &str) -> Self {
    Self::NotFound(format!("Expense not found for id [{id}]"))
  }

  pub(crate) fn service<E>(message: &str, source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Service { message: message.to_owned(), source: Box::new(source) }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
