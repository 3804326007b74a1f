//! JSON REST API for the expense service.
//!
//! Exposes an axum [`Router`] backed by an [`ExpenseService`] over any
//! [`ExpenseStore`]. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(expense_api::api_router(Arc::new(service)))
//! ```

pub mod error;
pub mod expenses;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use expense_core::{ExpenseService, store::ExpenseStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: Arc<ExpenseService<S>>) -> Router<()>
where
  S: ExpenseStore + 'static,
{
  Router::new()
    .route("/expense", post(expenses::create::<S>))
    .route(
      "/expense/{id}",
      get(expenses::get_one::<S>)
        .put(expenses::update::<S>)
        .delete(expenses::delete_one::<S>),
    )
    .route("/expenses", get(expenses::list::<S>))
    .with_state(service)
}
