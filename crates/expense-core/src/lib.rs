//! Core types and service logic for the expense store.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::ExpenseStore`]; transports drive
//! [`service::ExpenseService`].

// Store implementations use native `async fn` against the `impl Future + Send`
// signatures in `store`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod expense;
pub mod filter;
pub mod merge;
pub mod service;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
pub use service::ExpenseService;
