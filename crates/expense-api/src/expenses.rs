//! Handlers for `/expense` and `/expenses` endpoints.
//!
//! | Method   | Path             | Notes |
//! |----------|------------------|-------|
//! | `POST`   | `/expense`       | 201 `{"id": ...}`; a `null` body is rejected as absent |
//! | `PUT`    | `/expense/{id}`  | Sparse patch; 200 `{"id": ...}` |
//! | `DELETE` | `/expense/{id}`  | 204 |
//! | `GET`    | `/expense/{id}`  | 404 if not found |
//! | `GET`    | `/expenses`      | Any query pairs; `page`/`size` page the result |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use expense_core::{
  ExpenseService,
  expense::{Expense, ExpenseInput},
  store::ExpenseStore,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

type Service<S> = State<Arc<ExpenseService<S>>>;

/// `{"id": ...}`, returned by create and update.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdBody {
  pub id: String,
}

/// `{"contents": [...]}`, returned by list.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListBody {
  pub contents: Vec<Expense>,
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /expense`
pub async fn create<S: ExpenseStore>(
  State(service): Service<S>,
  body: Result<Json<Option<ExpenseInput>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(input) = body?;
  let id = service.create(input).await?;
  Ok((StatusCode::CREATED, Json(IdBody { id })))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /expense/{id}`
pub async fn update<S: ExpenseStore>(
  State(service): Service<S>,
  Path(id): Path<String>,
  body: Result<Json<Option<ExpenseInput>>, JsonRejection>,
) -> Result<Json<IdBody>, ApiError> {
  let Json(input) = body?;
  let id = service.update(&id, input).await?;
  Ok(Json(IdBody { id }))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /expense/{id}`
pub async fn delete_one<S: ExpenseStore>(
  State(service): Service<S>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  service.delete(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /expense/{id}`
pub async fn get_one<S: ExpenseStore>(
  State(service): Service<S>,
  Path(id): Path<String>,
) -> Result<Json<Expense>, ApiError> {
  Ok(Json(service.find(&id).await?))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /expenses[?field=value...][&page=N][&size=N]`
pub async fn list<S: ExpenseStore>(
  State(service): Service<S>,
  query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ListBody>, ApiError> {
  let Query(filters) = query?;
  let contents = service.list(filters).await?;
  Ok(Json(ListBody { contents }))
}
