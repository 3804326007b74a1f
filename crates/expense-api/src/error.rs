//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Service(#[from] expense_core::Error),

  /// The request could not be decoded at all.
  #[error("bad request: {0}")]
  BadRequest(String),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self::BadRequest(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    Self::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use expense_core::Error as E;

    let status = match &self {
      ApiError::Service(E::Validation(_) | E::OutOfBounds(_)) => {
        StatusCode::BAD_REQUEST
      }
      ApiError::Service(E::NotFound(_)) => StatusCode::NOT_FOUND,
      // Only the summary is exposed; the source stays in the server log.
      ApiError::Service(E::Service { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
