//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map any store error through the core error taxonomy.
  pub fn from_store<E: Into<leadbook_core::Error>>(e: E) -> Self { Self::from(e.into()) }
}

impl From<leadbook_core::Error> for ApiError {
  fn from(e: leadbook_core::Error) -> Self {
    use leadbook_core::Error as E;
    match e {
      E::Validation(v) => Self::BadRequest(v.to_string()),
      E::NotFound(id) => Self::NotFound(format!("lead {id} not found")),
      E::StaleWrite(id) => Self::Conflict(format!("lead {id} was modified concurrently")),
      other => Self::Store(Box::new(other)),
    }
  }
}

impl From<leadbook_core::ValidationError> for ApiError {
  fn from(e: leadbook_core::ValidationError) -> Self { Self::BadRequest(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
