//! Error type for `leadbook-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] leadbook_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value in database: {value:?}")]
  BadColumn { column: &'static str, value: String },

  #[error("lead not found: {0}")]
  LeadNotFound(uuid::Uuid),

  #[error("lead {0} was modified concurrently")]
  StaleWrite(uuid::Uuid),
}

impl From<leadbook_core::ValidationError> for Error {
  fn from(e: leadbook_core::ValidationError) -> Self { Self::Core(e.into()) }
}

impl From<Error> for leadbook_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(inner) => inner,
      Error::LeadNotFound(id) => Self::NotFound(id),
      Error::StaleWrite(id) => Self::StaleWrite(id),
      other => Self::remote(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
