//! Error types for `leadbook-core`.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::lead::LeadStatus;

/// A request rejected before it reaches the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("note text must not be empty")]
  EmptyNote,

  #[error("unknown lead status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown lead type: {0:?}")]
  UnknownType(String),

  #[error("lead is already in status {0}")]
  NoOpTransition(LeadStatus),

  #[error("a change to {0} must carry exactly one note recorded under {0}")]
  UnexplainedStatus(LeadStatus),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationError),

  #[error("lead not found: {0}")]
  NotFound(Uuid),

  #[error("lead {0} was modified concurrently")]
  StaleWrite(Uuid),

  #[error("backing store failed: {0}")]
  Remote(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("backing store did not answer within {0:?}")]
  Timeout(Duration),
}

impl Error {
  /// Wrap any backend error as a remote failure.
  pub fn remote(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Remote(Box::new(e))
  }

  /// `true` for failures of the backing store itself, including timeouts.
  pub fn is_remote_failure(&self) -> bool {
    matches!(self, Self::Remote(_) | Self::Timeout(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
