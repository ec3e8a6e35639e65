//! JSON REST API for Leadbook.
//!
//! Exposes an axum [`Router`] backed by any [`leadbook_core::store::LeadStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", leadbook_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod leads;

use std::sync::Arc;

use axum::{Router, routing::get};
use leadbook_core::store::LeadStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: LeadStore + 'static,
{
  Router::new()
    .route("/leads", get(leads::list::<S>).post(leads::create::<S>))
    .route("/leads/{id}", get(leads::get_one::<S>).patch(leads::update::<S>))
    .route("/leads/{id}/notes", get(leads::notes::<S>))
    .with_state(store)
}
