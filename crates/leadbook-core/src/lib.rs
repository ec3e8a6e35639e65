//! Core types and operations for the Leadbook lead tracker.
//!
//! A lead moves through a fixed set of statuses; every move is explained by a
//! note in an append-only audit trail. This crate holds the domain types, the
//! transition rules, the in-memory record collection, the query and count
//! engines, and the service façade that drives a [`store::LeadStore`].
//!
//! No HTTP or database code lives here.

// Store impls use native `async fn`; the trait spells out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod audit;
pub mod counts;
pub mod error;
pub mod filter;
pub mod guard;
pub mod lead;
pub mod record;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{Error, Result, ValidationError};
