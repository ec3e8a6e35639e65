//! The `LeadStore` trait and supporting query types.
//!
//! The trait is implemented by backing stores (e.g. `leadbook-store-sqlite`,
//! or the HTTP client in `leadbook-cli`). The service façade depends on this
//! abstraction, not on any concrete backend.

use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  ValidationError,
  counts::TypeCounts,
  guard::require_note_text,
  filter::{FilterSet, Tab, filter},
  lead::{Lead, LeadStatus, NewLead, Note},
};

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`LeadStore::list_leads`]. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadQuery {
  pub page:    u32,
  pub limit:   u32,
  pub tab:     Tab,
  pub filters: FilterSet,
}

impl LeadQuery {
  /// An unfiltered page; out-of-range values are clamped.
  pub fn new(page: u32, limit: u32) -> Self {
    Self {
      page:    page.max(1),
      limit:   limit.clamp(1, MAX_LIMIT),
      tab:     Tab::All,
      filters: FilterSet::default(),
    }
  }

  /// Number of matching leads before this page.
  pub fn offset(&self) -> usize {
    (self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize)
  }
}

impl Default for LeadQuery {
  fn default() -> Self { Self::new(1, DEFAULT_LIMIT) }
}

// ─── Page ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub page:        u32,
  pub limit:       u32,
  pub total:       usize,
  pub total_pages: u32,
}

impl Pagination {
  pub fn new(page: u32, limit: u32, total: usize) -> Self {
    let limit = limit.max(1);
    let total_pages = total.div_ceil(limit as usize) as u32;
    Self { page, limit, total, total_pages }
  }
}

/// One page of leads plus the badge counts of the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadPage {
  pub leads:      Vec<Lead>,
  pub pagination: Pagination,
  pub counts:     TypeCounts,
}

impl LeadPage {
  /// Evaluate `query` over the complete collection `all`, which must already
  /// be in display order.
  pub fn select(all: &[Lead], query: &LeadQuery) -> Self {
    let counts = TypeCounts::of(all);
    let matching = filter(all, query.tab, &query.filters);
    let pagination = Pagination::new(query.page, query.limit, matching.len());
    let leads = matching
      .into_iter()
      .skip(query.offset())
      .take(query.limit as usize)
      .cloned()
      .collect();
    Self { leads, pagination, counts }
  }
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// Partial update for [`LeadStore::update_lead`].
///
/// `notes` are appended, never replaced. A status change carries exactly the
/// one new note that explains it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status:              Option<LeadStatus>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comment:             Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub notes:               Vec<Note>,
  /// If set, the write fails with a stale-write error unless the stored
  /// `updatedAt` still equals this value.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub expected_updated_at: Option<DateTime<Utc>>,
}

impl LeadPatch {
  pub fn status_change(note: Note) -> Self {
    Self { status: Some(note.status), notes: vec![note], ..Default::default() }
  }

  pub fn note(note: Note) -> Self {
    Self { notes: vec![note], ..Default::default() }
  }

  pub fn comment(text: impl Into<String>) -> Self {
    Self { comment: Some(text.into()), ..Default::default() }
  }

  /// Checks every backing store runs before writing: note text is never
  /// blank, and a status change comes with exactly one note under that
  /// status.
  pub fn validate(&self) -> Result<(), ValidationError> {
    for note in &self.notes {
      require_note_text(&note.text)?;
    }
    match (self.status, self.notes.as_slice()) {
      (None, _) => Ok(()),
      (Some(_), []) => Err(ValidationError::EmptyNote),
      (Some(status), [note]) if note.status == status => Ok(()),
      (Some(status), _) => Err(ValidationError::UnexplainedStatus(status)),
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a lead backing store.
///
/// Notes are append-only at this boundary as well: `update_lead` adds the
/// patch's notes to the stored log and recomputes the status from the latest
/// note.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait LeadStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// One page of leads matching `query`.
  fn list_leads<'a>(
    &'a self,
    query: &'a LeadQuery,
  ) -> impl Future<Output = Result<LeadPage, Self::Error>> + Send + 'a;

  /// Retrieve a lead by id. Returns `None` if not found.
  fn get_lead(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Lead>, Self::Error>> + Send + '_;

  /// Apply `patch` and return the stored lead.
  fn update_lead(
    &self,
    id: Uuid,
    patch: LeadPatch,
  ) -> impl Future<Output = Result<Lead, Self::Error>> + Send + '_;

  /// Intake: persist a new lead with status `NEW` and no notes.
  fn create_lead(
    &self,
    input: NewLead,
  ) -> impl Future<Output = Result<Lead, Self::Error>> + Send + '_;
}

impl<T: LeadStore> LeadStore for Arc<T> {
  type Error = T::Error;

  fn list_leads<'a>(
    &'a self,
    query: &'a LeadQuery,
  ) -> impl Future<Output = Result<LeadPage, Self::Error>> + Send + 'a {
    (**self).list_leads(query)
  }

  fn get_lead(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Lead>, Self::Error>> + Send + '_ {
    (**self).get_lead(id)
  }

  fn update_lead(
    &self,
    id: Uuid,
    patch: LeadPatch,
  ) -> impl Future<Output = Result<Lead, Self::Error>> + Send + '_ {
    (**self).update_lead(id, patch)
  }

  fn create_lead(
    &self,
    input: NewLead,
  ) -> impl Future<Output = Result<Lead, Self::Error>> + Send + '_ {
    (**self).create_lead(input)
  }
}
