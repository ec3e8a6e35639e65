//! [`LeadService`], the operation surface used by the presentation layer.
//!
//! Writes follow one shape: validate locally, send a single combined write to
//! the backing store, and merge the lead the store returns into the in-memory
//! set. The store's copy is authoritative for status, notes and `updatedAt`.
//! A failed or timed-out store call leaves the in-memory set exactly as it
//! was.
//!
//! The in-memory set sits behind a [`RwLock`]; readers never observe a
//! half-applied note because every mutation happens under the write lock. The
//! lock is never held across a store call.

use std::{future::Future, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  audit::NoteOrder,
  counts::TypeCounts,
  filter::{FilterSet, Tab, filter},
  guard,
  lead::{Actor, Lead, LeadStatus, Note},
  record::LeadRecords,
  store::{LeadPage, LeadPatch, LeadQuery, LeadStore, Pagination},
};

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServiceConfig {
  /// Recorded as `addedBy` when a caller does not name an actor.
  pub default_actor:  Actor,
  /// Age after which fetched data is reported as stale.
  pub stale_after:    TimeDelta,
  /// Upper bound on any single store call.
  pub remote_timeout: Duration,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      default_actor:  Actor::admin(),
      stale_after:    TimeDelta::minutes(5),
      remote_timeout: Duration::from_secs(30),
    }
  }
}

// ─── Service ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Snapshot {
  records:    LeadRecords,
  pagination: Option<Pagination>,
  last_fetch: Option<DateTime<Utc>>,
}

pub struct LeadService<S> {
  store:  S,
  config: ServiceConfig,
  state:  RwLock<Snapshot>,
}

impl<S: LeadStore> LeadService<S> {
  pub fn new(store: S) -> Self { Self::with_config(store, ServiceConfig::default()) }

  pub fn with_config(store: S, config: ServiceConfig) -> Self {
    Self { store, config, state: RwLock::new(Snapshot::default()) }
  }

  pub fn config(&self) -> &ServiceConfig { &self.config }

  pub fn store(&self) -> &S { &self.store }

  /// Await a store call under the configured timeout.
  async fn remote<T>(
    &self,
    op: &'static str,
    call: impl Future<Output = Result<T, S::Error>>,
  ) -> Result<T> {
    match tokio::time::timeout(self.config.remote_timeout, call).await {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(e)) => {
        let err: Error = e.into();
        warn!(op, error = %err, "lead store call failed");
        Err(err)
      }
      Err(_) => {
        warn!(op, timeout = ?self.config.remote_timeout, "lead store call timed out");
        Err(Error::Timeout(self.config.remote_timeout))
      }
    }
  }

  async fn ensure_known(&self, id: Uuid) -> Result<()> {
    match self.state.read().await.records.get(id) {
      Some(_) => Ok(()),
      None => Err(Error::NotFound(id)),
    }
  }

  // ── Fetch ─────────────────────────────────────────────────────────────────

  /// Load one unfiltered page and make it the current in-memory set.
  pub async fn fetch_page(&self, page: u32, page_size: u32) -> Result<LeadPage> {
    self.fetch(&LeadQuery::new(page, page_size)).await
  }

  /// Load one page of the leads matching `query` and make it the current
  /// in-memory set. Paging runs over the matching leads only.
  pub async fn fetch(&self, query: &LeadQuery) -> Result<LeadPage> {
    let fetched = self.remote("list_leads", self.store.list_leads(query)).await?;

    let mut state = self.state.write().await;
    state.records.replace_all(fetched.leads.iter().cloned());
    state.pagination = Some(fetched.pagination);
    state.last_fetch = Some(Utc::now());
    debug!(
      page = fetched.pagination.page,
      leads = fetched.leads.len(),
      total = fetched.pagination.total,
      tab = %query.tab,
      "fetched leads"
    );
    Ok(fetched)
  }

  /// Fetch a single lead and merge it into the in-memory set.
  pub async fn load_lead(&self, id: Uuid) -> Result<Lead> {
    let lead = self
      .remote("get_lead", self.store.get_lead(id))
      .await?
      .ok_or(Error::NotFound(id))?;
    self.state.write().await.records.upsert(lead.clone());
    debug!(lead_id = %id, "loaded lead");
    Ok(lead)
  }

  /// `true` if nothing has been fetched yet or the last successful fetch is
  /// older than the staleness threshold.
  pub async fn is_stale(&self, now: DateTime<Utc>) -> bool {
    match self.state.read().await.last_fetch {
      Some(at) => now - at > self.config.stale_after,
      None => true,
    }
  }

  pub async fn last_fetch(&self) -> Option<DateTime<Utc>> {
    self.state.read().await.last_fetch
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Move a lead to `status`, explained by `note_text`, as the default actor.
  pub async fn change_status(&self, id: Uuid, status: &str, note_text: &str) -> Result<Lead> {
    let actor = self.config.default_actor.clone();
    self.change_status_by(id, status, note_text, &actor).await
  }

  pub async fn change_status_by(
    &self,
    id: Uuid,
    status: &str,
    note_text: &str,
    actor: &Actor,
  ) -> Result<Lead> {
    let note = {
      let state = self.state.read().await;
      let lead = state.records.get(id).ok_or(Error::NotFound(id))?;
      guard::request_status_change(lead, status, note_text, actor, Utc::now())?
    };

    let stored = self
      .remote("update_lead", self.store.update_lead(id, LeadPatch::status_change(note)))
      .await?;

    let lead = self.state.write().await.records.merge(stored).clone();
    info!(lead_id = %id, status = %lead.status(), actor = %actor, "lead status changed");
    Ok(lead)
  }

  /// Log an observation under `status` as the default actor.
  pub async fn add_note(&self, id: Uuid, text: &str, status: &str) -> Result<Lead> {
    let actor = self.config.default_actor.clone();
    self.add_note_by(id, text, status, &actor).await
  }

  pub async fn add_note_by(
    &self,
    id: Uuid,
    text: &str,
    status: &str,
    actor: &Actor,
  ) -> Result<Lead> {
    let status = LeadStatus::parse(status)?;
    let text = guard::require_note_text(text)?;
    self.ensure_known(id).await?;

    let note = Note {
      text: text.to_owned(),
      status,
      added_by: actor.clone(),
      created_at: Utc::now(),
    };
    let stored = self
      .remote("update_lead", self.store.update_lead(id, LeadPatch::note(note)))
      .await?;

    let lead = self.state.write().await.records.merge(stored).clone();
    info!(lead_id = %id, status = %lead.status(), "note added");
    Ok(lead)
  }

  /// Overwrite the lead's comment; an empty string clears it.
  pub async fn set_comment(&self, id: Uuid, comment: &str) -> Result<Lead> {
    self.ensure_known(id).await?;
    let stored = self
      .remote("update_lead", self.store.update_lead(id, LeadPatch::comment(comment)))
      .await?;

    let lead = self.state.write().await.records.merge(stored).clone();
    info!(lead_id = %id, "comment updated");
    Ok(lead)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// The in-memory leads visible on `tab` under `filters`.
  pub async fn view(&self, tab: Tab, filters: &FilterSet) -> Vec<Lead> {
    let state = self.state.read().await;
    filter(&state.records, tab, filters).into_iter().cloned().collect()
  }

  /// Tab badge counts over the whole in-memory set.
  pub async fn counts(&self) -> TypeCounts {
    TypeCounts::of(&self.state.read().await.records)
  }

  pub async fn lead(&self, id: Uuid) -> Option<Lead> {
    self.state.read().await.records.get(id).cloned()
  }

  pub async fn notes(&self, id: Uuid, order: NoteOrder) -> Result<Vec<Note>> {
    let state = self.state.read().await;
    let lead = state.records.get(id).ok_or(Error::NotFound(id))?;
    Ok(lead.notes().sorted(order).into_iter().cloned().collect())
  }

  pub async fn pagination(&self) -> Option<Pagination> {
    self.state.read().await.pagination
  }
}
