//! In-memory [`LeadStore`] used by the service tests, with failure and
//! latency injection.

use std::{
  io,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  lead::{Lead, LeadType, NewLead},
  store::{LeadPage, LeadPatch, LeadQuery, LeadStore},
};

pub fn new_lead(name: &str, lead_type: LeadType) -> NewLead {
  NewLead {
    name: name.into(),
    email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
    country_code: "+1".into(),
    phone_number: "5550100".into(),
    lead_type,
    sub_category: None,
    query: format!("Enquiry from {name}"),
    course: None,
  }
}

#[derive(Default)]
pub struct MemoryStore {
  leads:          Mutex<Vec<Lead>>,
  failing:        AtomicBool,
  delay_ms:       AtomicU64,
  write_delay_ms: AtomicU64,
  writes:         AtomicUsize,
}

impl MemoryStore {
  pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

  pub fn set_delay(&self, delay: Duration) {
    self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
  }

  /// Extra latency on `update_lead` only, before the write is applied.
  pub fn set_write_delay(&self, delay: Duration) {
    self.write_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
  }

  /// Number of accepted `update_lead` calls.
  pub fn writes(&self) -> usize { self.writes.load(Ordering::SeqCst) }

  async fn enter(&self) -> Result<()> {
    let delay = self.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
      tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if self.failing.load(Ordering::SeqCst) {
      return Err(Error::remote(io::Error::other("store offline")));
    }
    Ok(())
  }

  fn apply(&self, id: Uuid, patch: LeadPatch) -> Result<Lead> {
    patch.validate()?;

    let mut leads = self.leads.lock().expect("store lock poisoned");
    let lead = leads
      .iter_mut()
      .find(|l| l.id == id)
      .ok_or(Error::NotFound(id))?;
    if patch.expected_updated_at.is_some_and(|at| at != lead.updated_at) {
      return Err(Error::StaleWrite(id));
    }

    for note in patch.notes {
      lead.notes.append(note);
    }
    if let Some(latest) = lead.notes.latest() {
      lead.status = latest.status;
    }
    if let Some(comment) = patch.comment {
      lead.comment = comment;
    }
    lead.updated_at = Utc::now();
    self.writes.fetch_add(1, Ordering::SeqCst);
    Ok(lead.clone())
  }
}

impl LeadStore for MemoryStore {
  type Error = Error;

  async fn list_leads(&self, query: &LeadQuery) -> Result<LeadPage> {
    self.enter().await?;
    let leads = self.leads.lock().expect("store lock poisoned");
    Ok(LeadPage::select(&leads, query))
  }

  async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>> {
    self.enter().await?;
    let leads = self.leads.lock().expect("store lock poisoned");
    Ok(leads.iter().find(|l| l.id == id).cloned())
  }

  async fn update_lead(&self, id: Uuid, patch: LeadPatch) -> Result<Lead> {
    self.enter().await?;
    let delay = self.write_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
      tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    self.apply(id, patch)
  }

  async fn create_lead(&self, input: NewLead) -> Result<Lead> {
    self.enter().await?;
    let lead = Lead::from_intake(Uuid::new_v4(), input, Utc::now());
    self.leads.lock().expect("store lock poisoned").push(lead.clone());
    Ok(lead)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeDelta;

  use super::*;
  use crate::{ValidationError, lead::LeadStatus};

  #[tokio::test]
  async fn memory_store_rejects_bare_status_and_stale_writes() {
    let store = MemoryStore::default();
    let lead = store.create_lead(new_lead("x", LeadType::B2b)).await.unwrap();

    let bare = LeadPatch { status: Some(LeadStatus::Spam), ..Default::default() };
    assert!(matches!(
      store.update_lead(lead.id, bare).await,
      Err(Error::Validation(ValidationError::EmptyNote))
    ));

    let mut stale = LeadPatch::comment("x");
    stale.expected_updated_at = Some(lead.updated_at - TimeDelta::seconds(1));
    assert!(matches!(
      store.update_lead(lead.id, stale).await,
      Err(Error::StaleWrite(_))
    ));
    assert_eq!(store.writes(), 0);
  }
}
