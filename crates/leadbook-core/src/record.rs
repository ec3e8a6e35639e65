//! [`LeadRecords`]: the in-memory lead collection and its mutations.
//!
//! Leads keep the order in which they were loaded. Every mutation refreshes
//! `updated_at`; status is only ever derived from the note log, so after any
//! note has been recorded `lead.status` equals the status of the latest note.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  guard::require_note_text,
  lead::{Actor, Lead, LeadStatus, Note},
};

#[derive(Debug, Clone, Default)]
pub struct LeadRecords {
  leads: Vec<Lead>,
  index: HashMap<Uuid, usize>,
}

impl LeadRecords {
  pub fn new() -> Self { Self::default() }

  /// Drop the current contents and load `leads` in the given order.
  pub fn replace_all(&mut self, leads: impl IntoIterator<Item = Lead>) {
    self.leads = leads.into_iter().collect();
    self.index = self
      .leads
      .iter()
      .enumerate()
      .map(|(i, lead)| (lead.id, i))
      .collect();
  }

  /// Insert `lead`, or replace the loaded copy with the same id in place.
  pub fn upsert(&mut self, lead: Lead) {
    match self.index.get(&lead.id) {
      Some(&i) => self.leads[i] = lead,
      None => {
        self.index.insert(lead.id, self.leads.len());
        self.leads.push(lead);
      }
    }
  }

  /// Take the store's copy of a lead after a write. A copy older than the
  /// one already loaded is ignored, so overlapping writes cannot roll a lead
  /// back.
  pub fn merge(&mut self, lead: Lead) -> &Lead {
    let i = match self.index.get(&lead.id) {
      Some(&i) => {
        if self.leads[i].updated_at <= lead.updated_at {
          self.leads[i] = lead;
        }
        i
      }
      None => {
        let i = self.leads.len();
        self.index.insert(lead.id, i);
        self.leads.push(lead);
        i
      }
    };
    &self.leads[i]
  }

  pub fn get(&self, id: Uuid) -> Option<&Lead> {
    self.index.get(&id).map(|&i| &self.leads[i])
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Lead> { self.leads.iter() }

  pub fn len(&self) -> usize { self.leads.len() }

  pub fn is_empty(&self) -> bool { self.leads.is_empty() }

  fn get_mut(&mut self, id: Uuid) -> Result<&mut Lead> {
    let i = *self.index.get(&id).ok_or(Error::NotFound(id))?;
    Ok(&mut self.leads[i])
  }

  /// Record a validated status-change note and move the lead to the status
  /// of its latest note.
  ///
  /// Re-applying a note that is already in the log changes nothing.
  pub fn apply_status_change(
    &mut self,
    lead_id: Uuid,
    note: Note,
    now: DateTime<Utc>,
  ) -> Result<&Lead> {
    let lead = self.get_mut(lead_id)?;
    record_note(lead, note, now);
    Ok(&*lead)
  }

  /// Overwrite the comment. An empty string clears it.
  pub fn set_comment(
    &mut self,
    lead_id: Uuid,
    text: impl Into<String>,
    now: DateTime<Utc>,
  ) -> Result<&Lead> {
    let lead = self.get_mut(lead_id)?;
    lead.comment = text.into();
    lead.updated_at = now;
    Ok(&*lead)
  }

  /// Log an observation under `status` without going through the transition
  /// guard. The note is stamped with `now`.
  pub fn append_note(
    &mut self,
    lead_id: Uuid,
    text: &str,
    status: LeadStatus,
    actor: Actor,
    now: DateTime<Utc>,
  ) -> Result<&Lead> {
    let text = require_note_text(text)?;
    let lead = self.get_mut(lead_id)?;
    record_note(
      lead,
      Note {
        text: text.to_owned(),
        status,
        added_by: actor,
        created_at: now,
      },
      now,
    );
    Ok(&*lead)
  }
}

fn record_note(lead: &mut Lead, note: Note, now: DateTime<Utc>) {
  if !lead.notes.append(note) {
    return;
  }
  if let Some(latest) = lead.notes.latest() {
    lead.status = latest.status;
  }
  lead.updated_at = now;
}

impl<'a> IntoIterator for &'a LeadRecords {
  type Item = &'a Lead;
  type IntoIter = std::slice::Iter<'a, Lead>;

  fn into_iter(self) -> Self::IntoIter { self.iter() }
}
