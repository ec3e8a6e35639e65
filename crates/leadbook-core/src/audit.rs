//! The append-only note log kept on every lead.
//!
//! [`NoteLog`] only grows. Outside this crate it can be read and built from a
//! sequence of persisted notes, but there is no way to edit or remove an
//! entry, and appending is reserved to the record store.

use serde::{Deserialize, Serialize};

use crate::lead::{Lead, Note};

/// Presentation order for a lead's notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoteOrder {
  /// History views.
  #[default]
  #[serde(rename = "newest")]
  NewestFirst,
  /// Status-dialog context.
  #[serde(rename = "oldest")]
  OldestFirst,
}

/// Notes in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteLog {
  notes: Vec<Note>,
}

impl NoteLog {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.notes.len() }

  pub fn is_empty(&self) -> bool { self.notes.is_empty() }

  /// Notes in the order they were appended.
  pub fn iter(&self) -> std::slice::Iter<'_, Note> { self.notes.iter() }

  pub fn contains(&self, note: &Note) -> bool { self.notes.contains(note) }

  /// The note with the greatest `created_at`; on a tie, the one appended
  /// last.
  pub fn latest(&self) -> Option<&Note> {
    // `max_by_key` yields the last of several equal maxima.
    self.notes.iter().max_by_key(|n| n.created_at)
  }

  /// Append `note` unless an identical note is already present. Returns
  /// whether the log grew.
  pub(crate) fn append(&mut self, note: Note) -> bool {
    if self.contains(&note) {
      return false;
    }
    self.notes.push(note);
    true
  }

  /// A sorted view over the log. The log itself is left untouched.
  pub fn sorted(&self, order: NoteOrder) -> Vec<&Note> {
    let mut view: Vec<&Note> = self.notes.iter().collect();
    // Stable: ties keep insertion order.
    view.sort_by_key(|n| n.created_at);
    if order == NoteOrder::NewestFirst {
      view.reverse();
    }
    view
  }
}

impl FromIterator<Note> for NoteLog {
  fn from_iter<I: IntoIterator<Item = Note>>(iter: I) -> Self {
    Self { notes: iter.into_iter().collect() }
  }
}

impl<'a> IntoIterator for &'a NoteLog {
  type Item = &'a Note;
  type IntoIter = std::slice::Iter<'a, Note>;

  fn into_iter(self) -> Self::IntoIter { self.iter() }
}

/// Sorted view of a lead's notes.
pub fn sorted_notes(lead: &Lead, order: NoteOrder) -> Vec<&Note> {
  lead.notes.sorted(order)
}
