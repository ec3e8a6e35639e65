//! Validation of status changes.
//!
//! The status graph is flat: any status may move to any other one. What the
//! guard enforces is that the move is real (not to the current status) and
//! that it is explained by a non-empty note. Nothing here mutates a lead; the
//! returned [`Note`] is applied by the caller once the store has accepted it.

use chrono::{DateTime, Utc};

use crate::{
  ValidationError,
  lead::{Actor, Lead, LeadStatus, Note},
};

/// Trim `text` and reject it if nothing is left.
pub fn require_note_text(text: &str) -> Result<&str, ValidationError> {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Err(ValidationError::EmptyNote);
  }
  Ok(trimmed)
}

/// Validate a status change given as a wire string and build its note.
pub fn request_status_change(
  lead: &Lead,
  new_status: &str,
  note_text: &str,
  actor: &Actor,
  now: DateTime<Utc>,
) -> Result<Note, ValidationError> {
  let new_status = LeadStatus::parse(new_status)?;
  transition(lead, new_status, note_text, actor, now)
}

/// Validate a typed status change and build its note.
pub fn transition(
  lead: &Lead,
  new_status: LeadStatus,
  note_text: &str,
  actor: &Actor,
  now: DateTime<Utc>,
) -> Result<Note, ValidationError> {
  if new_status == lead.status {
    return Err(ValidationError::NoOpTransition(new_status));
  }
  let text = require_note_text(note_text)?;

  Ok(Note {
    text: text.to_owned(),
    status: new_status,
    added_by: actor.clone(),
    created_at: now,
  })
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::lead::{LeadType, NewLead};

  fn lead() -> Lead {
    Lead::from_intake(
      Uuid::new_v4(),
      NewLead {
        name:         "L1".into(),
        email:        "l1@example.com".into(),
        country_code: String::new(),
        phone_number: String::new(),
        lead_type:    LeadType::B2b,
        sub_category: None,
        query:        String::new(),
        course:       None,
      },
      Utc::now(),
    )
  }

  #[test]
  fn builds_note_for_valid_change() {
    let l = lead();
    let now = Utc::now();
    let note =
      request_status_change(&l, "In-conversation", "  Called, interested ", &Actor::admin(), now)
        .unwrap();

    assert_eq!(note.status, LeadStatus::InConversation);
    assert_eq!(note.text, "Called, interested");
    assert_eq!(note.added_by.as_str(), "Admin");
    assert_eq!(note.created_at, now);
    // Pure: the lead is untouched.
    assert_eq!(l.status, LeadStatus::New);
    assert!(l.notes.is_empty());
  }

  #[test]
  fn rejects_unknown_status() {
    let err =
      request_status_change(&lead(), "Won", "done", &Actor::admin(), Utc::now()).unwrap_err();
    assert_eq!(err, ValidationError::UnknownStatus("Won".into()));
  }

  #[test]
  fn rejects_same_status() {
    let err =
      request_status_change(&lead(), "NEW", "still new", &Actor::admin(), Utc::now()).unwrap_err();
    assert_eq!(err, ValidationError::NoOpTransition(LeadStatus::New));
  }

  #[test]
  fn rejects_blank_note() {
    for text in ["", "   ", "\n\t"] {
      let err = request_status_change(&lead(), "Spam", text, &Actor::admin(), Utc::now())
        .unwrap_err();
      assert_eq!(err, ValidationError::EmptyNote);
    }
  }

  #[test]
  fn any_status_may_follow_any_other() {
    let mut l = lead();
    l.status = LeadStatus::ClosedWon;
    let note = transition(&l, LeadStatus::New, "reopened", &Actor::new("ops"), Utc::now()).unwrap();
    assert_eq!(note.status, LeadStatus::New);
    assert_eq!(note.added_by, Actor::new("ops"));
  }
}
