//! Lead and note types.
//!
//! Contact attributes, type, query and creation time are owned by the intake
//! process and never change here. Status, comment and the note log are the
//! only mutable parts of a lead.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{ValidationError, audit::NoteLog};

// ─── Status ──────────────────────────────────────────────────────────────────

/// The fixed lifecycle vocabulary. The string forms are the wire values and
/// are case-sensitive.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
pub enum LeadStatus {
  #[default]
  #[serde(rename = "NEW")]
  #[strum(serialize = "NEW")]
  New,
  #[serde(rename = "Attempted to Contact")]
  #[strum(serialize = "Attempted to Contact")]
  AttemptedToContact,
  #[serde(rename = "Not Contacted")]
  #[strum(serialize = "Not Contacted")]
  NotContacted,
  #[serde(rename = "In-conversation")]
  #[strum(serialize = "In-conversation")]
  InConversation,
  #[serde(rename = "Prospect")]
  #[strum(serialize = "Prospect")]
  Prospect,
  #[serde(rename = "Not-Eligible")]
  #[strum(serialize = "Not-Eligible")]
  NotEligible,
  #[serde(rename = "Not-Interested")]
  #[strum(serialize = "Not-Interested")]
  NotInterested,
  #[serde(rename = "Spam")]
  #[strum(serialize = "Spam")]
  Spam,
  #[serde(rename = "Opportunity")]
  #[strum(serialize = "Opportunity")]
  Opportunity,
  #[serde(rename = "Contact-in-Future")]
  #[strum(serialize = "Contact-in-Future")]
  ContactInFuture,
  #[serde(rename = "Closed-Won")]
  #[strum(serialize = "Closed-Won")]
  ClosedWon,
  #[serde(rename = "Closed-Lost")]
  #[strum(serialize = "Closed-Lost")]
  ClosedLost,
}

impl LeadStatus {
  /// Parse a wire value, rejecting anything outside the vocabulary.
  pub fn parse(s: &str) -> Result<Self, ValidationError> {
    Self::from_str(s).map_err(|_| ValidationError::UnknownStatus(s.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Type ────────────────────────────────────────────────────────────────────

/// The business channel a lead came through.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeadType {
  B2i,
  B2b,
  B2c,
  B2g,
  General,
}

impl LeadType {
  pub fn parse(s: &str) -> Result<Self, ValidationError> {
    Self::from_str(s).map_err(|_| ValidationError::UnknownType(s.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// Who recorded a note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
  /// The single operator identity used when nobody else is named.
  pub const ADMIN: &'static str = "Admin";

  pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

  pub fn admin() -> Self { Self::new(Self::ADMIN) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for Actor {
  fn default() -> Self { Self::admin() }
}

impl fmt::Display for Actor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Course reference ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCategory {
  pub id:   String,
  pub name: String,
}

/// Read-only view of the course a lead enquired about. Owned by the course
/// catalog; only used for filtering and search here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
  pub id:       String,
  pub title:    String,
  pub slug:     String,
  #[serde(default)]
  pub category: Option<CourseCategory>,
}

// ─── Note ────────────────────────────────────────────────────────────────────

/// One audit-trail entry. Never edited once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
  pub text:       String,
  /// The status in effect when the note was recorded.
  pub status:     LeadStatus,
  #[serde(default)]
  pub added_by:   Actor,
  pub created_at: DateTime<Utc>,
}

// ─── Lead ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
  pub id:           Uuid,
  pub name:         String,
  pub email:        String,
  pub country_code: String,
  pub phone_number: String,
  #[serde(rename = "type")]
  pub lead_type:    LeadType,
  #[serde(default)]
  pub sub_category: Option<String>,
  pub query:        String,
  pub(crate) status: LeadStatus,
  #[serde(default)]
  pub comment:      String,
  #[serde(default)]
  pub(crate) notes: NoteLog,
  #[serde(default)]
  pub course:       Option<CourseRef>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Lead {
  /// A freshly-ingested lead: status `NEW`, no notes, no comment.
  pub fn from_intake(id: Uuid, input: NewLead, now: DateTime<Utc>) -> Self {
    Self {
      id,
      name: input.name,
      email: input.email,
      country_code: input.country_code,
      phone_number: input.phone_number,
      lead_type: input.lead_type,
      sub_category: input.sub_category,
      query: input.query,
      status: LeadStatus::New,
      comment: String::new(),
      notes: NoteLog::new(),
      course: input.course,
      created_at: now,
      updated_at: now,
    }
  }

  /// Attach a persisted note history. The status follows the latest note,
  /// or stays `NEW` if there is none.
  pub fn with_notes(mut self, notes: NoteLog) -> Self {
    self.status = notes.latest().map_or(LeadStatus::New, |n| n.status);
    self.notes = notes;
    self
  }

  pub fn status(&self) -> LeadStatus { self.status }

  pub fn notes(&self) -> &NoteLog { &self.notes }
}

/// Intake input. Everything the upstream form collects; the store assigns
/// the id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
  pub name:         String,
  pub email:        String,
  #[serde(default)]
  pub country_code: String,
  #[serde(default)]
  pub phone_number: String,
  #[serde(rename = "type")]
  pub lead_type:    LeadType,
  #[serde(default)]
  pub sub_category: Option<String>,
  #[serde(default)]
  pub query:        String,
  #[serde(default)]
  pub course:       Option<CourseRef>,
}
