//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! The course reference is stored as compact JSON. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use leadbook_core::{
  audit::NoteLog,
  lead::{Actor, CourseRef, Lead, LeadStatus, LeadType, NewLead, Note},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Status / type ────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<LeadStatus> {
  LeadStatus::parse(s).map_err(|_| Error::BadColumn { column: "status", value: s.to_owned() })
}

pub fn decode_type(s: &str) -> Result<LeadType> {
  LeadType::parse(s).map_err(|_| Error::BadColumn { column: "lead_type", value: s.to_owned() })
}

// ─── CourseRef ────────────────────────────────────────────────────────────────

pub fn encode_course(course: &CourseRef) -> Result<String> { Ok(serde_json::to_string(course)?) }

pub fn decode_course(s: &str) -> Result<CourseRef> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `leads` row. The `status` column is only
/// read by SQL filters; a decoded lead takes its status from its notes.
pub struct RawLead {
  pub lead_id:      String,
  pub name:         String,
  pub email:        String,
  pub country_code: String,
  pub phone_number: String,
  pub lead_type:    String,
  pub sub_category: Option<String>,
  pub query:        String,
  pub comment:      String,
  pub course_json:  Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

/// Column list matching [`RawLead::from_row`].
pub const LEAD_COLUMNS: &str = "lead_id, name, email, country_code, phone_number, lead_type, \
                                sub_category, query, comment, course_json, created_at, updated_at";

impl RawLead {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      lead_id:      row.get(0)?,
      name:         row.get(1)?,
      email:        row.get(2)?,
      country_code: row.get(3)?,
      phone_number: row.get(4)?,
      lead_type:    row.get(5)?,
      sub_category: row.get(6)?,
      query:        row.get(7)?,
      comment:      row.get(8)?,
      course_json:  row.get(9)?,
      created_at:   row.get(10)?,
      updated_at:   row.get(11)?,
    })
  }

  /// Assemble the lead with its notes, which must be in insertion order.
  pub fn into_lead(self, notes: Vec<RawNote>) -> Result<Lead> {
    let intake = NewLead {
      name:         self.name,
      email:        self.email,
      country_code: self.country_code,
      phone_number: self.phone_number,
      lead_type:    decode_type(&self.lead_type)?,
      sub_category: self.sub_category,
      query:        self.query,
      course:       self.course_json.as_deref().map(decode_course).transpose()?,
    };
    let id = decode_uuid(&self.lead_id)?;
    let created_at = decode_dt(&self.created_at)?;
    let mut lead = Lead::from_intake(id, intake, created_at).with_notes(decode_notes(notes)?);
    lead.comment = self.comment;
    lead.updated_at = decode_dt(&self.updated_at)?;
    Ok(lead)
  }
}

pub fn decode_notes(notes: Vec<RawNote>) -> Result<NoteLog> {
  notes.into_iter().map(RawNote::into_note).collect()
}

/// Raw strings read directly from a `notes` row.
pub struct RawNote {
  pub lead_id:    String,
  pub text:       String,
  pub status:     String,
  pub added_by:   String,
  pub created_at: String,
}

impl RawNote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      lead_id:    row.get(0)?,
      text:       row.get(1)?,
      status:     row.get(2)?,
      added_by:   row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_note(self) -> Result<Note> {
    Ok(Note {
      text:       self.text,
      status:     decode_status(&self.status)?,
      added_by:   Actor::new(self.added_by),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone as _, Timelike as _};

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let b = a.with_nanosecond(500_000_000).unwrap();
    let c = a.with_nanosecond(7).unwrap();

    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < ec && ec < eb);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn bad_status_column_is_reported() {
    let err = decode_status("won").unwrap_err();
    assert!(matches!(err, Error::BadColumn { column: "status", .. }));
  }
}
