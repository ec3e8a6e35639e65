//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use leadbook_core::{
  audit::NoteOrder,
  counts::TypeCounts,
  lead::{Lead, LeadType},
  store::Pagination,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn when(at: DateTime<Utc>) -> String { at.format(TIME_FORMAT).to_string() }

/// Truncate to `width` characters, marking the cut with `…`.
fn clip(s: &str, width: usize) -> String {
  if s.chars().count() <= width {
    return s.to_owned();
  }
  let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
  out.push('…');
  out
}

/// One row per lead: id, type, status, name, email, last update.
pub fn lead_table(leads: &[Lead]) -> String {
  if leads.is_empty() {
    return "no leads match\n".to_owned();
  }
  let mut out = String::new();
  let _ = writeln!(
    out,
    "{:<36}  {:<7}  {:<20}  {:<24}  {:<28}  {}",
    "ID", "TYPE", "STATUS", "NAME", "EMAIL", "UPDATED"
  );
  for lead in leads {
    let _ = writeln!(
      out,
      "{:<36}  {:<7}  {:<20}  {:<24}  {:<28}  {}",
      lead.id,
      lead.lead_type,
      lead.status(),
      clip(&lead.name, 24),
      clip(&lead.email, 28),
      when(lead.updated_at),
    );
  }
  out
}

/// Tab badges in display order; `general` has no tab.
pub fn counts_line(counts: &TypeCounts) -> String {
  let mut line = format!("all {}", counts.all);
  for t in [LeadType::B2i, LeadType::B2b, LeadType::B2c, LeadType::B2g] {
    if let Some(n) = counts.for_type(t) {
      let _ = write!(line, " · {t} {n}");
    }
  }
  line
}

pub fn pagination_line(p: &Pagination) -> String {
  format!("page {} of {} ({} leads)", p.page, p.total_pages.max(1), p.total)
}

/// Full detail view: contact block, comment, then the note history.
pub fn lead_detail(lead: &Lead, order: NoteOrder) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{} <{}>", lead.name, lead.email);
  let _ = writeln!(out, "  id:      {}", lead.id);
  let _ = writeln!(out, "  phone:   {} {}", lead.country_code, lead.phone_number);
  let _ = writeln!(out, "  type:    {}", lead.lead_type);
  if let Some(sub) = &lead.sub_category {
    let _ = writeln!(out, "  sub:     {sub}");
  }
  if let Some(course) = &lead.course {
    let _ = writeln!(out, "  course:  {}", course.title);
  }
  let _ = writeln!(out, "  status:  {}", lead.status());
  let _ = writeln!(out, "  query:   {}", lead.query);
  if !lead.comment.is_empty() {
    let _ = writeln!(out, "  comment: {}", lead.comment);
  }
  let _ = writeln!(out, "  created: {}", when(lead.created_at));

  if lead.notes().is_empty() {
    let _ = writeln!(out, "\nno notes");
    return out;
  }
  let _ = writeln!(out, "\nnotes ({}):", lead.notes().len());
  for note in lead.notes().sorted(order) {
    let _ = writeln!(
      out,
      "  [{}] {} · {}: {}",
      when(note.created_at),
      note.status,
      note.added_by,
      note.text
    );
  }
  out
}
