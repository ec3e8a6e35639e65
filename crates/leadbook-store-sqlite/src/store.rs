//! [`SqliteStore`] — the SQLite implementation of [`LeadStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use leadbook_core::{
  counts::TypeCounts,
  filter::{FilterSet, Tab},
  guard::require_note_text,
  lead::{Lead, NewLead},
  store::{LeadPage, LeadPatch, LeadQuery, LeadStore, Pagination},
};

use crate::{
  Error, Result,
  encode::{
    LEAD_COLUMNS, RawLead, RawNote, decode_notes, decode_type, encode_course, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

/// Result of a write transaction, decided on the database thread.
enum WriteOutcome {
  Applied,
  Missing,
  Stale,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Leadbook lead store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Notes of the given leads in insertion order, grouped by lead id.
  async fn load_notes(&self, lead_ids: Vec<String>) -> Result<HashMap<String, Vec<RawNote>>> {
    if lead_ids.is_empty() {
      return Ok(HashMap::new());
    }

    let raw_notes: Vec<RawNote> = self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; lead_ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
          "SELECT lead_id, text, status, added_by, created_at FROM notes
           WHERE lead_id IN ({placeholders})
           ORDER BY seq"
        ))?;
        let notes = stmt
          .query_map(rusqlite::params_from_iter(lead_ids.iter()), RawNote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
      })
      .await?;

    let mut notes_by_lead: HashMap<String, Vec<RawNote>> = HashMap::new();
    for note in raw_notes {
      notes_by_lead.entry(note.lead_id.clone()).or_default().push(note);
    }
    Ok(notes_by_lead)
  }
}

/// `WHERE` clause and arguments for the predicates that only need `leads`
/// columns: the tab, the type and status filters, and the sub-category.
fn narrowing(query: &LeadQuery) -> (String, Vec<String>) {
  let f = &query.filters;
  let tab_type = match query.tab {
    Tab::All => None,
    Tab::Type(t) => Some(t.as_str().to_owned()),
  };
  let columns = [
    ("lead_type", tab_type),
    ("lead_type", f.lead_type.map(|t| t.as_str().to_owned())),
    ("status", f.status.map(|s| s.as_str().to_owned())),
    ("sub_category", f.sub_category.clone().filter(|s| !s.is_empty())),
  ];

  let mut clauses = Vec::new();
  let mut args = Vec::new();
  for (column, value) in columns {
    if let Some(value) = value {
      args.push(value);
      clauses.push(format!("{column} = ?{}", args.len()));
    }
  }
  if clauses.is_empty() {
    return (String::new(), args);
  }
  (format!("WHERE {}", clauses.join(" AND ")), args)
}

// ─── LeadStore impl ──────────────────────────────────────────────────────────

impl LeadStore for SqliteStore {
  type Error = Error;

  async fn list_leads(&self, query: &LeadQuery) -> Result<LeadPage> {
    let (where_clause, args) = narrowing(query);

    let (type_rows, raw_leads): (Vec<(String, i64)>, Vec<RawLead>) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare("SELECT lead_type, COUNT(*) FROM leads GROUP BY lead_type")?;
        let types = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {LEAD_COLUMNS} FROM leads {where_clause}
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let leads = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawLead::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((types, leads))
      })
      .await?;

    let mut counts = TypeCounts::default();
    for (lead_type, n) in type_rows {
      counts.add(decode_type(&lead_type)?, n as usize);
    }

    // Course and search predicates run on the decoded rows.
    let rest = FilterSet {
      lead_type: None,
      sub_category: None,
      status: None,
      ..query.filters.clone()
    };
    let mut matching = Vec::new();
    for raw in raw_leads {
      let lead = raw.into_lead(Vec::new())?;
      if rest.matches(&lead) {
        matching.push(lead);
      }
    }

    let pagination = Pagination::new(query.page, query.limit, matching.len());
    let page: Vec<Lead> = matching
      .into_iter()
      .skip(query.offset())
      .take(query.limit as usize)
      .collect();

    let mut notes = self.load_notes(page.iter().map(|l| encode_uuid(l.id)).collect()).await?;
    let leads = page
      .into_iter()
      .map(|lead| {
        let raw = notes.remove(&encode_uuid(lead.id)).unwrap_or_default();
        Ok(lead.with_notes(decode_notes(raw)?))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(LeadPage { leads, pagination, counts })
  }

  async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>> {
    let id_str = encode_uuid(id);
    let key = id_str.clone();

    let raw: Option<RawLead> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE lead_id = ?1"),
            rusqlite::params![key],
            RawLead::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    let Some(raw) = raw else {
      return Ok(None);
    };

    let notes = self.load_notes(vec![id_str]).await?.remove(&raw.lead_id).unwrap_or_default();
    Ok(Some(raw.into_lead(notes)?))
  }

  async fn create_lead(&self, input: NewLead) -> Result<Lead> {
    let lead = Lead::from_intake(Uuid::new_v4(), input, Utc::now());

    let id_str      = encode_uuid(lead.id);
    let name        = lead.name.clone();
    let email       = lead.email.clone();
    let country     = lead.country_code.clone();
    let phone       = lead.phone_number.clone();
    let lead_type   = lead.lead_type.as_str();
    let sub         = lead.sub_category.clone();
    let query       = lead.query.clone();
    let status      = lead.status().as_str();
    let course_json = lead.course.as_ref().map(encode_course).transpose()?;
    let at_str      = encode_dt(lead.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO leads (
             lead_id, name, email, country_code, phone_number, lead_type,
             sub_category, query, status, comment, course_json, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, '', ?10, ?11, ?11)",
          rusqlite::params![
            id_str,
            name,
            email,
            country,
            phone,
            lead_type,
            sub,
            query,
            status,
            course_json,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(lead)
  }

  async fn update_lead(&self, id: Uuid, patch: LeadPatch) -> Result<Lead> {
    patch.validate()?;

    let notes = patch
      .notes
      .iter()
      .map(|n| {
        Ok((
          require_note_text(&n.text)?.to_owned(),
          n.status.as_str(),
          n.added_by.as_str().to_owned(),
          encode_dt(n.created_at),
        ))
      })
      .collect::<Result<Vec<_>>>()?;

    let id_str   = encode_uuid(id);
    let expected = patch.expected_updated_at.map(encode_dt);
    let comment  = patch.comment;
    let now_str  = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let current: Option<String> = tx
          .query_row(
            "SELECT updated_at FROM leads WHERE lead_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(WriteOutcome::Missing);
        };
        if expected.as_ref().is_some_and(|e| *e != current) {
          return Ok(WriteOutcome::Stale);
        }

        let mut changed = false;
        for (text, status, added_by, created_at) in &notes {
          // A retried write carries the identical note; keep only one.
          let seen: bool = tx.query_row(
            "SELECT EXISTS (
               SELECT 1 FROM notes
               WHERE lead_id = ?1 AND text = ?2 AND status = ?3
                 AND added_by = ?4 AND created_at = ?5
             )",
            rusqlite::params![id_str, text, status, added_by, created_at],
            |r| r.get(0),
          )?;
          if seen {
            continue;
          }
          tx.execute(
            "INSERT INTO notes (lead_id, text, status, added_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![id_str, text, status, added_by, created_at],
          )?;
          changed = true;
        }

        if changed {
          // Concurrent writers may commit out of timestamp order; the status
          // always follows the latest note.
          tx.execute(
            "UPDATE leads SET status = (
               SELECT status FROM notes WHERE lead_id = ?1
               ORDER BY created_at DESC, seq DESC LIMIT 1
             )
             WHERE lead_id = ?1",
            rusqlite::params![id_str],
          )?;
        }

        if let Some(comment) = &comment {
          tx.execute(
            "UPDATE leads SET comment = ?2 WHERE lead_id = ?1",
            rusqlite::params![id_str, comment],
          )?;
          changed = true;
        }

        if changed {
          tx.execute(
            "UPDATE leads SET updated_at = ?2 WHERE lead_id = ?1",
            rusqlite::params![id_str, now_str],
          )?;
        }

        tx.commit()?;
        Ok(WriteOutcome::Applied)
      })
      .await?;

    match outcome {
      WriteOutcome::Missing => Err(Error::LeadNotFound(id)),
      WriteOutcome::Stale => Err(Error::StaleWrite(id)),
      WriteOutcome::Applied => self.get_lead(id).await?.ok_or(Error::LeadNotFound(id)),
    }
  }
}
