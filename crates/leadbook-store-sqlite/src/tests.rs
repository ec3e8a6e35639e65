//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, TimeDelta, Utc};
use leadbook_core::{
  ValidationError,
  filter::{FilterSet, Tab},
  lead::{Actor, CourseCategory, CourseRef, LeadStatus, LeadType, NewLead, Note},
  store::{LeadPatch, LeadQuery, LeadStore},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn intake(name: &str, lead_type: LeadType) -> NewLead {
  NewLead {
    name:         name.into(),
    email:        format!("{}@example.com", name.to_lowercase()),
    country_code: "+44".into(),
    phone_number: "7700900123".into(),
    lead_type,
    sub_category: None,
    query:        format!("{name} wants a brochure"),
    course:       None,
  }
}

fn note(text: &str, status: LeadStatus, at: DateTime<Utc>) -> Note {
  Note { text: text.into(), status, added_by: Actor::new("ops"), created_at: at }
}

// ─── Intake and reads ────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_lead() {
  let s = store().await;

  let mut input = intake("Ada", LeadType::B2c);
  input.sub_category = Some("Evening".into());
  input.course = Some(CourseRef {
    id:       "c-1".into(),
    title:    "Data Science".into(),
    slug:     "data-science".into(),
    category: Some(CourseCategory { id: "cat-9".into(), name: "Tech".into() }),
  });
  let lead = s.create_lead(input).await.unwrap();
  assert_eq!(lead.status(), LeadStatus::New);
  assert!(lead.notes().is_empty());

  let fetched = s.get_lead(lead.id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Ada");
  assert_eq!(fetched.sub_category.as_deref(), Some("Evening"));
  assert_eq!(fetched.course, lead.course);
  assert_eq!(fetched.created_at, lead.created_at);
}

#[tokio::test]
async fn get_lead_missing_returns_none() {
  let s = store().await;
  assert!(s.get_lead(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_leads_pages_newest_first() {
  let s = store().await;
  for name in ["a", "b", "c", "d", "e"] {
    s.create_lead(intake(name, LeadType::B2b)).await.unwrap();
  }

  let first = s.list_leads(&LeadQuery::new(1, 2)).await.unwrap();
  let names: Vec<&str> = first.leads.iter().map(|l| l.name.as_str()).collect();
  assert_eq!(names, ["e", "d"]);
  assert_eq!(first.pagination.total, 5);
  assert_eq!(first.pagination.total_pages, 3);

  let last = s.list_leads(&LeadQuery::new(3, 2)).await.unwrap();
  assert_eq!(last.leads.len(), 1);
  assert_eq!(last.leads[0].name, "a");
}

#[tokio::test]
async fn list_leads_filters_but_counts_everything() {
  let s = store().await;
  s.create_lead(intake("one", LeadType::B2i)).await.unwrap();
  s.create_lead(intake("two", LeadType::B2g)).await.unwrap();
  s.create_lead(intake("three", LeadType::General)).await.unwrap();

  let mut query = LeadQuery::default();
  query.tab = Tab::Type(LeadType::B2g);
  let page = s.list_leads(&query).await.unwrap();

  assert_eq!(page.leads.len(), 1);
  assert_eq!(page.leads[0].name, "two");
  assert_eq!(page.counts.all, 3);
  assert_eq!(page.counts.b2i, 1);
  assert_eq!(page.counts.b2g, 1);
}

#[tokio::test]
async fn list_leads_combines_column_and_search_filters() {
  let s = store().await;
  let mut evening = intake("Ada", LeadType::B2c);
  evening.sub_category = Some("Evening".into());
  let ada = s.create_lead(evening).await.unwrap();
  let mut weekend = intake("Alan", LeadType::B2c);
  weekend.sub_category = Some("Weekend".into());
  s.create_lead(weekend).await.unwrap();
  let grace = s.create_lead(intake("Grace", LeadType::B2c)).await.unwrap();
  for _ in 0..3 {
    s.create_lead(intake("Filler", LeadType::B2b)).await.unwrap();
  }

  let at = Utc::now();
  s.update_lead(ada.id, LeadPatch::status_change(note("keen", LeadStatus::Prospect, at)))
    .await
    .unwrap();
  s.update_lead(grace.id, LeadPatch::status_change(note("keen", LeadStatus::Prospect, at)))
    .await
    .unwrap();

  let mut query = LeadQuery::new(1, 1);
  query.tab = Tab::Type(LeadType::B2c);
  query.filters = FilterSet { status: Some(LeadStatus::Prospect), ..Default::default() };
  let page = s.list_leads(&query).await.unwrap();
  assert_eq!(page.pagination.total, 2);
  assert_eq!(page.leads[0].id, grace.id);
  assert_eq!(page.leads[0].status(), LeadStatus::Prospect);
  assert_eq!(page.leads[0].notes().len(), 1);
  assert_eq!(page.counts.all, 6);
  assert_eq!(page.counts.b2c, 3);

  query.filters.sub_category = Some("Evening".into());
  query.filters.search_query = Some("  ADA ".into());
  let page = s.list_leads(&query).await.unwrap();
  assert_eq!(page.pagination.total, 1);
  assert_eq!(page.leads[0].id, ada.id);

  query.filters.search_query = Some("grace".into());
  let page = s.list_leads(&query).await.unwrap();
  assert!(page.leads.is_empty());
  assert_eq!(page.pagination.total, 0);
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn status_change_appends_note_and_sets_status() {
  let s = store().await;
  let lead = s.create_lead(intake("Grace", LeadType::B2b)).await.unwrap();

  let at = Utc::now();
  let updated = s
    .update_lead(
      lead.id,
      LeadPatch::status_change(note("called back", LeadStatus::InConversation, at)),
    )
    .await
    .unwrap();

  assert_eq!(updated.status(), LeadStatus::InConversation);
  assert_eq!(updated.notes().len(), 1);
  let latest = updated.notes().latest().unwrap();
  assert_eq!(latest.text, "called back");
  assert_eq!(latest.added_by.as_str(), "ops");
  assert_eq!(latest.created_at, at);
  assert!(updated.updated_at >= lead.updated_at);
}

#[tokio::test]
async fn concurrent_appends_are_both_kept() {
  let s = store().await;
  let lead = s.create_lead(intake("Linus", LeadType::B2c)).await.unwrap();

  let t0 = Utc::now();
  let early = note("left voicemail", LeadStatus::InConversation, t0);
  let late = note("booked a demo", LeadStatus::Opportunity, t0 + TimeDelta::seconds(5));

  // The later note commits first; status must still follow created_at.
  let (a, b) = tokio::join!(
    s.update_lead(lead.id, LeadPatch::status_change(late.clone())),
    s.update_lead(lead.id, LeadPatch::status_change(early.clone())),
  );
  a.unwrap();
  b.unwrap();

  let stored = s.get_lead(lead.id).await.unwrap().unwrap();
  assert_eq!(stored.notes().len(), 2);
  assert!(stored.notes().contains(&early));
  assert!(stored.notes().contains(&late));
  assert_eq!(stored.status(), LeadStatus::Opportunity);
}

#[tokio::test]
async fn retried_note_is_stored_once() {
  let s = store().await;
  let lead = s.create_lead(intake("Ken", LeadType::B2b)).await.unwrap();
  let n = note("sent pricing", LeadStatus::Prospect, Utc::now());

  s.update_lead(lead.id, LeadPatch::status_change(n.clone())).await.unwrap();
  let again = s.update_lead(lead.id, LeadPatch::status_change(n)).await.unwrap();
  assert_eq!(again.notes().len(), 1);
}

#[tokio::test]
async fn bare_status_without_note_is_rejected() {
  let s = store().await;
  let lead = s.create_lead(intake("Barbara", LeadType::B2b)).await.unwrap();

  let patch = LeadPatch { status: Some(LeadStatus::ClosedLost), ..Default::default() };
  let err = s.update_lead(lead.id, patch).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(leadbook_core::Error::Validation(ValidationError::EmptyNote))
  ));

  let stored = s.get_lead(lead.id).await.unwrap().unwrap();
  assert_eq!(stored.status(), LeadStatus::New);
}

#[tokio::test]
async fn status_change_must_carry_one_matching_note() {
  let s = store().await;
  let lead = s.create_lead(intake("Alonzo", LeadType::B2b)).await.unwrap();
  let at = Utc::now();

  let mismatched = LeadPatch {
    status: Some(LeadStatus::Spam),
    notes: vec![
      note("a", LeadStatus::Prospect, at),
      note("b", LeadStatus::ClosedWon, at + TimeDelta::seconds(1)),
    ],
    ..Default::default()
  };
  let err = s.update_lead(lead.id, mismatched).await.unwrap_err();
  assert!(matches!(
    leadbook_core::Error::from(err),
    leadbook_core::Error::Validation(ValidationError::UnexplainedStatus(LeadStatus::Spam))
  ));

  let wrong_status = LeadPatch {
    status: Some(LeadStatus::Spam),
    notes: vec![note("bot", LeadStatus::Prospect, at)],
    ..Default::default()
  };
  assert!(s.update_lead(lead.id, wrong_status).await.is_err());

  let stored = s.get_lead(lead.id).await.unwrap().unwrap();
  assert_eq!(stored.status(), LeadStatus::New);
  assert!(stored.notes().is_empty());
}

#[tokio::test]
async fn whitespace_note_is_rejected() {
  let s = store().await;
  let lead = s.create_lead(intake("Edsger", LeadType::B2i)).await.unwrap();

  let patch = LeadPatch::note(note("   ", LeadStatus::New, Utc::now()));
  let err = s.update_lead(lead.id, patch).await.unwrap_err();
  assert!(matches!(
    leadbook_core::Error::from(err),
    leadbook_core::Error::Validation(ValidationError::EmptyNote)
  ));
}

#[tokio::test]
async fn update_missing_lead_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.update_lead(id, LeadPatch::comment("hello")).await.unwrap_err();
  assert!(matches!(err, Error::LeadNotFound(missing) if missing == id));
}

#[tokio::test]
async fn stale_write_is_refused() {
  let s = store().await;
  let lead = s.create_lead(intake("Donald", LeadType::B2b)).await.unwrap();
  s.update_lead(lead.id, LeadPatch::comment("first")).await.unwrap();

  let mut patch = LeadPatch::comment("second");
  patch.expected_updated_at = Some(lead.updated_at);
  let err = s.update_lead(lead.id, patch).await.unwrap_err();
  assert!(matches!(leadbook_core::Error::from(err), leadbook_core::Error::StaleWrite(_)));

  let stored = s.get_lead(lead.id).await.unwrap().unwrap();
  assert_eq!(stored.comment, "first");
}

#[tokio::test]
async fn comment_can_be_set_and_cleared() {
  let s = store().await;
  let lead = s.create_lead(intake("Margaret", LeadType::B2g)).await.unwrap();

  let set = s.update_lead(lead.id, LeadPatch::comment("VIP")).await.unwrap();
  assert_eq!(set.comment, "VIP");
  assert_eq!(set.status(), LeadStatus::New);

  let mut guarded = LeadPatch::comment("");
  guarded.expected_updated_at = Some(set.updated_at);
  let cleared = s.update_lead(lead.id, guarded).await.unwrap();
  assert_eq!(cleared.comment, "");
}

#[tokio::test]
async fn reopening_a_file_store_keeps_data() {
  let dir = std::env::temp_dir().join(format!("leadbook-{}", Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("leads.db");

  let id = {
    let s = SqliteStore::open(&path).await.unwrap();
    let lead = s.create_lead(intake("Barbara", LeadType::B2c)).await.unwrap();
    s.update_lead(lead.id, LeadPatch::note(note("met at expo", LeadStatus::New, Utc::now())))
      .await
      .unwrap();
    lead.id
  };

  let reopened = SqliteStore::open(&path).await.unwrap();
  let lead = reopened.get_lead(id).await.unwrap().unwrap();
  assert_eq!(lead.notes().len(), 1);

  let _ = std::fs::remove_dir_all(&dir);
}
