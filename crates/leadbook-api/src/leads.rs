//! Handlers for `/leads` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/leads` | `?page&limit&tab&type&subCategory&status&category&courseId&search` |
//! | `POST`  | `/leads` | Intake; body: [`NewLead`]; returns 201 |
//! | `GET`   | `/leads/:id` | 404 if not found |
//! | `PATCH` | `/leads/:id` | Body: [`LeadPatch`]; 409 on a stale write |
//! | `GET`   | `/leads/:id/notes` | Optional `?order=newest\|oldest` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use leadbook_core::{
  audit::{NoteOrder, sorted_notes},
  filter::{FilterSet, Tab},
  lead::{Lead, LeadStatus, LeadType, NewLead, Note},
  store::{DEFAULT_LIMIT, LeadPage, LeadPatch, LeadQuery, LeadStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub page:         Option<u32>,
  pub limit:        Option<u32>,
  /// `all` or a lead type.
  pub tab:          Option<String>,
  #[serde(rename = "type")]
  pub lead_type:    Option<String>,
  pub sub_category: Option<String>,
  pub status:       Option<String>,
  pub category:     Option<String>,
  pub course_id:    Option<String>,
  pub search:       Option<String>,
}

impl ListParams {
  /// Validate the vocabulary fields; empty strings count as unset.
  pub fn into_query(self) -> Result<LeadQuery, ApiError> {
    let given = |v: Option<String>| v.filter(|s| !s.is_empty());

    let mut query = LeadQuery::new(
      self.page.unwrap_or(1),
      self.limit.unwrap_or(DEFAULT_LIMIT),
    );
    if let Some(tab) = given(self.tab) {
      query.tab = tab.parse::<Tab>()?;
    }
    query.filters = FilterSet {
      lead_type:    given(self.lead_type).map(|t| LeadType::parse(&t)).transpose()?,
      sub_category: self.sub_category,
      status:       given(self.status).map(|s| LeadStatus::parse(&s)).transpose()?,
      category:     self.category,
      course_id:    self.course_id,
      search_query: self.search,
    };
    Ok(query)
  }
}

/// `GET /leads`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<LeadPage>, ApiError>
where
  S: LeadStore,
{
  let query = params.into_query()?;
  let page = store.list_leads(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(page))
}

// ─── Intake ───────────────────────────────────────────────────────────────────

/// `POST /leads` — returns 201 + the stored [`Lead`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewLead>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LeadStore,
{
  let lead = store.create_lead(body).await.map_err(ApiError::from_store)?;
  tracing::info!(lead = %lead.id, lead_type = %lead.lead_type, "lead received");
  Ok((StatusCode::CREATED, Json(lead)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /leads/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError>
where
  S: LeadStore,
{
  let lead = store
    .get_lead(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("lead {id} not found")))?;
  Ok(Json(lead))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /leads/:id`: appends the patch's notes and applies the comment.
///
/// Unknown status values in the body are rejected with 400 before the store
/// is touched.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  body: Result<Json<LeadPatch>, JsonRejection>,
) -> Result<Json<Lead>, ApiError>
where
  S: LeadStore,
{
  let Json(patch) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let lead = store.update_lead(id, patch).await.map_err(ApiError::from_store)?;
  tracing::debug!(
    lead = %id,
    status = %lead.status(),
    notes = lead.notes().len(),
    "lead updated"
  );
  Ok(Json(lead))
}

// ─── Notes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NotesParams {
  #[serde(default)]
  pub order: NoteOrder,
}

/// `GET /leads/:id/notes[?order=newest|oldest]`
pub async fn notes<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<NotesParams>,
) -> Result<Json<Vec<Note>>, ApiError>
where
  S: LeadStore,
{
  let lead = store
    .get_lead(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("lead {id} not found")))?;
  Ok(Json(sorted_notes(&lead, params.order).into_iter().cloned().collect()))
}
