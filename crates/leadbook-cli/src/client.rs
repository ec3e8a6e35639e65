//! [`HttpLeadStore`] — a [`LeadStore`] that talks to the Leadbook JSON API.

use std::time::Duration;

use leadbook_core::{
  lead::{Lead, NewLead},
  store::{LeadPage, LeadPatch, LeadQuery, LeadStore},
};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("lead not found: {0}")]
  NotFound(Uuid),

  #[error("lead {0} was modified concurrently")]
  Stale(Uuid),

  #[error("server rejected the request: {0}")]
  Rejected(String),

  #[error("{method} {path} → {status}: {message}")]
  Status {
    method:  &'static str,
    path:    String,
    status:  StatusCode,
    message: String,
  },
}

impl From<ClientError> for leadbook_core::Error {
  fn from(e: ClientError) -> Self {
    match e {
      ClientError::NotFound(id) => Self::NotFound(id),
      ClientError::Stale(id) => Self::StaleWrite(id),
      other => Self::remote(other),
    }
  }
}

type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Shape of the server's error body.
#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Async HTTP client for the Leadbook REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpLeadStore {
  client:   Client,
  base_url: String,
}

impl HttpLeadStore {
  pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  /// Decode a success body, or turn the response into a [`ClientError`].
  async fn decode<T: DeserializeOwned>(
    method: &'static str,
    path: String,
    lead: Option<Uuid>,
    resp: Response,
  ) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp.json().await?);
    }
    let message = resp
      .json::<ErrorBody>()
      .await
      .map(|b| b.error)
      .unwrap_or_default();
    Err(match (status, lead) {
      (StatusCode::NOT_FOUND, Some(id)) => ClientError::NotFound(id),
      (StatusCode::CONFLICT, Some(id)) => ClientError::Stale(id),
      (StatusCode::BAD_REQUEST, _) => ClientError::Rejected(message),
      _ => ClientError::Status { method, path, status, message },
    })
  }
}

/// Query string for `GET /leads`; unset filters are omitted.
pub fn list_params(query: &LeadQuery) -> Vec<(&'static str, String)> {
  let f = &query.filters;
  let mut params = vec![
    ("page", query.page.to_string()),
    ("limit", query.limit.to_string()),
    ("tab", query.tab.to_string()),
  ];
  let optional = [
    ("type", f.lead_type.map(|t| t.as_str().to_owned())),
    ("subCategory", f.sub_category.clone()),
    ("status", f.status.map(|s| s.as_str().to_owned())),
    ("category", f.category.clone()),
    ("courseId", f.course_id.clone()),
    ("search", f.search_query.clone()),
  ];
  params.extend(
    optional
      .into_iter()
      .filter_map(|(k, v)| v.filter(|v| !v.is_empty()).map(|v| (k, v))),
  );
  params
}

impl LeadStore for HttpLeadStore {
  type Error = ClientError;

  async fn list_leads(&self, query: &LeadQuery) -> Result<LeadPage> {
    let resp = self
      .client
      .get(self.url("/leads"))
      .query(&list_params(query))
      .send()
      .await?;
    Self::decode("GET", "/leads".into(), None, resp).await
  }

  async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>> {
    let path = format!("/leads/{id}");
    let resp = self.client.get(self.url(&path)).send().await?;
    match Self::decode("GET", path, Some(id), resp).await {
      Ok(lead) => Ok(Some(lead)),
      Err(ClientError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn update_lead(&self, id: Uuid, patch: LeadPatch) -> Result<Lead> {
    let path = format!("/leads/{id}");
    let resp = self.client.patch(self.url(&path)).json(&patch).send().await?;
    Self::decode("PATCH", path, Some(id), resp).await
  }

  async fn create_lead(&self, input: NewLead) -> Result<Lead> {
    let resp = self.client.post(self.url("/leads")).json(&input).send().await?;
    Self::decode("POST", "/leads".into(), None, resp).await
  }
}

#[cfg(test)]
mod tests {
  use leadbook_core::{
    filter::{FilterSet, Tab},
    lead::{LeadStatus, LeadType},
  };

  use super::*;

  #[test]
  fn list_params_skip_unset_and_empty_filters() {
    let mut query = LeadQuery::new(2, 25);
    query.tab = Tab::Type(LeadType::B2g);
    query.filters = FilterSet {
      status: Some(LeadStatus::ContactInFuture),
      search_query: Some(String::new()),
      course_id: Some("c-7".into()),
      ..Default::default()
    };

    let params = list_params(&query);
    assert_eq!(params, [
      ("page", "2".to_owned()),
      ("limit", "25".to_owned()),
      ("tab", "b2g".to_owned()),
      ("status", "Contact-in-Future".to_owned()),
      ("courseId", "c-7".to_owned()),
    ]);
  }

  #[test]
  fn not_found_and_conflict_keep_their_meaning() {
    let id = Uuid::new_v4();
    assert!(matches!(
      leadbook_core::Error::from(ClientError::NotFound(id)),
      leadbook_core::Error::NotFound(x) if x == id
    ));
    assert!(matches!(
      leadbook_core::Error::from(ClientError::Stale(id)),
      leadbook_core::Error::StaleWrite(_)
    ));
    assert!(leadbook_core::Error::from(ClientError::Rejected("bad".into())).is_remote_failure());
  }
}
