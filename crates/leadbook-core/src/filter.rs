//! The lead query engine: tab scope, field filters and free-text search.
//!
//! Every predicate is an independent, side-effect-free test; a lead is kept
//! iff all applicable predicates pass. Unset and empty-string filter values
//! are wildcards.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
  ValidationError,
  lead::{Lead, LeadStatus, LeadType},
};

// ─── Tab ─────────────────────────────────────────────────────────────────────

/// The coarse, type-based view the operator is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
  #[default]
  All,
  Type(LeadType),
}

impl Tab {
  pub fn admits(self, lead: &Lead) -> bool {
    match self {
      Self::All => true,
      Self::Type(t) => lead.lead_type == t,
    }
  }
}

impl FromStr for Tab {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s == "all" {
      return Ok(Self::All);
    }
    LeadType::parse(s).map(Self::Type)
  }
}

impl fmt::Display for Tab {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::All => f.write_str("all"),
      Self::Type(t) => write!(f, "{t}"),
    }
  }
}

// ─── FilterSet ───────────────────────────────────────────────────────────────

/// The advanced filter panel. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
  /// Secondary type filter, independent of the tab.
  #[serde(rename = "type")]
  pub lead_type:    Option<LeadType>,
  pub sub_category: Option<String>,
  pub status:       Option<LeadStatus>,
  /// Course category id.
  pub category:     Option<String>,
  pub course_id:    Option<String>,
  pub search_query: Option<String>,
}

/// `None` for unset or empty values.
fn active(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|v| !v.is_empty())
}

impl FilterSet {
  pub fn is_empty(&self) -> bool {
    self.lead_type.is_none()
      && self.status.is_none()
      && active(&self.sub_category).is_none()
      && active(&self.category).is_none()
      && active(&self.course_id).is_none()
      && self.search_needle().is_none()
  }

  fn search_needle(&self) -> Option<String> {
    let q = self.search_query.as_deref()?.trim();
    (!q.is_empty()).then(|| q.to_lowercase())
  }

  /// `true` iff `lead` passes every field predicate and the search.
  pub fn matches(&self, lead: &Lead) -> bool {
    self.matches_fields(lead) && self.matches_course(lead) && self.matches_search(lead)
  }

  fn matches_fields(&self, lead: &Lead) -> bool {
    let type_ok = self.lead_type.is_none_or(|t| lead.lead_type == t);
    let status_ok = self.status.is_none_or(|s| lead.status == s);
    let sub_ok = active(&self.sub_category)
      .is_none_or(|sub| lead.sub_category.as_deref() == Some(sub));
    type_ok && status_ok && sub_ok
  }

  /// Relational predicates; a lead without a course never matches a set
  /// course filter.
  fn matches_course(&self, lead: &Lead) -> bool {
    let course = lead.course.as_ref();
    let category_ok = active(&self.category).is_none_or(|cat| {
      course
        .and_then(|c| c.category.as_ref())
        .is_some_and(|c| c.id == cat)
    });
    let course_ok = active(&self.course_id)
      .is_none_or(|id| course.is_some_and(|c| c.id == id));
    category_ok && course_ok
  }

  fn matches_search(&self, lead: &Lead) -> bool {
    let Some(needle) = self.search_needle() else {
      return true;
    };
    let hit = |field: &str| field.to_lowercase().contains(&needle);
    hit(&lead.name)
      || hit(&lead.email)
      || hit(&lead.query)
      || lead.course.as_ref().is_some_and(|c| hit(&c.title))
  }
}

/// Leads on `tab` that satisfy `filters`, in input order.
pub fn filter<'a, I>(leads: I, tab: Tab, filters: &FilterSet) -> Vec<&'a Lead>
where
  I: IntoIterator<Item = &'a Lead>,
{
  leads
    .into_iter()
    .filter(|lead| tab.admits(lead) && filters.matches(lead))
    .collect()
}
