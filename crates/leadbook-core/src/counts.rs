//! Per-type counts for the tab badges.

use serde::{Deserialize, Serialize};

use crate::lead::{Lead, LeadType};

/// Lead totals per tab. Always computed over the unfiltered collection.
///
/// `general` leads count towards `all` but have no bucket of their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
  pub all: usize,
  pub b2i: usize,
  pub b2b: usize,
  pub b2c: usize,
  pub b2g: usize,
}

impl TypeCounts {
  pub fn of<'a>(leads: impl IntoIterator<Item = &'a Lead>) -> Self {
    leads.into_iter().fold(Self::default(), |mut counts, lead| {
      counts.add(lead.lead_type, 1);
      counts
    })
  }

  /// Count `n` more leads of `lead_type`.
  pub fn add(&mut self, lead_type: LeadType, n: usize) {
    self.all += n;
    match lead_type {
      LeadType::B2i => self.b2i += n,
      LeadType::B2b => self.b2b += n,
      LeadType::B2c => self.b2c += n,
      LeadType::B2g => self.b2g += n,
      LeadType::General => {}
    }
  }

  /// Badge value for a tab; `None` for `general`, which has no tab.
  pub fn for_type(&self, lead_type: LeadType) -> Option<usize> {
    match lead_type {
      LeadType::B2i => Some(self.b2i),
      LeadType::B2b => Some(self.b2b),
      LeadType::B2c => Some(self.b2c),
      LeadType::B2g => Some(self.b2g),
      LeadType::General => None,
    }
  }
}
