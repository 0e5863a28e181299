//! Hits — one immutable row per accepted phone-home request.

use std::{collections::BTreeMap, net::IpAddr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Dimension;

/// A persisted hit. Only the agent is mandatory; every other reference is set
/// when the matching request field was present and resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
  pub hit_id:     i64,
  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
  pub agent_id:   i64,
  pub ip_id:      Option<i64>,
  /// Catalog row ids keyed by dimension.
  pub catalog:    BTreeMap<Dimension, i64>,
}

/// Input to [`crate::store::RegistryStore::record_hit`].
/// `created_at` is always set by the store.
#[derive(Debug, Clone, Default)]
pub struct NewHit {
  pub agent_id: i64,
  pub ip_id:    Option<i64>,
  pub catalog:  BTreeMap<Dimension, i64>,
}

impl NewHit {
  pub fn new(agent_id: i64) -> Self {
    Self { agent_id, ..Self::default() }
  }
}

/// A hit joined against its reference rows, for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitRecord {
  pub hit_id:     i64,
  pub created_at: DateTime<Utc>,
  pub agent_name: String,
  pub ip:         Option<IpAddr>,
  pub values:     BTreeMap<Dimension, String>,
}

impl HitRecord {
  pub fn value(&self, dimension: Dimension) -> Option<&str> {
    self.values.get(&dimension).map(String::as_str)
  }
}
