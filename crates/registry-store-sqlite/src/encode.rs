//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, addresses in their canonical
//! `IpAddr` display form.

use std::{collections::BTreeMap, net::IpAddr};

use chrono::{DateTime, Utc};
use registry_core::{
  catalog::{Agent, Dimension, parse_client_addr},
  hit::HitRecord,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── IpAddr ──────────────────────────────────────────────────────────────────

pub fn encode_ip(ip: IpAddr) -> String { ip.to_string() }

pub fn decode_ip(s: &str) -> Result<IpAddr> { Ok(parse_client_addr(s)?) }

// ─── Raw row types ───────────────────────────────────────────────────────────

/// Row read straight out of `agents`.
pub struct RawAgent {
  pub id:           i64,
  pub agent_name:   String,
  pub display_name: String,
}

impl RawAgent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      agent_name:   row.get(1)?,
      display_name: row.get(2)?,
    })
  }

  pub fn into_agent(self) -> Agent {
    Agent {
      agent_id:     self.id,
      agent_name:   self.agent_name,
      display_name: self.display_name,
    }
  }
}

/// A `hits` row joined against `agents` and `ips`, plus the resolved
/// dimension values as `(dimension, value)` pairs.
pub struct RawHitRecord {
  pub id:         i64,
  pub created_at: String,
  pub agent_name: String,
  pub ip:         Option<String>,
  pub values:     Vec<(Dimension, String)>,
}

impl RawHitRecord {
  pub fn into_record(self) -> Result<HitRecord> {
    Ok(HitRecord {
      hit_id:     self.id,
      created_at: decode_dt(&self.created_at)?,
      agent_name: self.agent_name,
      ip:         self.ip.as_deref().map(decode_ip).transpose()?,
      values:     self.values.into_iter().collect::<BTreeMap<_, _>>(),
    })
  }
}
