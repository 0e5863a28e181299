//! [`SqliteStore`] — the SQLite implementation of [`RegistryStore`].

use std::{net::IpAddr, path::Path};

use chrono::Utc;
use registry_core::{
  catalog::{Agent, CatalogEntry, Dimension, IpEntry},
  hit::{Hit, HitRecord, NewHit},
  store::RegistryStore,
};
use rusqlite::{ErrorCode, OptionalExtension as _, types::Value};
use strum::IntoEnumIterator as _;

use crate::{
  Error, Result,
  encode::{RawAgent, RawHitRecord, encode_dt, encode_ip},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A registry store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
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

  /// Open an in-memory store — useful for testing.
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

  /// Return the id of the row holding `value`, inserting it first if needed.
  ///
  /// The insert and the read happen in one transaction, and a concurrent
  /// writer that got there first is absorbed by `ON CONFLICT DO NOTHING`.
  async fn get_or_insert(
    &self,
    table: &'static str,
    column: &'static str,
    value: String,
  ) -> Result<i64> {
    let insert = format!(
      "INSERT INTO {table} ({column}) VALUES (?1) ON CONFLICT({column}) DO NOTHING"
    );
    let select = format!("SELECT id FROM {table} WHERE {column} = ?1");

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(&insert, rusqlite::params![value])?;
        let id: i64 =
          tx.query_row(&select, rusqlite::params![value], |r| r.get(0))?;
        tx.commit()?;
        Ok(id)
      })
      .await?;
    Ok(id)
  }
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = Error;

  // ── Reference data ────────────────────────────────────────────────────────

  async fn current_version(&self) -> Result<Option<String>> {
    let version = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row("SELECT version FROM versions WHERE id = 1", [], |r| {
              r.get(0)
            })
            .optional()?,
        )
      })
      .await?;
    Ok(version)
  }

  async fn set_current_version(&self, version: &str) -> Result<()> {
    let version = version.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO versions (id, version) VALUES (1, ?1)
           ON CONFLICT(id) DO UPDATE SET version = excluded.version",
          rusqlite::params![version],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_agent(&self, agent_name: &str) -> Result<Option<Agent>> {
    let name = agent_name.to_owned();

    let raw: Option<RawAgent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, agent_name, display_name FROM agents WHERE agent_name = ?1",
              rusqlite::params![name],
              RawAgent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawAgent::into_agent))
  }

  async fn add_agent(&self, agent_name: &str, display_name: &str) -> Result<Agent> {
    let name    = agent_name.to_owned();
    let display = display_name.to_owned();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO agents (agent_name, display_name) VALUES (?1, ?2)",
          rusqlite::params![name, display],
        ) {
          Ok(_) => Ok(Some(conn.last_insert_rowid())),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
          {
            Ok(None)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    let agent_id = id.ok_or_else(|| Error::AgentExists(agent_name.to_owned()))?;
    Ok(Agent {
      agent_id,
      agent_name: agent_name.to_owned(),
      display_name: display_name.to_owned(),
    })
  }

  async fn list_agents(&self) -> Result<Vec<Agent>> {
    let raws: Vec<RawAgent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT id, agent_name, display_name FROM agents ORDER BY agent_name")?;
        let rows = stmt
          .query_map([], RawAgent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawAgent::into_agent).collect())
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn upsert(&self, dimension: Dimension, value: &str) -> Result<CatalogEntry> {
    if value.is_empty() {
      return Err(registry_core::Error::EmptyValue(dimension.name()).into());
    }

    let id = self
      .get_or_insert(dimension.table(), dimension.column(), value.to_owned())
      .await?;

    Ok(CatalogEntry { id, dimension, value: value.to_owned() })
  }

  async fn upsert_ip(&self, ip: IpAddr) -> Result<IpEntry> {
    let ip_id = self.get_or_insert("ips", "ip", encode_ip(ip)).await?;
    Ok(IpEntry { ip_id, ip })
  }

  async fn catalog_entries(&self, dimension: Dimension) -> Result<Vec<CatalogEntry>> {
    let sql = format!(
      "SELECT id, {} FROM {} ORDER BY id",
      dimension.column(),
      dimension.table()
    );

    let rows: Vec<(i64, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(id, value)| CatalogEntry { id, dimension, value })
        .collect(),
    )
  }

  // ── Hits ──────────────────────────────────────────────────────────────────

  async fn record_hit(&self, input: NewHit) -> Result<Hit> {
    let created_at = Utc::now();

    let columns: Vec<&'static str> = Dimension::iter().map(Dimension::hit_column).collect();
    let placeholders: Vec<String> =
      (0..columns.len()).map(|i| format!("?{}", i + 4)).collect();
    let sql = format!(
      "INSERT INTO hits (created_at, agent_id, ip_id, {}) VALUES (?1, ?2, ?3, {})",
      columns.join(", "),
      placeholders.join(", "),
    );

    let mut values = vec![
      Value::Text(encode_dt(created_at)),
      Value::Integer(input.agent_id),
      input.ip_id.map_or(Value::Null, Value::Integer),
    ];
    values.extend(
      Dimension::iter()
        .map(|d| input.catalog.get(&d).copied().map_or(Value::Null, Value::Integer)),
    );

    let hit_id = self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Hit {
      hit_id,
      created_at,
      agent_id: input.agent_id,
      ip_id: input.ip_id,
      catalog: input.catalog,
    })
  }

  async fn count_hits(&self) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM hits", [], |r| r.get(0))?))
      .await?;
    Ok(count as u64)
  }

  async fn recent_hits(&self, limit: usize) -> Result<Vec<HitRecord>> {
    let dimensions: Vec<Dimension> = Dimension::iter().collect();

    let mut select = String::from("h.id, h.created_at, a.agent_name, i.ip");
    let mut joins  = String::new();
    for (n, d) in dimensions.iter().enumerate() {
      select.push_str(&format!(", d{n}.{}", d.column()));
      joins.push_str(&format!(
        " LEFT JOIN {table} d{n} ON d{n}.id = h.{fk}",
        table = d.table(),
        fk = d.hit_column(),
      ));
    }
    let sql = format!(
      "SELECT {select}
       FROM hits h
       JOIN agents a ON a.id = h.agent_id
       LEFT JOIN ips i ON i.id = h.ip_id
       {joins}
       ORDER BY h.id DESC
       LIMIT ?1"
    );
    let limit_val = limit as i64;

    let raws: Vec<RawHitRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            let mut values = Vec::new();
            for (n, d) in dimensions.iter().enumerate() {
              if let Some(v) = row.get::<_, Option<String>>(4 + n)? {
                values.push((*d, v));
              }
            }
            Ok(RawHitRecord {
              id:         row.get(0)?,
              created_at: row.get(1)?,
              agent_name: row.get(2)?,
              ip:         row.get(3)?,
              values,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHitRecord::into_record).collect()
  }
}
