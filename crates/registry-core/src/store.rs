//! The `RegistryStore` trait.
//!
//! Implemented by storage backends (e.g. `registry-store-sqlite`). The server
//! depends on this abstraction, not on any concrete backend.

use std::{future::Future, net::IpAddr};

use crate::{
  catalog::{Agent, CatalogEntry, Dimension, IpEntry},
  hit::{Hit, HitRecord, NewHit},
};

/// Abstraction over a registry backend.
///
/// Reference rows are an append-only dictionary: `upsert*` returns the
/// existing row for a value or inserts it exactly once. Concurrent first
/// sightings of the same value must both succeed and observe the same row.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RegistryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reference data ────────────────────────────────────────────────────

  /// The canonical "latest" version string, or `None` if it was never set.
  fn current_version(
    &self,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Replace the canonical version string.
  fn set_current_version<'a>(
    &'a self,
    version: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Look up an agent by exact `agent_name`. Unknown names return `None`;
  /// they are never registered implicitly.
  fn find_agent<'a>(
    &'a self,
    agent_name: &'a str,
  ) -> impl Future<Output = Result<Option<Agent>, Self::Error>> + Send + 'a;

  /// Register a new agent. Fails if `agent_name` is already taken.
  fn add_agent<'a>(
    &'a self,
    agent_name: &'a str,
    display_name: &'a str,
  ) -> impl Future<Output = Result<Agent, Self::Error>> + Send + 'a;

  fn list_agents(
    &self,
  ) -> impl Future<Output = Result<Vec<Agent>, Self::Error>> + Send + '_;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Get-or-create the row holding `value` in `dimension`'s table.
  fn upsert<'a>(
    &'a self,
    dimension: Dimension,
    value: &'a str,
  ) -> impl Future<Output = Result<CatalogEntry, Self::Error>> + Send + 'a;

  /// Get-or-create the address row for `ip`. Geolocation columns stay null.
  fn upsert_ip(
    &self,
    ip: IpAddr,
  ) -> impl Future<Output = Result<IpEntry, Self::Error>> + Send + '_;

  /// All rows of one dimension, oldest first.
  fn catalog_entries(
    &self,
    dimension: Dimension,
  ) -> impl Future<Output = Result<Vec<CatalogEntry>, Self::Error>> + Send + '_;

  // ── Hits ──────────────────────────────────────────────────────────────

  /// Persist a hit. The `created_at` timestamp is set by the store.
  fn record_hit(
    &self,
    input: NewHit,
  ) -> impl Future<Output = Result<Hit, Self::Error>> + Send + '_;

  fn count_hits(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// The `limit` most recent hits, newest first, joined against their
  /// reference rows.
  fn recent_hits(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<HitRecord>, Self::Error>> + Send + '_;
}
