//! Integration tests for `SqliteStore` against an in-memory database.

use std::net::IpAddr;

use registry_core::{catalog::Dimension, hit::NewHit, store::RegistryStore};
use strum::IntoEnumIterator as _;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Reference data ──────────────────────────────────────────────────────────

#[tokio::test]
async fn current_version_unset_returns_none() {
  let s = store().await;
  assert_eq!(s.current_version().await.unwrap(), None);
}

#[tokio::test]
async fn set_current_version_overwrites_row_one() {
  let s = store().await;
  s.set_current_version("1.2.3").await.unwrap();
  assert_eq!(s.current_version().await.unwrap().as_deref(), Some("1.2.3"));

  s.set_current_version("5.4.0").await.unwrap();
  assert_eq!(s.current_version().await.unwrap().as_deref(), Some("5.4.0"));
}

#[tokio::test]
async fn add_and_find_agent() {
  let s = store().await;
  let agent = s.add_agent("OMERO.insight", "OMERO.insight").await.unwrap();

  let found = s.find_agent("OMERO.insight").await.unwrap().unwrap();
  assert_eq!(found, agent);

  assert!(s.find_agent("OMERO.missing").await.unwrap().is_none());
  // Lookup is exact.
  assert!(s.find_agent("omero.insight").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_agent_is_rejected() {
  let s = store().await;
  s.add_agent("OMERO.web", "Web").await.unwrap();
  let err = s.add_agent("OMERO.web", "Web again").await.unwrap_err();
  assert!(matches!(err, Error::AgentExists(ref name) if name == "OMERO.web"));
  assert_eq!(s.list_agents().await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_agents_sorted_by_name() {
  let s = store().await;
  s.add_agent("OMERO.web", "Web").await.unwrap();
  s.add_agent("OMERO.insight", "Insight").await.unwrap();

  let names: Vec<_> = s
    .list_agents()
    .await
    .unwrap()
    .into_iter()
    .map(|a| a.agent_name)
    .collect();
  assert_eq!(names, ["OMERO.insight", "OMERO.web"]);
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_is_idempotent() {
  let s = store().await;
  let first = s.upsert(Dimension::OsName, "Linux").await.unwrap();
  let again = s.upsert(Dimension::OsName, "Linux").await.unwrap();
  assert_eq!(first, again);

  let entries = s.catalog_entries(Dimension::OsName).await.unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].value, "Linux");
}

#[tokio::test]
async fn upsert_distinct_values_get_distinct_rows() {
  let s = store().await;
  let linux = s.upsert(Dimension::OsName, "Linux").await.unwrap();
  let mac   = s.upsert(Dimension::OsName, "Mac OS X").await.unwrap();
  assert_ne!(linux.id, mac.id);
  assert_eq!(s.catalog_entries(Dimension::OsName).await.unwrap().len(), 2);
}

#[tokio::test]
async fn dimensions_are_independent_tables() {
  let s = store().await;
  for d in Dimension::iter() {
    s.upsert(d, "same-value").await.unwrap();
  }
  for d in Dimension::iter() {
    let entries = s.catalog_entries(d).await.unwrap();
    assert_eq!(entries.len(), 1, "{d:?}");
    assert_eq!(entries[0].dimension, d);
  }
}

#[tokio::test]
async fn upsert_empty_value_is_rejected() {
  let s = store().await;
  let err = s.upsert(Dimension::JavaVendor, "").await.unwrap_err();
  assert!(matches!(err, Error::Core(registry_core::Error::EmptyValue(_))));
  assert!(s.catalog_entries(Dimension::JavaVendor).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_first_sightings_share_one_row() {
  let s = store().await;
  let handles: Vec<_> = (0..8)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.upsert(Dimension::PythonVersion, "2.7.9").await })
    })
    .collect();

  let mut ids = Vec::new();
  for h in handles {
    ids.push(h.await.unwrap().unwrap().id);
  }
  ids.dedup();
  assert_eq!(ids.len(), 1);
  assert_eq!(s.catalog_entries(Dimension::PythonVersion).await.unwrap().len(), 1);
}

#[tokio::test]
async fn upsert_ip_is_idempotent() {
  let s = store().await;
  let ip: IpAddr = "1.2.3.4".parse().unwrap();
  let a = s.upsert_ip(ip).await.unwrap();
  let b = s.upsert_ip(ip).await.unwrap();
  assert_eq!(a, b);
  assert_eq!(a.ip, ip);
}

// ─── Hits ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_hit_with_agent_only() {
  let s = store().await;
  let agent = s.add_agent("OMERO.test", "OMERO.test").await.unwrap();

  let hit = s.record_hit(NewHit::new(agent.agent_id)).await.unwrap();
  assert_eq!(hit.agent_id, agent.agent_id);
  assert!(hit.ip_id.is_none());
  assert!(hit.catalog.is_empty());

  let records = s.recent_hits(10).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].hit_id, hit.hit_id);
  assert_eq!(records[0].agent_name, "OMERO.test");
  assert!(records[0].ip.is_none());
  assert!(records[0].values.is_empty());
}

#[tokio::test]
async fn record_hit_resolves_references() {
  let s = store().await;
  let agent = s.add_agent("OMERO.insight", "Insight").await.unwrap();
  let ip    = s.upsert_ip("11.22.33.44".parse().unwrap()).await.unwrap();
  let ver   = s.upsert(Dimension::AgentVersion, "5.1.0").await.unwrap();
  let os    = s.upsert(Dimension::OsName, "Linux").await.unwrap();

  let mut input = NewHit::new(agent.agent_id);
  input.ip_id = Some(ip.ip_id);
  input.catalog.insert(Dimension::AgentVersion, ver.id);
  input.catalog.insert(Dimension::OsName, os.id);
  s.record_hit(input).await.unwrap();

  let record = s.recent_hits(1).await.unwrap().remove(0);
  assert_eq!(record.ip, Some(ip.ip));
  assert_eq!(record.value(Dimension::AgentVersion), Some("5.1.0"));
  assert_eq!(record.value(Dimension::OsName), Some("Linux"));
  assert_eq!(record.value(Dimension::JavaVendor), None);
}

#[tokio::test]
async fn recent_hits_newest_first_and_limited() {
  let s = store().await;
  let agent = s.add_agent("OMERO.web", "Web").await.unwrap();
  let mut ids = Vec::new();
  for _ in 0..3 {
    ids.push(s.record_hit(NewHit::new(agent.agent_id)).await.unwrap().hit_id);
  }

  let recent: Vec<_> = s
    .recent_hits(2)
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.hit_id)
    .collect();
  assert_eq!(recent, [ids[2], ids[1]]);
  assert_eq!(s.count_hits().await.unwrap(), 3);
}

#[tokio::test]
async fn hit_requires_known_agent() {
  let s = store().await;
  // Foreign keys are enforced, so a dangling agent id cannot be recorded.
  assert!(s.record_hit(NewHit::new(42)).await.is_err());
  assert_eq!(s.count_hits().await.unwrap(), 0);
}
