//! `GET|POST /` — record a phone-home hit and tell outdated clients to
//! upgrade.
//!
//! Nothing in here fails the request. An unknown agent is redirected; every
//! other problem (bad address, store errors while resolving a field or
//! saving the hit) is logged and the response is produced regardless.

use std::net::{IpAddr, SocketAddr};

use axum::{
  Form,
  extract::{ConnectInfo, FromRequest as _, Multipart, Query, Request, State},
  http::{HeaderMap, Method, header},
  response::Response,
};
use registry_core::{
  catalog::{Agent, Dimension, parse_client_addr},
  hit::NewHit,
  store::RegistryStore,
  version::{self, UpgradeCheck},
};
use strum::IntoEnumIterator as _;

use crate::{AppState, error::{Error, Result}, identity, policy::Outcome};

// ─── Parameters ──────────────────────────────────────────────────────────────

/// Request parameters, from the query string or, failing that, a form body.
#[derive(Debug, Default)]
pub struct Params(Vec<(String, String)>);

impl Params {
  /// Query-string parameters win; the body is only read for a `POST` that
  /// carried none. Both `application/x-www-form-urlencoded` and
  /// `multipart/form-data` bodies are accepted.
  pub async fn from_request(req: Request) -> Self {
    let query = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
      .map(|Query(pairs)| pairs)
      .unwrap_or_default();
    if !query.is_empty() || req.method() != Method::POST {
      return Self(query);
    }

    if is_multipart(req.headers()) {
      return Self::from_multipart(req).await;
    }

    match Form::<Vec<(String, String)>>::from_request(req, &()).await {
      Ok(Form(pairs)) => Self(pairs),
      Err(rejection) => {
        tracing::debug!(%rejection, "ignoring unreadable form body");
        Self::default()
      }
    }
  }

  /// Text fields of a multipart body. File uploads are skipped; a malformed
  /// body keeps whatever fields were read before the error.
  async fn from_multipart(req: Request) -> Self {
    let mut multipart = match Multipart::from_request(req, &()).await {
      Ok(multipart) => multipart,
      Err(rejection) => {
        tracing::debug!(%rejection, "ignoring unreadable multipart body");
        return Self::default();
      }
    };

    let mut pairs = Vec::new();
    loop {
      let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => break,
        Err(e) => {
          tracing::debug!(error = %e, "stopping at malformed multipart field");
          break;
        }
      };
      if field.file_name().is_some() {
        continue;
      }
      let Some(name) = field.name().map(str::to_owned) else { continue };
      match field.text().await {
        Ok(value) => pairs.push((name, value)),
        Err(e) => tracing::debug!(field = %name, error = %e, "skipping unreadable field"),
      }
    }
    Self(pairs)
  }

  /// Last value sent for `key`. Empty values count as absent.
  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .0
      .iter()
      .rev()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.as_str())
      .filter(|v| !v.is_empty())
  }
}

fn is_multipart(headers: &HeaderMap) -> bool {
  headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

// ─── Handler ─────────────────────────────────────────────────────────────────

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  req: Request,
) -> Response
where
  S: RegistryStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let peer = req
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.ip());
  let headers = req.headers().clone();
  let params = Params::from_request(req).await;

  let outcome = phone_home(&state, &headers, peer, &params).await;
  outcome.into_response(&state.config)
}

async fn phone_home<S>(
  state: &AppState<S>,
  headers: &HeaderMap,
  peer: Option<IpAddr>,
  params: &Params,
) -> Outcome
where
  S: RegistryStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Some(agent) = resolve_agent(state, headers).await else {
    return Outcome::UnknownAgent;
  };

  let mut hit = NewHit::new(agent.agent_id);

  for dimension in Dimension::iter() {
    let Some(value) = params.get(dimension.request_key()) else { continue };
    match state.store.upsert(dimension, value).await {
      Ok(entry) => {
        tracing::debug!(dimension = dimension.name(), value, id = entry.id);
        hit.catalog.insert(dimension, entry.id);
      }
      Err(e) => {
        tracing::warn!(dimension = dimension.name(), value, error = %e, "catalog upsert failed");
      }
    }
  }

  match resolve_ip(state, headers, peer).await {
    Ok(ip_id) => hit.ip_id = ip_id,
    Err(e) => tracing::warn!(error = %e, "could not resolve client address"),
  }

  let canonical = match state.store.current_version().await {
    Ok(Some(v)) => Some(v),
    Ok(None) => {
      tracing::warn!("no canonical version configured; skipping upgrade check");
      None
    }
    Err(e) => {
      tracing::warn!(error = %e, "could not read canonical version");
      None
    }
  };

  if let Err(e) = state.store.record_hit(hit).await {
    tracing::warn!(agent = %agent.agent_name, error = %e, "dropping hit");
  }

  match canonical {
    Some(canonical) => {
      match version::check(params.get(Dimension::AgentVersion.request_key()), &canonical) {
        UpgradeCheck::Outdated => Outcome::Outdated { canonical },
        UpgradeCheck::Current => Outcome::Current,
      }
    }
    None => Outcome::Current,
  }
}

/// Look the `User-Agent` up in the agent catalog. Unknown agents, and any
/// store failure during the lookup, resolve to `None`.
async fn resolve_agent<S>(state: &AppState<S>, headers: &HeaderMap) -> Option<Agent>
where
  S: RegistryStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let name = identity::agent_name(headers, &state.config.agent_prefix)?;
  match state.store.find_agent(name).await {
    Ok(Some(agent)) => {
      tracing::debug!(agent = %agent.agent_name, "agent resolved");
      Some(agent)
    }
    Ok(None) => {
      tracing::debug!(agent = name, "agent is not registered");
      None
    }
    Err(e) => {
      tracing::error!(agent = name, error = %e, "agent lookup failed");
      None
    }
  }
}

/// Upsert the client's address, if one could be determined.
async fn resolve_ip<S>(
  state: &AppState<S>,
  headers: &HeaderMap,
  peer: Option<IpAddr>,
) -> Result<Option<i64>>
where
  S: RegistryStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Some(raw) = identity::client_addr(headers, peer) else {
    tracing::debug!("no client address");
    return Ok(None);
  };
  let ip = parse_client_addr(&raw)?;
  let entry = state.store.upsert_ip(ip).await.map_err(Error::store)?;
  Ok(Some(entry.ip_id))
}
