//! Who is calling: the client product from `User-Agent` and the originating
//! address from `X-Forwarded-For` or the socket peer.
//!
//! Both resolvers are pure header reads; catalog lookups happen in the
//! handler.

use std::net::IpAddr;

use axum::http::{HeaderMap, HeaderName, header};

pub const X_FORWARDED_FOR: HeaderName =
  HeaderName::from_static("x-forwarded-for");

/// The `User-Agent` value, if it belongs to the product family identified by
/// `prefix`.
pub fn agent_name<'h>(headers: &'h HeaderMap, prefix: &str) -> Option<&'h str> {
  let ua = headers.get(header::USER_AGENT)?.to_str().ok()?;
  if ua.starts_with(prefix) {
    Some(ua)
  } else {
    tracing::debug!(user_agent = ua, "not a recognised product agent");
    None
  }
}

/// The originating client address as sent, before validation.
///
/// When `X-Forwarded-For` is present, every line of it is read as one
/// comma-separated chain and its *last* entry is used; the peer address is
/// ignored even if that entry is empty or unreadable. Without the header, the
/// direct peer address is used.
pub fn client_addr(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<String> {
  let lines = headers.get_all(&X_FORWARDED_FOR);
  if lines.iter().next().is_none() {
    return peer.map(|ip| ip.to_string());
  }

  let chain = lines
    .iter()
    .map(|v| v.to_str())
    .collect::<Result<Vec<_>, _>>()
    .ok()?
    .join(",");
  tracing::debug!(x_forwarded_for = %chain);
  let last = chain.rsplit(',').next()?.trim();
  (!last.is_empty()).then(|| last.to_owned())
}
