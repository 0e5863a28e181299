//! Response policy: the three ways a phone-home request can end.

use axum::{
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};

use crate::ServerConfig;

/// Terminal outcome of a phone-home request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// The agent is not one we know; no hit was recorded.
  UnknownAgent,
  /// Hit recorded; the client should upgrade to `canonical`.
  Outdated { canonical: String },
  /// Hit recorded; nothing to tell the client.
  Current,
}

pub fn upgrade_message(canonical: &str, download_page: &str) -> String {
  format!(
    "Please upgrade to {canonical}, see {download_page} for the latest version."
  )
}

impl Outcome {
  pub fn into_response(self, config: &ServerConfig) -> Response {
    match self {
      Outcome::UnknownAgent => (
        StatusCode::FOUND,
        [(header::LOCATION, config.upgrade_check_url.clone())],
      )
        .into_response(),
      Outcome::Outdated { canonical } => {
        let body = upgrade_message(&canonical, &config.download_page);
        tracing::debug!(%body, "client outdated");
        (
          StatusCode::OK,
          [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
          body,
        )
          .into_response()
      }
      Outcome::Current => StatusCode::OK.into_response(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tests::test_config;

  #[test]
  fn message_names_version_and_download_page() {
    assert_eq!(
      upgrade_message("1.2.3", "https://example.org/dl"),
      "Please upgrade to 1.2.3, see https://example.org/dl for the latest version."
    );
  }

  #[test]
  fn unknown_agent_redirects_with_302() {
    let resp = Outcome::UnknownAgent.into_response(&test_config());
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
      resp.headers().get(header::LOCATION).unwrap(),
      "https://example.org/upgrade-check"
    );
  }

  #[test]
  fn current_is_plain_200() {
    let resp = Outcome::Current.into_response(&test_config());
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::LOCATION).is_none());
  }
}
