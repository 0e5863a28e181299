//! `/robots.txt` — keep crawlers away from the endpoint.

use axum::{
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};

pub const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /*";

pub async fn handler() -> Response {
  (
    StatusCode::OK,
    [(header::CONTENT_TYPE, "text/plain")],
    ROBOTS_TXT,
  )
    .into_response()
}
