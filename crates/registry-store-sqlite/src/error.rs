//! Error type for `registry-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] registry_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("agent {0:?} is already registered")]
  AgentExists(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
