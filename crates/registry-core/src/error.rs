//! Error types for `registry-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid client address: {0:?}")]
  InvalidAddress(String),

  #[error("empty catalog value for {0}")]
  EmptyValue(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
