//! Error types for `tenantcfg-core`.

use thiserror::Error;

/// Reasons a configuration draft is rejected before anything is written.
#[derive(Debug, Error)]
pub enum Error {
  #[error("tenant id must not be empty")]
  EmptyTenantId,

  #[error("unknown handover mode: {0:?}")]
  UnknownHandoverMode(String),

  #[error("unsupported language: {0:?}")]
  UnsupportedLanguage(String),

  #[error("thresholds must be a JSON object, got {0}")]
  MalformedThresholds(&'static str),

  #[error("knowledge entry {index} has an empty question")]
  EmptyQuestion { index: usize },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
