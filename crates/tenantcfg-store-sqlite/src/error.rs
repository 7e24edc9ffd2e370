//! Error type for `tenantcfg-store-sqlite`.

use tenantcfg_core::snapshot::Version;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The draft failed validation; nothing was written.
  #[error("invalid configuration: {0}")]
  InvalidConfig(#[from] tenantcfg_core::Error),

  #[error("tenant {tenant_id:?} has no version {version}")]
  VersionNotFound { tenant_id: String, version: Version },

  /// The tenant has never committed. Distinct from [`Error::VersionNotFound`]
  /// so callers can fall back to defaults.
  #[error("tenant {0:?} has no configuration")]
  NoConfiguration(String),

  /// The tenant's write section could not be entered in time.
  #[error("tenant {0:?} is busy with another write; retry later")]
  ConcurrencyConflict(String),

  /// A write failed part-way through and was rolled back in full.
  #[error("write for tenant {tenant_id:?} rolled back: {source}")]
  PartialWrite {
    tenant_id: String,
    #[source]
    source:    tokio_rusqlite::Error,
  },

  /// The storage layer refused a state that breaks a store invariant.
  #[error("invariant violated for tenant {tenant_id:?}: {detail}")]
  InvariantViolation { tenant_id: String, detail: String },

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column holds a value the domain types cannot represent.
  #[error("corrupt column value: {0}")]
  Decode(String),

  #[error("version {0} does not fit in a database integer")]
  VersionOutOfRange(Version),
}

impl Error {
  /// Whether retrying the same call may succeed without changing the input.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::ConcurrencyConflict(_) | Self::PartialWrite { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
