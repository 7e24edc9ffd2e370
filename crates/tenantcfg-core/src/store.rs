//! The `ConfigStore` trait.
//!
//! Implemented by storage backends (e.g. `tenantcfg-store-sqlite`). Callers
//! such as an HTTP layer or the decision workflow depend on this abstraction,
//! never on a concrete backend.

use std::future::Future;

use crate::{
  settings::ConfigDraft,
  snapshot::{ConfigView, Initialized, Version, VersionSummary},
};

/// Abstraction over a versioned, multi-tenant configuration store.
///
/// History is append-only: [`commit`](Self::commit) adds a version and makes
/// it current, [`revert`](Self::revert) moves the current pointer back to an
/// existing version. Nothing is ever deleted or edited in place.
///
/// Writes for one tenant are serialized; writes for different tenants are
/// independent. All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait ConfigStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Validate `draft`, store it as a new version and make it current.
  ///
  /// Returns the allocated version, which is greater than every version the
  /// tenant has ever had, regardless of where the current pointer is.
  fn commit<'a>(
    &'a self,
    tenant_id: &'a str,
    draft: ConfigDraft,
  ) -> impl Future<Output = Result<Version, Self::Error>> + Send + 'a;

  /// Make an existing version current again. Reverting to the version that
  /// is already current succeeds without changes.
  fn revert<'a>(
    &'a self,
    tenant_id: &'a str,
    version: Version,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Commit `draft` as version 1 if the tenant has no history yet; otherwise
  /// leave everything as it is and report the current version.
  ///
  /// The existence check and the write are one atomic step, so concurrent
  /// callers produce exactly one version.
  fn initialize<'a>(
    &'a self,
    tenant_id: &'a str,
    draft: ConfigDraft,
  ) -> impl Future<Output = Result<Initialized, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The current configuration. Fails with a "no configuration" error if the
  /// tenant has never committed, so callers can fall back to defaults.
  fn get_current<'a>(
    &'a self,
    tenant_id: &'a str,
  ) -> impl Future<Output = Result<ConfigView, Self::Error>> + Send + 'a;

  /// The configuration as committed at `version`.
  fn get_version<'a>(
    &'a self,
    tenant_id: &'a str,
    version: Version,
  ) -> impl Future<Output = Result<ConfigView, Self::Error>> + Send + 'a;

  /// Every version of the tenant, newest first. Empty for unknown tenants.
  fn list_versions<'a>(
    &'a self,
    tenant_id: &'a str,
  ) -> impl Future<Output = Result<Vec<VersionSummary>, Self::Error>> + Send + 'a;

  /// Every tenant with at least one committed version, sorted.
  fn list_tenants(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;
}
