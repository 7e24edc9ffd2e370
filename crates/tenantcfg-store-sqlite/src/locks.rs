//! Per-tenant write sections.
//!
//! Commit and revert for one tenant must not interleave; writes for
//! different tenants never wait on each other. Each tenant gets its own async
//! mutex, created on first use. A writer that cannot enter within the
//! configured timeout gives up with [`Error::ConcurrencyConflict`].

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use tokio::sync::OwnedMutexGuard;

use crate::{Error, Result};

/// Registry of tenant mutexes. Entries live as long as the store.
pub struct TenantLocks {
  timeout: Duration,
  tenants: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Proof that the holder is the only writer for a tenant. Dropping it, on
/// any exit path including future cancellation, releases the section.
#[must_use = "the tenant section is released as soon as the guard is dropped"]
pub struct TenantGuard {
  _guard: OwnedMutexGuard<()>,
}

impl TenantLocks {
  pub fn new(timeout: Duration) -> Self {
    Self { timeout, tenants: Mutex::new(HashMap::new()) }
  }

  /// Enter the write section for `tenant_id`, waiting at most the
  /// configured timeout.
  pub async fn acquire(&self, tenant_id: &str) -> Result<TenantGuard> {
    let mutex = {
      // Never held across an await.
      let mut tenants =
        self.tenants.lock().unwrap_or_else(PoisonError::into_inner);
      tenants.entry(tenant_id.to_owned()).or_default().clone()
    };

    match tokio::time::timeout(self.timeout, mutex.lock_owned()).await {
      Ok(guard) => {
        tracing::debug!(tenant_id, "entered tenant write section");
        Ok(TenantGuard { _guard: guard })
      }
      Err(_) => {
        tracing::warn!(
          tenant_id,
          timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
          "timed out waiting for tenant write section"
        );
        Err(Error::ConcurrencyConflict(tenant_id.to_owned()))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn second_writer_times_out_while_first_holds() {
    let locks = TenantLocks::new(Duration::from_millis(20));
    let _held = locks.acquire("t1").await.unwrap();

    let err = locks.acquire("t1").await.err().unwrap();
    assert!(matches!(err, Error::ConcurrencyConflict(t) if t == "t1"));
  }

  #[tokio::test]
  async fn tenants_do_not_block_each_other() {
    let locks = TenantLocks::new(Duration::from_millis(20));
    let _a = locks.acquire("a").await.unwrap();
    assert!(locks.acquire("b").await.is_ok());
  }

  #[tokio::test]
  async fn dropping_the_guard_releases_the_section() {
    let locks = TenantLocks::new(Duration::from_millis(20));
    drop(locks.acquire("t1").await.unwrap());
    assert!(locks.acquire("t1").await.is_ok());
  }
}
