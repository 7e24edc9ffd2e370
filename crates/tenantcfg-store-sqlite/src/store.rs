//! [`SqliteStore`] — the SQLite implementation of [`ConfigStore`].

use std::{path::Path, sync::Arc, time::Duration};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use tenantcfg_core::{
  settings::{ConfigDraft, validate_tenant_id},
  snapshot::{ConfigView, Initialized, Version, VersionSummary},
  store::ConfigStore,
};

use crate::{
  Error, Result,
  encode::{
    EntryColumns, RawEntry, RawSnapshot, RawSummary, SnapshotColumns,
    decode_version, encode_dt, encode_version,
  },
  locks::TenantLocks,
  schema::SCHEMA,
};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Tunables for [`SqliteStore::open_with`].
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
  /// How long a writer waits for its tenant's write section (and for SQLite
  /// to release a busy database) before failing with
  /// [`Error::ConcurrencyConflict`].
  pub lock_timeout: Duration,
}

impl Default for StoreOptions {
  fn default() -> Self { Self { lock_timeout: Duration::from_secs(5) } }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A configuration store backed by a single SQLite file.
///
/// Cloning is cheap; the connection and the lock registry are shared.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn:  tokio_rusqlite::Connection,
  pub(crate) locks: Arc<TenantLocks>,
}

/// What a revert transaction found.
enum RevertOutcome {
  Missing,
  AlreadyCurrent,
  Moved { from: Option<i64> },
}

impl SqliteStore {
  /// Open (or create) a store at `path` with default options.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, StoreOptions::default()).await
  }

  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open_with(
    path: impl AsRef<Path>,
    options: StoreOptions,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, options).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with(StoreOptions::default()).await
  }

  pub async fn open_in_memory_with(options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, options).await
  }

  async fn init(
    conn: tokio_rusqlite::Connection,
    options: StoreOptions,
  ) -> Result<Self> {
    let busy_timeout = options.lock_timeout;
    conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;

    Ok(Self { conn, locks: Arc::new(TenantLocks::new(options.lock_timeout)) })
  }

  /// Turn a failed write transaction into the caller-facing error kind.
  ///
  /// The transaction has already been rolled back by the time this runs:
  /// `rusqlite::Transaction` rolls back on drop.
  fn classify_write_error(tenant_id: &str, err: tokio_rusqlite::Error) -> Error {
    use rusqlite::ErrorCode;

    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      ref failure,
      ref message,
    )) = err
    {
      match failure.code {
        ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
          tracing::warn!(tenant_id, "database busy; write abandoned");
          return Error::ConcurrencyConflict(tenant_id.to_owned());
        }
        // The only unique key on `tenant_id` alone is the one-current index;
        // the primary key violation names `tenant_id, version` instead.
        ErrorCode::ConstraintViolation
          if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            && message
              .as_deref()
              .is_some_and(|m| m.ends_with(" config_snapshots.tenant_id")) =>
        {
          tracing::error!(
            tenant_id,
            "storage rejected a second current snapshot; write rolled back"
          );
          return Error::InvariantViolation {
            tenant_id: tenant_id.to_owned(),
            detail:    "more than one current snapshot".to_owned(),
          };
        }
        _ => {}
      }
    }

    tracing::warn!(tenant_id, error = %err, "write failed and was rolled back");
    Error::PartialWrite { tenant_id: tenant_id.to_owned(), source: err }
  }

  /// Read one snapshot and its entries inside a single read transaction.
  ///
  /// `version = None` selects the current snapshot.
  async fn read_view(
    &self,
    tenant_id: &str,
    version: Option<i64>,
  ) -> Result<Option<ConfigView>> {
    let tenant = tenant_id.to_owned();

    let raw: Option<(RawSnapshot, Vec<RawEntry>)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let snapshot = match version {
          Some(v) => tx
            .query_row(
              &format!(
                "SELECT {} FROM config_snapshots
                 WHERE tenant_id = ?1 AND version = ?2",
                RawSnapshot::COLUMNS
              ),
              rusqlite::params![tenant, v],
              RawSnapshot::from_row,
            )
            .optional()?,
          None => tx
            .query_row(
              &format!(
                "SELECT {} FROM current_snapshots WHERE tenant_id = ?1",
                RawSnapshot::COLUMNS
              ),
              rusqlite::params![tenant],
              RawSnapshot::from_row,
            )
            .optional()?,
        };

        let Some(snapshot) = snapshot else {
          return Ok(None);
        };

        let entries = {
          let mut stmt = tx.prepare(
            "SELECT question, answer, keywords, priority
             FROM knowledge_entries
             WHERE tenant_id = ?1 AND version = ?2
             ORDER BY position",
          )?;
          stmt
            .query_map(
              rusqlite::params![snapshot.tenant_id, snapshot.version],
              RawEntry::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.commit()?;
        Ok(Some((snapshot, entries)))
      })
      .await?;

    let Some((snapshot, entries)) = raw else {
      return Ok(None);
    };

    Ok(Some(ConfigView {
      snapshot: snapshot.into_snapshot()?,
      entries:  entries
        .into_iter()
        .map(RawEntry::into_entry)
        .collect::<Result<_>>()?,
    }))
  }
}

fn version_not_found(tenant_id: &str, version: Version) -> Error {
  Error::VersionNotFound { tenant_id: tenant_id.to_owned(), version }
}

/// Validate a draft and encode it for the write transaction.
fn encode_draft(
  tenant_id: &str,
  draft: ConfigDraft,
) -> Result<(SnapshotColumns, Vec<EntryColumns>)> {
  validate_tenant_id(tenant_id)?;
  let (settings, entries) = draft.validate()?;

  let snapshot = SnapshotColumns::encode(tenant_id, &settings)?;
  let entries = entries
    .into_iter()
    .map(EntryColumns::encode)
    .collect::<Result<Vec<_>>>()?;
  Ok((snapshot, entries))
}

/// Append the tenant's next version and make it current. Runs inside the
/// caller's write transaction, with the tenant section held, so both the
/// version number and `created_at` follow commit order.
fn append_version(
  tx: &rusqlite::Transaction<'_>,
  snapshot: &SnapshotColumns,
  entries: &[EntryColumns],
) -> rusqlite::Result<i64> {
  let latest: Option<i64> = tx.query_row(
    "SELECT MAX(version) FROM config_snapshots WHERE tenant_id = ?1",
    rusqlite::params![snapshot.tenant_id],
    |r| r.get(0),
  )?;
  let version = latest.unwrap_or(0) + 1;
  let created_at = encode_dt(Utc::now());

  tx.execute(
    "UPDATE config_snapshots SET is_current = 0
     WHERE tenant_id = ?1 AND is_current = 1",
    rusqlite::params![snapshot.tenant_id],
  )?;

  tx.execute(
    "INSERT INTO config_snapshots (
       tenant_id, version, system_message, handover_mode,
       language, thresholds, created_at, is_current
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
    rusqlite::params![
      snapshot.tenant_id,
      version,
      snapshot.system_message,
      snapshot.handover_mode,
      snapshot.language,
      snapshot.thresholds,
      created_at,
    ],
  )?;

  let mut stmt = tx.prepare(
    "INSERT INTO knowledge_entries (
       tenant_id, version, position, question, answer, keywords, priority
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
  )?;
  for (position, entry) in entries.iter().enumerate() {
    stmt.execute(rusqlite::params![
      snapshot.tenant_id,
      version,
      position as i64,
      entry.question,
      entry.answer,
      entry.keywords,
      entry.priority,
    ])?;
  }

  Ok(version)
}

// ─── ConfigStore impl ────────────────────────────────────────────────────────

impl ConfigStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn commit(&self, tenant_id: &str, draft: ConfigDraft) -> Result<Version> {
    let (snapshot, entries) = encode_draft(tenant_id, draft)?;
    let entry_count = entries.len();

    let _section = self.locks.acquire(tenant_id).await?;

    let allocated: i64 = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock before the version is read, so no
        // other connection can allocate the same number.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let version = append_version(&tx, &snapshot, &entries)?;
        tx.commit()?;
        Ok(version)
      })
      .await
      .map_err(|e| Self::classify_write_error(tenant_id, e))?;

    let version = decode_version(allocated)?;
    tracing::info!(tenant_id, version, entries = entry_count, "committed configuration");
    Ok(version)
  }

  async fn initialize(&self, tenant_id: &str, draft: ConfigDraft) -> Result<Initialized> {
    let (snapshot, entries) = encode_draft(tenant_id, draft)?;

    let _section = self.locks.acquire(tenant_id).await?;

    let (raw, created): (i64, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
          .query_row(
            "SELECT version FROM current_snapshots WHERE tenant_id = ?1",
            rusqlite::params![snapshot.tenant_id],
            |r| r.get(0),
          )
          .optional()?;
        if let Some(version) = existing {
          return Ok((version, false));
        }

        let version = append_version(&tx, &snapshot, &entries)?;
        tx.commit()?;
        Ok((version, true))
      })
      .await
      .map_err(|e| Self::classify_write_error(tenant_id, e))?;

    let version = decode_version(raw)?;
    if created {
      tracing::info!(tenant_id, version, "initialized tenant configuration");
    } else {
      tracing::debug!(tenant_id, version, "tenant already configured");
    }
    Ok(Initialized { version, created })
  }

  async fn revert(&self, tenant_id: &str, version: Version) -> Result<()> {
    // Versions past `i64::MAX` are never allocated.
    let Ok(target) = encode_version(version) else {
      return Err(version_not_found(tenant_id, version));
    };
    let tenant = tenant_id.to_owned();

    let _section = self.locks.acquire(tenant_id).await?;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let target_is_current: Option<bool> = tx
          .query_row(
            "SELECT is_current FROM config_snapshots
             WHERE tenant_id = ?1 AND version = ?2",
            rusqlite::params![tenant, target],
            |r| r.get(0),
          )
          .optional()?;

        match target_is_current {
          None => return Ok(RevertOutcome::Missing),
          Some(true) => return Ok(RevertOutcome::AlreadyCurrent),
          Some(false) => {}
        }

        let from: Option<i64> = tx
          .query_row(
            "SELECT version FROM current_snapshots WHERE tenant_id = ?1",
            rusqlite::params![tenant],
            |r| r.get(0),
          )
          .optional()?;

        tx.execute(
          "UPDATE config_snapshots SET is_current = 0
           WHERE tenant_id = ?1 AND is_current = 1",
          rusqlite::params![tenant],
        )?;
        tx.execute(
          "UPDATE config_snapshots SET is_current = 1
           WHERE tenant_id = ?1 AND version = ?2",
          rusqlite::params![tenant, target],
        )?;

        tx.commit()?;
        Ok(RevertOutcome::Moved { from })
      })
      .await
      .map_err(|e| Self::classify_write_error(tenant_id, e))?;

    match outcome {
      RevertOutcome::Missing => Err(version_not_found(tenant_id, version)),
      RevertOutcome::AlreadyCurrent => {
        tracing::debug!(tenant_id, version, "revert target already current");
        Ok(())
      }
      RevertOutcome::Moved { from } => {
        tracing::info!(tenant_id, from, to = version, "reverted current pointer");
        Ok(())
      }
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_current(&self, tenant_id: &str) -> Result<ConfigView> {
    self
      .read_view(tenant_id, None)
      .await?
      .ok_or_else(|| Error::NoConfiguration(tenant_id.to_owned()))
  }

  async fn get_version(&self, tenant_id: &str, version: Version) -> Result<ConfigView> {
    let Ok(target) = encode_version(version) else {
      return Err(version_not_found(tenant_id, version));
    };
    self
      .read_view(tenant_id, Some(target))
      .await?
      .ok_or_else(|| version_not_found(tenant_id, version))
  }

  async fn list_versions(&self, tenant_id: &str) -> Result<Vec<VersionSummary>> {
    let tenant = tenant_id.to_owned();

    let raws: Vec<RawSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT version, created_at, is_current
           FROM config_snapshots
           WHERE tenant_id = ?1
           ORDER BY version DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![tenant], |row| {
            Ok(RawSummary {
              version:    row.get(0)?,
              created_at: row.get(1)?,
              is_current: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  async fn list_tenants(&self) -> Result<Vec<String>> {
    let tenants = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT tenant_id FROM config_snapshots ORDER BY tenant_id",
        )?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(tenants)
  }
}
