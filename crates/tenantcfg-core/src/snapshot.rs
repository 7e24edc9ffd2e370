//! Snapshots and the read models assembled from them.
//!
//! A snapshot is written once by a commit and never changes afterwards,
//! except for its `is_current` flag. Which snapshot is current is a pointer
//! the store moves; the history itself is append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{knowledge::KnowledgeEntry, settings::Settings};

/// Per-tenant version number. Allocated in creation order, never reused.
pub type Version = u64;

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// One committed configuration state for a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
  pub tenant_id:  String,
  pub version:    Version,
  pub settings:   Settings,
  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
  pub is_current: bool,
}

/// A row of a tenant's history listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
  pub version:    Version,
  pub created_at: DateTime<Utc>,
  pub is_current: bool,
}

/// Result of [`ConfigStore::initialize`](crate::store::ConfigStore::initialize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initialized {
  /// The tenant's current version after the call.
  pub version: Version,
  /// `false` when the tenant already had history and nothing was written.
  pub created: bool,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A snapshot bundled with the complete knowledge list committed with it.
///
/// Both halves are always read from the same point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigView {
  pub snapshot: ConfigSnapshot,
  /// Entries in the order they were committed.
  pub entries:  Vec<KnowledgeEntry>,
}

impl ConfigView {
  pub fn version(&self) -> Version { self.snapshot.version }

  pub fn settings(&self) -> &Settings { &self.snapshot.settings }

  /// Entries ordered for matching: highest priority first, committed order
  /// breaking ties.
  pub fn entries_by_priority(&self) -> Vec<&KnowledgeEntry> {
    let mut sorted: Vec<&KnowledgeEntry> = self.entries.iter().collect();
    // `sort_by` is stable, so equal priorities keep their committed order.
    sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
    sorted
  }
}
