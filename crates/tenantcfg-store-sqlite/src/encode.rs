//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. Thresholds and keywords are compact JSON.
//! Enumerated settings are their lowercase names. Versions are `INTEGER`.

use chrono::{DateTime, Utc};
use tenantcfg_core::{
  knowledge::KnowledgeEntry,
  settings::{HandoverMode, Language, Settings, Thresholds},
  snapshot::{ConfigSnapshot, Version, VersionSummary},
};

use crate::{Error, Result};

// ─── Version ──────────────────────────────────────────────────────────────────

pub fn encode_version(v: Version) -> Result<i64> {
  i64::try_from(v).map_err(|_| Error::VersionOutOfRange(v))
}

pub fn decode_version(raw: i64) -> Result<Version> {
  Version::try_from(raw).map_err(|_| Error::Decode(format!("negative version: {raw}")))
}

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerated settings
// ──────────────────────────────────────────────────────

pub fn encode_handover_mode(m: HandoverMode) -> &'static str { m.into() }

pub fn decode_handover_mode(s: &str) -> Result<HandoverMode> {
  HandoverMode::parse(s).map_err(|e| Error::Decode(e.to_string()))
}

pub fn encode_language(l: Language) -> &'static str { l.into() }

pub fn decode_language(s: &str) -> Result<Language> {
  Language::parse(s).map_err(|e| Error::Decode(e.to_string()))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_thresholds(t: &Thresholds) -> Result<String> {
  Ok(serde_json::to_string(t)?)
}

pub fn decode_thresholds(s: &str) -> Result<Thresholds> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_keywords(keywords: &[String]) -> Result<String> {
  Ok(serde_json::to_string(keywords)?)
}

pub fn decode_keywords(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Write-side rows ─────────────────────────────────────────────────────────

/// Column values for a new `config_snapshots` row, encoded before they are
/// moved onto the database thread. `version` and `created_at` are assigned
/// inside the write transaction.
pub struct SnapshotColumns {
  pub tenant_id:      String,
  pub system_message: Option<String>,
  pub handover_mode:  &'static str,
  pub language:       &'static str,
  pub thresholds:     String,
}

impl SnapshotColumns {
  pub fn encode(tenant_id: &str, settings: &Settings) -> Result<Self> {
    Ok(Self {
      tenant_id:      tenant_id.to_owned(),
      system_message: settings.system_message.clone(),
      handover_mode:  encode_handover_mode(settings.handover_mode),
      language:       encode_language(settings.language),
      thresholds:     encode_thresholds(&settings.thresholds)?,
    })
  }
}

/// Column values for one `knowledge_entries` row.
pub struct EntryColumns {
  pub question: String,
  pub answer:   String,
  pub keywords: String,
  pub priority: i64,
}

impl EntryColumns {
  pub fn encode(entry: KnowledgeEntry) -> Result<Self> {
    Ok(Self {
      keywords: encode_keywords(&entry.keywords)?,
      question: entry.question,
      answer:   entry.answer,
      priority: entry.priority,
    })
  }
}

// ─── Read-side rows ──────────────────────────────────────────────────────────

/// Raw values read directly from a `config_snapshots` row.
pub struct RawSnapshot {
  pub tenant_id:      String,
  pub version:        i64,
  pub system_message: Option<String>,
  pub handover_mode:  String,
  pub language:       String,
  pub thresholds:     String,
  pub created_at:     String,
  pub is_current:     bool,
}

impl RawSnapshot {
  /// Column list matching [`RawSnapshot::from_row`].
  pub const COLUMNS: &'static str = "tenant_id, version, system_message, \
     handover_mode, language, thresholds, created_at, is_current";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tenant_id:      row.get(0)?,
      version:        row.get(1)?,
      system_message: row.get(2)?,
      handover_mode:  row.get(3)?,
      language:       row.get(4)?,
      thresholds:     row.get(5)?,
      created_at:     row.get(6)?,
      is_current:     row.get(7)?,
    })
  }

  pub fn into_snapshot(self) -> Result<ConfigSnapshot> {
    Ok(ConfigSnapshot {
      tenant_id:  self.tenant_id,
      version:    decode_version(self.version)?,
      settings:   Settings {
        system_message: self.system_message,
        handover_mode:  decode_handover_mode(&self.handover_mode)?,
        language:       decode_language(&self.language)?,
        thresholds:     decode_thresholds(&self.thresholds)?,
      },
      created_at: decode_dt(&self.created_at)?,
      is_current: self.is_current,
    })
  }
}

/// Raw values read from a `knowledge_entries` row.
pub struct RawEntry {
  pub question: String,
  pub answer:   String,
  pub keywords: String,
  pub priority: i64,
}

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      question: row.get(0)?,
      answer:   row.get(1)?,
      keywords: row.get(2)?,
      priority: row.get(3)?,
    })
  }

  pub fn into_entry(self) -> Result<KnowledgeEntry> {
    Ok(KnowledgeEntry {
      question: self.question,
      answer:   self.answer,
      keywords: decode_keywords(&self.keywords)?,
      priority: self.priority,
    })
  }
}

/// Raw values for one line of a history listing.
pub struct RawSummary {
  pub version:    i64,
  pub created_at: String,
  pub is_current: bool,
}

impl RawSummary {
  pub fn into_summary(self) -> Result<VersionSummary> {
    Ok(VersionSummary {
      version:    decode_version(self.version)?,
      created_at: decode_dt(&self.created_at)?,
      is_current: self.is_current,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn enum_columns_are_lowercase_names() {
    assert_eq!(encode_handover_mode(HandoverMode::Immediate), "immediate");
    assert_eq!(encode_language(Language::Uk), "uk");
    assert_eq!(decode_language("uk").unwrap(), Language::Uk);
  }

  #[test]
  fn unknown_stored_enum_is_a_decode_error() {
    assert!(matches!(decode_handover_mode("later"), Err(Error::Decode(_))));
  }

  #[test]
  fn versions_beyond_i64_are_refused() {
    assert_eq!(encode_version(7).unwrap(), 7);
    assert!(matches!(
      encode_version(u64::MAX),
      Err(Error::VersionOutOfRange(u64::MAX))
    ));
    assert!(matches!(decode_version(-1), Err(Error::Decode(_))));
  }
}
