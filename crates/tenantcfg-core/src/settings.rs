//! Settings types: the per-tenant configuration fields carried by every
//! snapshot, and the unvalidated [`ConfigDraft`] callers submit.
//!
//! A draft holds raw strings for the enumerated fields because it normally
//! arrives from an untrusted transport (JSON body, CLI file). Validation turns
//! it into typed [`Settings`] plus the knowledge list, or rejects it before
//! any write is attempted.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result, knowledge::KnowledgeEntry};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// What the assistant does when a conversation needs a human operator.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HandoverMode {
  /// Ask the client whether they want to be handed over.
  #[default]
  Ask,
  /// Hand over to an operator without asking.
  Immediate,
}

/// Languages the assistant can be configured to answer in.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
  #[default]
  En,
  Ru,
  Uk,
  De,
  Fr,
  Es,
}

impl HandoverMode {
  pub fn parse(raw: &str) -> Result<Self> {
    raw
      .trim()
      .parse()
      .map_err(|_| Error::UnknownHandoverMode(raw.to_owned()))
  }
}

impl Language {
  pub fn parse(raw: &str) -> Result<Self> {
    raw
      .trim()
      .parse()
      .map_err(|_| Error::UnsupportedLanguage(raw.to_owned()))
  }
}

// ─── Thresholds ──────────────────────────────────────────────────────────────

/// Tuning parameters for the decision workflow. The store never looks inside;
/// it only guarantees the value is a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thresholds(pub serde_json::Map<String, serde_json::Value>);

impl Thresholds {
  /// Accept an object as-is and `null` as the empty object.
  pub fn from_value(value: serde_json::Value) -> Result<Self> {
    use serde_json::Value;
    match value {
      Value::Object(map) => Ok(Self(map)),
      Value::Null => Ok(Self::default()),
      Value::Bool(_) => Err(Error::MalformedThresholds("a boolean")),
      Value::Number(_) => Err(Error::MalformedThresholds("a number")),
      Value::String(_) => Err(Error::MalformedThresholds("a string")),
      Value::Array(_) => Err(Error::MalformedThresholds("an array")),
    }
  }

  pub fn to_value(&self) -> serde_json::Value {
    serde_json::Value::Object(self.0.clone())
  }
}

// ─── Settings ────────────────────────────────────────────────────────────────

/// The validated, write-once settings fields of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
  /// The system prompt handed to the AI workflow.
  pub system_message: Option<String>,
  pub handover_mode:  HandoverMode,
  pub language:       Language,
  pub thresholds:     Thresholds,
}

// ─── ConfigDraft ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::ConfigStore::commit`]: a full replacement of the
/// tenant's settings and knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDraft {
  #[serde(default)]
  pub system_message: Option<String>,
  pub handover_mode:  String,
  pub language:       String,
  #[serde(default)]
  pub thresholds:     serde_json::Value,
  /// The complete knowledge list for the new version, in display order.
  #[serde(default)]
  pub knowledge:      Vec<KnowledgeEntry>,
}

impl ConfigDraft {
  /// The settings a tenant starts out with: no prompt, `ask`, `en`, no
  /// thresholds and an empty knowledge base.
  pub fn default_for() -> Self {
    Self::from_settings(Settings::default(), Vec::new())
  }

  /// Build a draft from already-typed settings.
  pub fn from_settings(settings: Settings, knowledge: Vec<KnowledgeEntry>) -> Self {
    Self {
      system_message: settings.system_message,
      handover_mode:  settings.handover_mode.to_string(),
      language:       settings.language.to_string(),
      thresholds:     settings.thresholds.to_value(),
      knowledge,
    }
  }

  /// Check every field and split the draft into typed settings and the
  /// knowledge list. Nothing is written if this fails.
  pub fn validate(self) -> Result<(Settings, Vec<KnowledgeEntry>)> {
    let settings = Settings {
      system_message: self.system_message,
      handover_mode:  HandoverMode::parse(&self.handover_mode)?,
      language:       Language::parse(&self.language)?,
      thresholds:     Thresholds::from_value(self.thresholds)?,
    };

    if let Some(index) = self
      .knowledge
      .iter()
      .position(|entry| entry.question.trim().is_empty())
    {
      return Err(Error::EmptyQuestion { index });
    }

    Ok((settings, self.knowledge))
  }
}

/// Reject blank tenant identifiers; anything else is an opaque key.
pub fn validate_tenant_id(tenant_id: &str) -> Result<()> {
  if tenant_id.trim().is_empty() {
    return Err(Error::EmptyTenantId);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use strum::IntoEnumIterator as _;

  use super::*;

  fn draft(handover_mode: &str, language: &str) -> ConfigDraft {
    ConfigDraft {
      system_message: Some("Hello".into()),
      handover_mode:  handover_mode.into(),
      language:       language.into(),
      thresholds:     json!({ "confidence": 0.7 }),
      knowledge:      vec![KnowledgeEntry::new("Hours?", "9 to 5")],
    }
  }

  #[test]
  fn valid_draft_splits_into_settings_and_entries() {
    let (settings, entries) = draft("immediate", "de").validate().unwrap();
    assert_eq!(settings.handover_mode, HandoverMode::Immediate);
    assert_eq!(settings.language, Language::De);
    assert_eq!(settings.thresholds.0["confidence"], json!(0.7));
    assert_eq!(entries.len(), 1);
  }

  #[test]
  fn enum_fields_parse_case_insensitively() {
    let (settings, _) = draft(" Ask ", "EN").validate().unwrap();
    assert_eq!(settings.handover_mode, HandoverMode::Ask);
    assert_eq!(settings.language, Language::En);
  }

  #[test]
  fn bogus_handover_mode_is_rejected() {
    let err = draft("bogus", "en").validate().unwrap_err();
    assert!(matches!(err, Error::UnknownHandoverMode(m) if m == "bogus"));
  }

  #[test]
  fn unsupported_language_is_rejected() {
    let err = draft("ask", "klingon").validate().unwrap_err();
    assert!(matches!(err, Error::UnsupportedLanguage(_)));
  }

  #[test]
  fn thresholds_must_be_an_object() {
    assert!(Thresholds::from_value(json!(null)).unwrap().0.is_empty());
    assert!(matches!(
      Thresholds::from_value(json!([1, 2])),
      Err(Error::MalformedThresholds("an array"))
    ));
    assert!(matches!(
      Thresholds::from_value(json!("0.5")),
      Err(Error::MalformedThresholds("a string"))
    ));
  }

  #[test]
  fn blank_question_is_rejected_with_its_position() {
    let mut d = draft("ask", "en");
    d.knowledge.push(KnowledgeEntry::new("   ", "nothing"));
    let err = d.validate().unwrap_err();
    assert!(matches!(err, Error::EmptyQuestion { index: 1 }));
  }

  #[test]
  fn default_draft_validates_to_default_settings() {
    let (settings, entries) = ConfigDraft::default_for().validate().unwrap();
    assert_eq!(settings, Settings::default());
    assert!(entries.is_empty());
  }

  #[test]
  fn every_language_survives_display_then_parse() {
    for lang in Language::iter() {
      assert_eq!(Language::parse(lang.as_ref()).unwrap(), lang);
    }
  }

  #[test]
  fn tenant_id_must_not_be_blank() {
    assert!(validate_tenant_id("t1").is_ok());
    assert!(matches!(validate_tenant_id("  "), Err(Error::EmptyTenantId)));
  }
}
