//! Knowledge entries: the question/answer list versioned alongside settings.
//!
//! Entries have no identity of their own. They belong to exactly one
//! (tenant, version) pair and a commit always replaces the whole list.

use serde::{Deserialize, Serialize};

/// One FAQ item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
  pub question: String,
  pub answer:   String,
  /// Extra match terms, in the order the author gave them.
  #[serde(default)]
  pub keywords: Vec<String>,
  /// Higher values are offered first when several entries match.
  #[serde(default)]
  pub priority: i64,
}

impl KnowledgeEntry {
  /// Convenience constructor with no keywords and priority 0.
  pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
    Self {
      question: question.into(),
      answer:   answer.into(),
      keywords: Vec::new(),
      priority: 0,
    }
  }
}
