//! Accumulated answers, in question order

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    List(Vec<String>),
}

impl Answer {
    /// Items of a list answer; a text answer is a single item
    pub fn items(&self) -> Vec<&str> {
        match self {
            Answer::Text(text) => vec![text.as_str()],
            Answer::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// Human-readable form, list items joined with `separator`
    pub fn display(&self, separator: &str) -> String {
        match self {
            Answer::Text(text) => text.clone(),
            Answer::List(items) => items.join(separator),
        }
    }
}

/// Ordered mapping of question key to answer.
///
/// Entries are only ever appended by the collector, so the key order is always a
/// prefix of the owning question set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    entries: Vec<(String, Answer)>,
}

impl AnswerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Answer> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, answer)| answer)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.entries.iter().map(|(k, a)| (k.as_str(), a))
    }

    pub(crate) fn push(&mut self, key: String, answer: Answer) {
        self.entries.push((key, answer));
    }
}
