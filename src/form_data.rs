//! The answer store and navigation catalog, built once per run.

use crate::alias_map::AliasMap;
use crate::config::{Config, IGNORED_ANSWER};
use crate::navigation::NavCatalog;
use tracing::debug;

/// What the answer store says about a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer<'a> {
    /// Fill the field with this value.
    Text(&'a str),
    /// Known question, deliberately left alone.
    Ignored,
    /// No alias matches the question.
    Missing,
}

/// Immutable form data shared by every lifecycle of a run.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    answers: AliasMap,
    catalog: NavCatalog,
}

impl FormData {
    /// Build the answer store and catalog from a validated config.
    ///
    /// Aliases are stored lower-cased. An alias listed under two entries
    /// belongs to the later one.
    pub fn from_config(config: &Config) -> Self {
        let mut answers = AliasMap::new();
        for entry in &config.answers {
            for alias in &entry.aliases {
                let key = alias.trim().to_lowercase();
                if answers.contains_key(key.as_str()) {
                    debug!("Alias '{}' reassigned to a later answer", key);
                }
                answers.add(key, entry.answer.clone());
            }
        }
        let catalog = NavCatalog::from_targets(&config.navigation);
        debug!(
            "Loaded {} aliases for {} answers, {} navigation sequences",
            answers.len(),
            answers.value_count(),
            catalog.len()
        );
        Self { answers, catalog }
    }

    /// Assemble form data directly.
    pub fn new(answers: AliasMap, catalog: NavCatalog) -> Self {
        Self { answers, catalog }
    }

    /// Look up the answer for a question's label text.
    pub fn answer_for(&self, question: &str) -> Answer<'_> {
        match self.answers.get(question) {
            Some(answer) if answer == IGNORED_ANSWER => Answer::Ignored,
            Some(answer) if !answer.is_empty() => Answer::Text(answer),
            _ => Answer::Missing,
        }
    }

    pub fn answers(&self) -> &AliasMap {
        &self.answers
    }

    pub fn catalog(&self) -> &NavCatalog {
        &self.catalog
    }
}
