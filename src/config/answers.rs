use serde::Deserialize;

/// Answer value meaning "recognized question, leave the field alone".
pub const IGNORED_ANSWER: &str = "-ignored-input-fields";

/// One canonical answer and the question fragments that select it.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerEntry {
    /// Lower-case question fragments matched by substring.
    #[serde(alias = "question")]
    pub aliases: Vec<String>,

    /// Text typed or option picked; [`IGNORED_ANSWER`] to skip the field.
    pub answer: String,
}

impl AnswerEntry {
    /// Whether this entry marks its questions as intentionally skipped.
    pub fn is_ignored(&self) -> bool {
        self.answer == IGNORED_ANSWER
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.aliases.is_empty() {
            return Err("at least one alias is required".into());
        }
        if let Some(pos) = self.aliases.iter().position(|a| a.trim().is_empty()) {
            return Err(format!("alias {} is empty", pos));
        }
        if self.answer.is_empty() {
            return Err(format!(
                "answer is empty (use '{}' to skip a field)",
                IGNORED_ANSWER
            ));
        }
        Ok(())
    }
}
