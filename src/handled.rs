use std::collections::HashSet;

/// What has been acted on during the current page lifecycle.
#[derive(Debug, Clone, Default)]
pub struct HandledSet {
    questions: HashSet<String>,
    buttons: HashSet<String>,
    reported_unresolved: HashSet<String>,
}

impl HandledSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; called when a new lifecycle starts.
    pub fn clear(&mut self) {
        self.questions.clear();
        self.buttons.clear();
        self.reported_unresolved.clear();
    }

    pub fn is_question_handled(&self, question: &str) -> bool {
        self.questions.contains(question)
    }

    /// Returns `true` if the question was not already marked.
    pub fn mark_question(&mut self, question: impl Into<String>) -> bool {
        self.questions.insert(question.into())
    }

    pub fn is_button_handled(&self, identity: &str) -> bool {
        self.buttons.contains(identity)
    }

    pub fn mark_button(&mut self, identity: impl Into<String>) -> bool {
        self.buttons.insert(identity.into())
    }

    /// Record that an unresolved question has been reported.
    /// Returns `true` the first time per lifecycle.
    pub fn report_unresolved(&mut self, question: &str) -> bool {
        if self.reported_unresolved.contains(question) {
            return false;
        }
        self.reported_unresolved.insert(question.to_string())
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_clear() {
        let mut handled = HandledSet::new();
        assert!(handled.mark_question("What is your name?"));
        assert!(!handled.mark_question("What is your name?"));
        assert!(handled.mark_button("adventureButton"));
        assert!(handled.is_question_handled("What is your name?"));
        assert!(handled.is_button_handled("adventureButton"));

        handled.clear();
        assert!(!handled.is_question_handled("What is your name?"));
        assert!(!handled.is_button_handled("adventureButton"));
        assert_eq!(handled.question_count(), 0);
    }

    #[test]
    fn test_unresolved_reported_once() {
        let mut handled = HandledSet::new();
        assert!(handled.report_unresolved("Favorite color"));
        assert!(!handled.report_unresolved("Favorite color"));
        handled.clear();
        assert!(handled.report_unresolved("Favorite color"));
    }
}
