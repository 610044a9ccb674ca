use super::HandleOutcome;
use crate::config::IGNORED_ANSWER;
use crate::driver::{DocumentDriver, DriverResult, NodeHandle};
use tracing::debug;

/// One clickable option of a radio group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioOption {
    pub label: String,
    pub node: NodeHandle,
}

/// Radio inputs sharing a container, none of them checked yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioGroup {
    pub container_id: String,
    pub question: String,
    pub answer: String,
    /// Options in document order.
    pub options: Vec<RadioOption>,
}

impl RadioGroup {
    /// First option whose label contains the answer, case-insensitively.
    pub fn matching_option(&self) -> Option<&RadioOption> {
        let answer = self.answer.to_lowercase();
        self.options
            .iter()
            .find(|option| option.label.to_lowercase().contains(&answer))
    }

    pub async fn handle<D: DocumentDriver + ?Sized>(
        &self,
        driver: &D,
    ) -> DriverResult<HandleOutcome> {
        if self.answer == IGNORED_ANSWER {
            return Ok(HandleOutcome::Ignored);
        }
        match self.matching_option() {
            Some(option) => {
                debug!("Selecting '{}' for {}", option.label, self.question);
                driver.click(option.node).await?;
                Ok(HandleOutcome::Selected(option.label.clone()))
            }
            None => {
                debug!(
                    "No option of {} matches '{}'",
                    self.container_id, self.answer
                );
                Ok(HandleOutcome::NoMatchingOption)
            }
        }
    }
}
