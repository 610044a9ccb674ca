use super::HandleOutcome;
use crate::config::{SelectorConfig, TimingConfig, IGNORED_ANSWER};
use crate::driver::{DocumentDriver, DriverResult, NodeHandle};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

const OPTION_POLL: Duration = Duration::from_millis(50);

/// A button that opens a listbox of options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropDown {
    pub node: NodeHandle,
    pub id: String,
    pub question: String,
    pub answer: String,
}

impl DropDown {
    /// Open the menu and click the first option containing the answer.
    /// When nothing matches, the trigger is clicked again to close the menu.
    pub async fn handle<D: DocumentDriver + ?Sized>(
        &self,
        driver: &D,
        selectors: &SelectorConfig,
        timing: &TimingConfig,
    ) -> DriverResult<HandleOutcome> {
        if self.answer == IGNORED_ANSWER {
            return Ok(HandleOutcome::Ignored);
        }

        driver.click(self.node).await?;

        let answer = self.answer.to_lowercase();
        let budget = Duration::from_millis(timing.option_timeout_ms);
        if options_rendered(driver, &selectors.drop_down_options, budget).await? {
            for option in driver.query_all(&selectors.drop_down_options).await? {
                let text = driver.get_property(option, "innerText").await?;
                if text.to_lowercase().contains(&answer) {
                    debug!("Selecting '{}' for {}", text.trim(), self.question);
                    driver.click(option).await?;
                    return Ok(HandleOutcome::Selected(text.trim().to_string()));
                }
            }
        }

        debug!("No option of {} matches '{}'", self.id, self.answer);
        driver.click(self.node).await?;
        Ok(HandleOutcome::NoMatchingOption)
    }
}

/// Poll for the menu's options, giving up after `budget`.
async fn options_rendered<D: DocumentDriver + ?Sized>(
    driver: &D,
    selector: &str,
    budget: Duration,
) -> DriverResult<bool> {
    let deadline = Instant::now() + budget;
    loop {
        if driver.query_one(selector, false).await?.is_some() {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            debug!("No '{}' options after {:?}", selector, budget);
            return Ok(false);
        }
        tokio::time::sleep(OPTION_POLL).await;
    }
}
