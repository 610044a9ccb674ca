use super::HandleOutcome;
use crate::driver::{DocumentDriver, DriverError, DriverResult, NodeHandle};
use tracing::{debug, warn};

/// A button that starts a known navigation sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavButton {
    pub node: NodeHandle,
    /// Id, or trimmed inner text when the button has no id.
    pub identity: String,
    /// Selectors clicked in order after the button itself.
    pub children: Vec<String>,
    /// Whether the last click is expected to leave the page.
    pub awaits_navigation: bool,
}

impl NavButton {
    /// Click the button, then each child selector once it appears.
    pub async fn handle<D: DocumentDriver + ?Sized>(
        &self,
        driver: &D,
    ) -> DriverResult<HandleOutcome> {
        debug!("Starting sequence at {}", self.identity);

        if self.children.is_empty() {
            self.click(driver, self.node, self.awaits_navigation).await?;
            return Ok(HandleOutcome::Navigated { clicks: 1 });
        }

        driver.click(self.node).await?;
        let mut clicks = 1;
        let last = self.children.len() - 1;

        for (i, selector) in self.children.iter().enumerate() {
            let Some(child) = driver.query_one(selector, true).await? else {
                debug!(
                    "Sequence at {} stopped: '{}' did not appear",
                    self.identity, selector
                );
                return Ok(HandleOutcome::Truncated {
                    clicks,
                    missing: selector.clone(),
                });
            };
            self.click(driver, child, i == last && self.awaits_navigation)
                .await?;
            clicks += 1;
        }

        Ok(HandleOutcome::Navigated { clicks })
    }

    async fn click<D: DocumentDriver + ?Sized>(
        &self,
        driver: &D,
        node: NodeHandle,
        awaits_navigation: bool,
    ) -> DriverResult<()> {
        if !awaits_navigation {
            return driver.click(node).await;
        }

        let (clicked, settled) =
            tokio::join!(driver.click(node), driver.wait_for_navigation_settled());
        clicked?;
        match settled {
            Ok(()) => Ok(()),
            Err(DriverError::Timeout(e)) => {
                warn!("Page did not settle after {}: {}", self.identity, e);
                Ok(())
            }
            Err(e) if e.is_transient() => Ok(()),
            Err(e) => Err(e),
        }
    }
}
