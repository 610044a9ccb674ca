use crate::config::{BrowserConfig, Config};
use crate::driver::EokaDriver;
use crate::form_data::FormData;
use crate::lifecycle::{LifecycleController, LifecycleReport, StopReason};
use crate::Result;
use eoka::{Browser, Page};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of running a config.
#[derive(Debug)]
pub struct RunResult {
    /// Whether the run stopped without a driver failure.
    pub success: bool,
    /// Why the run stopped; `None` when interrupted with Ctrl-C.
    pub stop: Option<StopReason>,
    /// Lifecycles completed, in order.
    pub lifecycles: Vec<LifecycleReport>,
    /// Form elements handled across all pages.
    pub handled: usize,
    /// Navigation sequences run across all pages.
    pub navigations: usize,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

/// Fills forms in a real browser.
pub struct Runner {
    browser: Browser,
    page: Page,
}

impl Runner {
    /// Create a new runner with browser config.
    pub async fn new(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self { browser, page })
    }

    /// Get a reference to the page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Open the target and run lifecycles until a bound stops the run or the
    /// process receives Ctrl-C.
    ///
    /// `max_lifecycles` overrides `lifecycle.max_lifecycles`.
    pub async fn run(
        &mut self,
        config: &Config,
        data: &FormData,
        max_lifecycles: Option<u32>,
    ) -> Result<RunResult> {
        let start = Instant::now();
        info!("Navigating to: {}", config.target.url);
        self.page.goto(&config.target.url).await?;

        let driver = EokaDriver::new(&self.page, &config.timing);
        let mut controller = LifecycleController::new(&driver, config, data);

        let (stop, lifecycles) = tokio::select! {
            summary = controller.run(max_lifecycles) => (Some(summary.stop), summary.lifecycles),
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted");
                (None, Vec::new())
            }
        };

        let success = matches!(
            stop,
            Some(StopReason::LifecycleLimit) | Some(StopReason::NoNavigation)
        );
        Ok(RunResult {
            success,
            stop,
            handled: lifecycles.iter().map(|l| l.handled).sum(),
            navigations: lifecycles.iter().map(|l| l.navigations).sum(),
            lifecycles,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}
