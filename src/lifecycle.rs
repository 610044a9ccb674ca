//! Per-page automation loop.
//!
//! Each page load gets one lifecycle: wait for the page to render, run the
//! known navigation sequences once, then classify and handle form fields every
//! tick until the URL changes or a tick bound is hit. What was handled is
//! tracked per lifecycle and forgotten when the next one starts.
//!
//! Errors from the driver never escape: a transient one (stale node, context
//! destroyed by a navigation) just ends the lifecycle, anything else ends it
//! with a warning. Only a URL change starts the next lifecycle straight away;
//! otherwise the run waits for the page to navigate, so a page is never
//! worked through twice.

use crate::classifier::Classifier;
use crate::config::Config;
use crate::driver::{DocumentDriver, DriverError, DriverResult};
use crate::element::{FormElement, HandleOutcome};
use crate::form_data::FormData;
use crate::handled::HandledSet;
use crate::navigation::NavigationResolver;
use crate::snapshot::NodeCache;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Why a lifecycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// The page navigated away.
    UrlChanged,
    /// `max_idle_ticks` consecutive ticks handled nothing.
    IdleLimit,
    /// `max_ticks` ticks ran.
    TickLimit,
    /// Form filling is disabled and the navigation phase is done.
    Finished,
    /// A transient DOM error, usually a navigation racing the tick.
    Interrupted(DriverError),
    DriverFailure(DriverError),
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UrlChanged => write!(f, "url changed"),
            Self::IdleLimit => write!(f, "idle limit"),
            Self::TickLimit => write!(f, "tick limit"),
            Self::Finished => write!(f, "finished"),
            Self::Interrupted(e) => write!(f, "interrupted ({})", e),
            Self::DriverFailure(e) => write!(f, "driver failure ({})", e),
        }
    }
}

/// What happened during one lifecycle.
#[derive(Debug, Clone)]
pub struct LifecycleReport {
    pub id: u64,
    /// URL at lifecycle start.
    pub url: String,
    pub end_reason: EndReason,
    /// Classify ticks run.
    pub ticks: u32,
    /// Form elements handled.
    pub handled: usize,
    /// Navigation sequences run.
    pub navigations: usize,
}

/// Why [`LifecycleController::run`] stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    LifecycleLimit,
    /// No navigation within `url_change_timeout_ms`.
    NoNavigation,
    /// The driver failed while waiting for the next page.
    DriverFailure(DriverError),
}

/// Result of a multi-page run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub lifecycles: Vec<LifecycleReport>,
    pub stop: StopReason,
}

impl RunSummary {
    /// Form elements handled across every lifecycle.
    pub fn total_handled(&self) -> usize {
        self.lifecycles.iter().map(|l| l.handled).sum()
    }

    pub fn total_navigations(&self) -> usize {
        self.lifecycles.iter().map(|l| l.navigations).sum()
    }
}

/// Drives lifecycles against one document.
pub struct LifecycleController<'a, D: DocumentDriver + ?Sized> {
    driver: &'a D,
    config: &'a Config,
    data: &'a FormData,
    handled: HandledSet,
    next_id: u64,
}

impl<'a, D: DocumentDriver + ?Sized> LifecycleController<'a, D> {
    pub fn new(driver: &'a D, config: &'a Config, data: &'a FormData) -> Self {
        Self {
            driver,
            config,
            data,
            handled: HandledSet::new(),
            next_id: 1,
        }
    }

    /// Bookkeeping of the current (or last) lifecycle.
    pub fn handled(&self) -> &HandledSet {
        &self.handled
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.lifecycle.tick_ms)
    }

    /// Run lifecycles until a bound stops the run.
    ///
    /// `max_lifecycles` overrides `lifecycle.max_lifecycles` when set.
    pub async fn run(&mut self, max_lifecycles: Option<u32>) -> RunSummary {
        let max = max_lifecycles.or(self.config.lifecycle.max_lifecycles);
        let url_timeout = self
            .config
            .lifecycle
            .url_change_timeout_ms
            .map(Duration::from_millis);
        let mut lifecycles = Vec::new();

        loop {
            self.wait_until_rendered().await;
            let report = self.run_lifecycle().await;
            let url = report.url.clone();
            let proceed_now = report.end_reason == EndReason::UrlChanged;
            lifecycles.push(report);

            if max.is_some_and(|max| lifecycles.len() >= max as usize) {
                return RunSummary {
                    lifecycles,
                    stop: StopReason::LifecycleLimit,
                };
            }
            if proceed_now {
                continue;
            }

            match self.wait_for_url_change(&url, url_timeout).await {
                Ok(Some(next)) => debug!("Navigated to {}", next),
                Ok(None) => {
                    info!("No navigation away from {}, stopping", url);
                    return RunSummary {
                        lifecycles,
                        stop: StopReason::NoNavigation,
                    };
                }
                Err(e) => {
                    warn!("Stopping: {}", e);
                    return RunSummary {
                        lifecycles,
                        stop: StopReason::DriverFailure(e),
                    };
                }
            }
        }
    }

    /// Poll the document size until it stops changing.
    ///
    /// Returns `false` when the probe timed out or the driver failed.
    pub async fn wait_until_rendered(&self) -> bool {
        let timing = &self.config.timing;
        let interval = Duration::from_millis(timing.render_check_ms);
        let deadline = Instant::now() + Duration::from_millis(timing.render_timeout_ms);
        let mut last = 0;
        let mut stable = 0;

        loop {
            let len = match self.driver.content_length().await {
                Ok(len) => len,
                Err(e) => {
                    debug!("Render probe stopped: {}", e);
                    return false;
                }
            };
            if len > 0 && len == last {
                stable += 1;
            } else {
                stable = 0;
            }
            if stable >= timing.render_stable_checks {
                return true;
            }
            last = len;

            if Instant::now() >= deadline {
                debug!("Page still changing after {}ms", timing.render_timeout_ms);
                return false;
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Wait for the URL to differ from `from`, polling every tick.
    ///
    /// Returns the new URL, or `None` once `timeout` elapses.
    pub async fn wait_for_url_change(
        &self,
        from: &str,
        timeout: Option<Duration>,
    ) -> DriverResult<Option<String>> {
        let start = Instant::now();
        loop {
            match self.driver.current_url().await {
                Ok(url) if url != from => return Ok(Some(url)),
                Ok(_) => {}
                Err(e) if e.is_transient() => debug!("URL poll: {}", e),
                Err(e) => return Err(e),
            }
            if timeout.is_some_and(|t| start.elapsed() >= t) {
                return Ok(None);
            }
            tokio::time::sleep(self.tick_interval()).await;
        }
    }

    /// Run one lifecycle on the current page.
    pub async fn run_lifecycle(&mut self) -> LifecycleReport {
        let id = self.next_id;
        self.next_id += 1;
        self.handled.clear();

        let mut report = LifecycleReport {
            id,
            url: String::new(),
            end_reason: EndReason::Finished,
            ticks: 0,
            handled: 0,
            navigations: 0,
        };

        let result = match self.driver.current_url().await {
            Ok(url) => {
                info!("Lifecycle {} started: {}", id, url);
                report.url = url.clone();
                self.drive(&url, &mut report).await
            }
            Err(e) => Err(e),
        };

        report.end_reason = match result {
            Ok(reason) => reason,
            Err(e) if e.is_transient() => {
                debug!("Lifecycle {} interrupted: {}", id, e);
                EndReason::Interrupted(e)
            }
            Err(e) => {
                warn!("Lifecycle {} failed: {}", id, e);
                EndReason::DriverFailure(e)
            }
        };

        info!(
            "Lifecycle {} ended: {} ({} handled, {} sequences, {} ticks)",
            id, report.end_reason, report.handled, report.navigations, report.ticks
        );
        report
    }

    async fn drive(&mut self, url: &str, report: &mut LifecycleReport) -> DriverResult<EndReason> {
        let config = self.config;
        if config.automate.buttons && self.navigation_phase(url, report).await? {
            return Ok(EndReason::UrlChanged);
        }
        if !config.automate.forms {
            return Ok(EndReason::Finished);
        }

        let bounds = &config.lifecycle;
        let mut idle = 0;
        loop {
            if self.driver.current_url().await? != url {
                return Ok(EndReason::UrlChanged);
            }
            if bounds.max_ticks.is_some_and(|max| report.ticks >= max) {
                return Ok(EndReason::TickLimit);
            }

            report.ticks += 1;
            let handled = self.tick(url).await?;
            report.handled += handled;

            if handled == 0 {
                idle += 1;
                if bounds.max_idle_ticks.is_some_and(|max| idle >= max) {
                    return Ok(EndReason::IdleLimit);
                }
            } else {
                idle = 0;
            }

            tokio::time::sleep(self.tick_interval()).await;
        }
    }

    /// Run every matching navigation sequence once.
    /// Returns `true` if the page navigated.
    async fn navigation_phase(
        &mut self,
        url: &str,
        report: &mut LifecycleReport,
    ) -> DriverResult<bool> {
        let resolver = NavigationResolver::new(self.data.catalog(), url);
        if resolver.is_empty() {
            return Ok(false);
        }

        let mut cache = NodeCache::new(self.driver);
        let buttons = resolver
            .collect_candidates(&mut cache, &self.config.selectors.nav_buttons, &self.handled)
            .await?;
        debug!("{} navigation candidates", buttons.len());

        for button in buttons {
            let element = FormElement::NavButton(button);
            let outcome = element.handle(self.driver, self.config).await?;
            log_outcome(&element, &outcome);
            element.mark_handled(&mut self.handled);
            report.navigations += 1;

            if self.driver.current_url().await? != url {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Classify the page and handle what qualifies.
    /// Returns the number of elements handled.
    async fn tick(&mut self, url: &str) -> DriverResult<usize> {
        let mut cache = NodeCache::new(self.driver);
        let classifier = Classifier::new(self.data, &self.config.selectors);
        let page = classifier.classify(&mut cache, &self.handled).await?;
        debug!(
            "Tick: {} to handle, {} ignored, {} unresolved",
            page.len(),
            page.ignored.len(),
            page.unresolved.len()
        );

        for question in &page.ignored {
            if self.handled.mark_question(question.clone()) {
                debug!("Leaving '{}' alone", question);
            }
        }
        for question in &page.unresolved {
            if self.handled.report_unresolved(question) {
                info!("No answer for '{}'", question);
            }
        }

        let mut count = 0;
        for element in page.into_elements() {
            if self.driver.current_url().await? != url {
                break;
            }
            let outcome = element.handle(self.driver, self.config).await?;
            log_outcome(&element, &outcome);
            element.mark_handled(&mut self.handled);
            count += 1;
        }
        Ok(count)
    }
}

fn log_outcome(element: &FormElement, outcome: &HandleOutcome) {
    let subject = match element {
        FormElement::NavButton(b) => b.identity.as_str(),
        _ => element.question().unwrap_or_default(),
    };
    match outcome {
        HandleOutcome::Filled => info!("Filled '{}'", subject),
        HandleOutcome::Selected(option) => info!("Selected '{}' for '{}'", option, subject),
        HandleOutcome::NoMatchingOption => {
            info!("No {} option matches the answer for '{}'", element.kind(), subject)
        }
        HandleOutcome::Ignored => debug!("Left '{}' alone", subject),
        HandleOutcome::Navigated { clicks } => {
            info!("Ran sequence at '{}' ({} clicks)", subject, clicks)
        }
        HandleOutcome::Truncated { clicks, missing } => debug!(
            "Sequence at '{}' truncated after {} clicks, '{}' missing",
            subject, clicks, missing
        ),
    }
}
