//! [`DocumentDriver`] over a live `eoka::Page`.
//!
//! Node handles are numbers handed out by a small page-side registry. The
//! registry lives on `window`, so a navigation discards it and every handle
//! from the previous document reads back as stale.

use super::{DocumentDriver, DriverError, DriverResult, NodeHandle};
use crate::config::TimingConfig;
use async_trait::async_trait;
use eoka::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Poll interval while waiting for a selector to appear.
const PRESENCE_POLL: Duration = Duration::from_millis(100);

/// Installs (once per document) the node registry used by every call.
const REGISTRY_JS: &str = r#"
window.__eokaFormfillNodes = window.__eokaFormfillNodes || (() => {
    const nodes = new Map();
    const ids = new WeakMap();
    let seq = 0;
    return {
        register(el) {
            if (!el) return null;
            let id = ids.get(el);
            if (id === undefined) {
                id = ++seq;
                ids.set(el, id);
                nodes.set(id, el);
            }
            return id;
        },
        lookup(id) {
            const el = nodes.get(id);
            return el && el.isConnected ? el : null;
        },
    };
})();
"#;

/// Page-side reply: either a value or a stale-node marker.
#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum Reply<T> {
    Ok(T),
    Stale,
}

/// Drives an eoka page through the [`DocumentDriver`] interface.
pub struct EokaDriver<'a> {
    page: &'a Page,
    selector_timeout: Duration,
    settle_idle_ms: u64,
    settle_timeout_ms: u64,
}

impl<'a> EokaDriver<'a> {
    /// Wrap a page, taking wait budgets from the timing config.
    pub fn new(page: &'a Page, timing: &TimingConfig) -> Self {
        Self {
            page,
            selector_timeout: Duration::from_millis(timing.selector_timeout_ms),
            settle_idle_ms: timing.settle_idle_ms,
            settle_timeout_ms: timing.settle_timeout_ms,
        }
    }

    /// The wrapped page.
    pub fn page(&self) -> &Page {
        self.page
    }

    async fn eval_json<T: DeserializeOwned>(&self, body: &str) -> DriverResult<T> {
        let js = format!("{REGISTRY_JS}\n{body}");
        let json_str: String = self.page.evaluate(&js).await.map_err(map_eoka_error)?;
        serde_json::from_str(&json_str)
            .map_err(|e| DriverError::Backend(format!("driver reply parse error: {}", e)))
    }

    /// Run `body` against a registered node bound to `el`.
    async fn with_node<T: DeserializeOwned>(&self, node: NodeHandle, body: &str) -> DriverResult<T> {
        let js = format!(
            r#"(() => {{
                const el = window.__eokaFormfillNodes.lookup({id});
                if (!el) return JSON.stringify('stale');
                {body}
            }})()"#,
            id = node.0,
        );
        match self.eval_json::<Reply<T>>(&js).await? {
            Reply::Ok(value) => Ok(value),
            Reply::Stale => Err(DriverError::StaleNode(node)),
        }
    }

    async fn first_match(&self, selector: &str) -> DriverResult<Option<NodeHandle>> {
        let js = format!(
            "JSON.stringify(window.__eokaFormfillNodes.register(document.querySelector({})))",
            js_string(selector)?
        );
        let id: Option<u64> = self.eval_json(&js).await?;
        Ok(id.map(NodeHandle))
    }
}

#[async_trait(?Send)]
impl DocumentDriver for EokaDriver<'_> {
    async fn query_one(
        &self,
        selector: &str,
        wait_for_presence: bool,
    ) -> DriverResult<Option<NodeHandle>> {
        if !wait_for_presence {
            return self.first_match(selector).await;
        }

        let deadline = Instant::now() + self.selector_timeout;
        loop {
            if let Some(node) = self.first_match(selector).await? {
                return Ok(Some(node));
            }
            if Instant::now() >= deadline {
                debug!("selector '{}' not present after {:?}", selector, self.selector_timeout);
                return Ok(None);
            }
            tokio::time::sleep(PRESENCE_POLL).await;
        }
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<NodeHandle>> {
        let js = format!(
            r#"JSON.stringify(Array.from(document.querySelectorAll({}))
                .map(el => window.__eokaFormfillNodes.register(el)))"#,
            js_string(selector)?
        );
        let ids: Vec<u64> = self.eval_json(&js).await?;
        Ok(ids.into_iter().map(NodeHandle).collect())
    }

    async fn get_property(&self, node: NodeHandle, name: &str) -> DriverResult<String> {
        let body = format!(
            r#"const v = el[{}];
                const scalar = typeof v === 'string' || typeof v === 'number' || typeof v === 'boolean';
                return JSON.stringify({{ ok: scalar ? String(v) : '' }});"#,
            js_string(name)?
        );
        self.with_node(node, &body).await
    }

    async fn get_attribute(&self, node: NodeHandle, name: &str) -> DriverResult<String> {
        let body = format!(
            "return JSON.stringify({{ ok: el.getAttribute({}) || '' }});",
            js_string(name)?
        );
        self.with_node(node, &body).await
    }

    async fn parent(&self, node: NodeHandle) -> DriverResult<Option<NodeHandle>> {
        let id: Option<u64> = self
            .with_node(
                node,
                "return JSON.stringify({ ok: window.__eokaFormfillNodes.register(el.parentElement) });",
            )
            .await?;
        Ok(id.map(NodeHandle))
    }

    async fn click(&self, node: NodeHandle) -> DriverResult<()> {
        let _: bool = self
            .with_node(
                node,
                r#"el.scrollIntoView({ block: 'center' });
                if (typeof el.focus === 'function') el.focus();
                el.click();
                return JSON.stringify({ ok: true });"#,
            )
            .await?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> DriverResult<()> {
        self.page.type_text(text).await.map_err(map_eoka_error)
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.page.url().await.map_err(map_eoka_error)
    }

    async fn wait_for_navigation_settled(&self) -> DriverResult<()> {
        self.page
            .wait_for_network_idle(self.settle_idle_ms, self.settle_timeout_ms)
            .await
            .map_err(map_eoka_error)
    }

    async fn content_length(&self) -> DriverResult<usize> {
        let len: u64 = self
            .page
            .evaluate("document.documentElement ? document.documentElement.outerHTML.length : 0")
            .await
            .map_err(map_eoka_error)?;
        Ok(len as usize)
    }
}

fn js_string(value: &str) -> DriverResult<String> {
    serde_json::to_string(value)
        .map_err(|e| DriverError::Backend(format!("failed to escape JS: {}", e)))
}

/// Sort eoka errors into the driver taxonomy. A torn-down execution context
/// only shows up in the CDP message text.
fn map_eoka_error(err: eoka::Error) -> DriverError {
    classify_message(err.to_string())
}

fn classify_message(msg: String) -> DriverError {
    const TEARDOWN: &[&str] = &[
        "Execution context was destroyed",
        "Cannot find context with specified id",
        "Inspected target navigated or closed",
    ];
    if TEARDOWN.iter().any(|marker| msg.contains(marker)) {
        DriverError::ContextDestroyed(msg)
    } else if msg.to_lowercase().contains("timed out") || msg.to_lowercase().contains("timeout") {
        DriverError::Timeout(msg)
    } else {
        DriverError::Backend(msg)
    }
}
