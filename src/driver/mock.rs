//! In-memory [`DocumentDriver`] for tests and dry runs.

use super::{DocumentDriver, DriverError, DriverResult, NodeHandle};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::HashMap;

/// A side effect recorded by [`MockDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Click(NodeHandle),
    Type(String),
    Settle,
}

/// A fake DOM node.
#[derive(Debug, Clone, Default)]
pub struct MockNode {
    /// Selectors this node answers to, compared verbatim.
    pub selectors: Vec<String>,
    pub properties: HashMap<String, String>,
    pub attributes: HashMap<String, String>,
    pub parent: Option<NodeHandle>,
    /// Hidden nodes are invisible to queries until revealed by a click.
    pub hidden: bool,
    /// Nodes un-hidden when this node is clicked.
    pub reveals: Vec<NodeHandle>,
    /// URL the page moves to when this node is clicked.
    pub navigates_to: Option<String>,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the node match `selector`.
    pub fn matches(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Shorthand for the `id` property.
    pub fn id(self, id: impl Into<String>) -> Self {
        self.prop("id", id)
    }

    pub fn child_of(mut self, parent: NodeHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn reveals(mut self, node: NodeHandle) -> Self {
        self.reveals.push(node);
        self
    }

    pub fn navigates_to(mut self, url: impl Into<String>) -> Self {
        self.navigates_to = Some(url.into());
        self
    }
}

#[derive(Debug)]
struct QueryFailure {
    selector: String,
    skip: usize,
    error: DriverError,
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    nodes: Vec<MockNode>,
    focused: Option<NodeHandle>,
    calls: Vec<DriverCall>,
    content_length: usize,
    read_failure: Option<DriverError>,
    query_failure: Option<QueryFailure>,
    detached: Vec<NodeHandle>,
}

/// An in-memory page.
///
/// Clicking focuses a node (so `type_text` appends to its `value`), reveals
/// the nodes it lists and optionally changes the URL.
#[derive(Debug, Default)]
pub struct MockDocument {
    state: RefCell<MockState>,
}

impl MockDocument {
    /// An empty page at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: RefCell::new(MockState {
                url: url.into(),
                content_length: 1024,
                ..Default::default()
            }),
        }
    }

    /// Add a node, returning its handle.
    pub fn add(&self, node: MockNode) -> NodeHandle {
        let mut state = self.state.borrow_mut();
        state.nodes.push(node);
        NodeHandle(state.nodes.len() as u64 - 1)
    }

    /// Add a `<label for=...>` with the given text.
    pub fn add_label(&self, selector: &str, for_id: &str, text: &str) -> NodeHandle {
        self.add(
            MockNode::new()
                .matches(selector)
                .attr("for", for_id)
                .prop("textContent", text),
        )
    }

    /// Change a property on an existing node.
    pub fn set_property(&self, node: NodeHandle, name: &str, value: &str) {
        if let Some(n) = self.state.borrow_mut().nodes.get_mut(node.0 as usize) {
            n.properties.insert(name.to_string(), value.to_string());
        }
    }

    /// Change an attribute on an existing node.
    pub fn set_attribute(&self, node: NodeHandle, name: &str, value: &str) {
        if let Some(n) = self.state.borrow_mut().nodes.get_mut(node.0 as usize) {
            n.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Detach a node: it disappears from queries and reads as stale.
    pub fn detach(&self, node: NodeHandle) {
        self.state.borrow_mut().detached.push(node);
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.state.borrow_mut().url = url.into();
    }

    pub fn set_content_length(&self, len: usize) {
        self.state.borrow_mut().content_length = len;
    }

    /// Make every subsequent read fail with `error` (`None` clears it).
    pub fn fail_reads_with(&self, error: Option<DriverError>) {
        self.state.borrow_mut().read_failure = error;
    }

    /// Fail one query for `selector` with `error`, after letting `skip`
    /// queries for it succeed.
    pub fn fail_query_once(&self, selector: &str, skip: usize, error: DriverError) {
        self.state.borrow_mut().query_failure = Some(QueryFailure {
            selector: selector.to_string(),
            skip,
            error,
        });
    }

    /// Every recorded side effect, oldest first.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.borrow().calls.clone()
    }

    /// Text passed to `type_text`, oldest first.
    pub fn typed(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                DriverCall::Type(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    /// Nodes clicked, oldest first.
    pub fn clicked(&self) -> Vec<NodeHandle> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                DriverCall::Click(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    pub fn was_clicked(&self, node: NodeHandle) -> bool {
        self.clicked().contains(&node)
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn check_reads(&self) -> DriverResult<()> {
        match &self.state.borrow().read_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn check_query(&self, selector: &str) -> DriverResult<()> {
        self.check_reads()?;
        let mut state = self.state.borrow_mut();
        let Some(failure) = state.query_failure.as_mut() else {
            return Ok(());
        };
        if failure.selector != selector {
            return Ok(());
        }
        if failure.skip > 0 {
            failure.skip -= 1;
            return Ok(());
        }
        let error = failure.error.clone();
        state.query_failure = None;
        Err(error)
    }

    fn visible(&self, selector: &str) -> Vec<NodeHandle> {
        let state = self.state.borrow();
        state
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeHandle(i as u64), n))
            .filter(|(h, n)| {
                !n.hidden && !state.detached.contains(h) && n.selectors.iter().any(|s| s == selector)
            })
            .map(|(h, _)| h)
            .collect()
    }

    fn read<T>(&self, node: NodeHandle, f: impl FnOnce(&MockNode) -> T) -> DriverResult<T> {
        self.check_reads()?;
        let state = self.state.borrow();
        if state.detached.contains(&node) {
            return Err(DriverError::StaleNode(node));
        }
        state
            .nodes
            .get(node.0 as usize)
            .map(f)
            .ok_or(DriverError::StaleNode(node))
    }
}

#[async_trait(?Send)]
impl DocumentDriver for MockDocument {
    async fn query_one(
        &self,
        selector: &str,
        _wait_for_presence: bool,
    ) -> DriverResult<Option<NodeHandle>> {
        self.check_query(selector)?;
        Ok(self.visible(selector).into_iter().next())
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<NodeHandle>> {
        self.check_query(selector)?;
        Ok(self.visible(selector))
    }

    async fn get_property(&self, node: NodeHandle, name: &str) -> DriverResult<String> {
        self.read(node, |n| n.properties.get(name).cloned().unwrap_or_default())
    }

    async fn get_attribute(&self, node: NodeHandle, name: &str) -> DriverResult<String> {
        self.read(node, |n| n.attributes.get(name).cloned().unwrap_or_default())
    }

    async fn parent(&self, node: NodeHandle) -> DriverResult<Option<NodeHandle>> {
        self.read(node, |n| n.parent)
    }

    async fn click(&self, node: NodeHandle) -> DriverResult<()> {
        let (reveals, navigates_to) = self.read(node, |n| (n.reveals.clone(), n.navigates_to.clone()))?;
        let mut state = self.state.borrow_mut();
        state.calls.push(DriverCall::Click(node));
        state.focused = Some(node);
        for revealed in reveals {
            if let Some(n) = state.nodes.get_mut(revealed.0 as usize) {
                n.hidden = false;
            }
        }
        if let Some(url) = navigates_to {
            state.url = url;
        }
        Ok(())
    }

    async fn type_text(&self, text: &str) -> DriverResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(DriverCall::Type(text.to_string()));
        if let Some(focused) = state.focused {
            if let Some(n) = state.nodes.get_mut(focused.0 as usize) {
                n.properties.entry("value".to_string()).or_default().push_str(text);
            }
        }
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.state.borrow().url.clone())
    }

    async fn wait_for_navigation_settled(&self) -> DriverResult<()> {
        self.state.borrow_mut().calls.push(DriverCall::Settle);
        Ok(())
    }

    async fn content_length(&self) -> DriverResult<usize> {
        self.check_reads()?;
        Ok(self.state.borrow().content_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_query_and_read() {
        let doc = MockDocument::new("https://jobs.example.com/apply");
        let input = doc.add(MockNode::new().matches("input").id("q1").attr("aria-label", "Name"));

        assert_eq!(doc.query_all("input").await.unwrap(), vec![input]);
        assert_eq!(doc.query_one("button", false).await.unwrap(), None);
        assert_eq!(doc.get_property(input, "id").await.unwrap(), "q1");
        assert_eq!(doc.get_property(input, "value").await.unwrap(), "");
        assert_eq!(doc.get_attribute(input, "aria-label").await.unwrap(), "Name");
    }

    #[tokio::test]
    async fn test_click_focuses_and_typing_fills_value() {
        let doc = MockDocument::new("about:blank");
        let input = doc.add(MockNode::new().matches("input"));
        doc.click(input).await.unwrap();
        doc.type_text("Ada").await.unwrap();
        assert_eq!(doc.get_property(input, "value").await.unwrap(), "Ada");
        assert_eq!(
            doc.calls(),
            vec![DriverCall::Click(input), DriverCall::Type("Ada".into())]
        );
    }

    #[tokio::test]
    async fn test_click_reveals_and_navigates() {
        let doc = MockDocument::new("https://a.example.com/1");
        let menu_item = doc.add(MockNode::new().matches("#apply").hidden());
        let button = doc.add(
            MockNode::new()
                .matches("button")
                .reveals(menu_item)
                .navigates_to("https://a.example.com/2"),
        );

        assert_eq!(doc.query_one("#apply", true).await.unwrap(), None);
        doc.click(button).await.unwrap();
        assert_eq!(doc.query_one("#apply", true).await.unwrap(), Some(menu_item));
        assert_eq!(doc.current_url().await.unwrap(), "https://a.example.com/2");
    }

    #[tokio::test]
    async fn test_detached_node_is_stale() {
        let doc = MockDocument::new("about:blank");
        let node = doc.add(MockNode::new().matches("button"));
        doc.detach(node);
        assert!(doc.query_all("button").await.unwrap().is_empty());
        assert_eq!(
            doc.get_property(node, "id").await,
            Err(DriverError::StaleNode(node))
        );
    }

    #[tokio::test]
    async fn test_injected_read_failure() {
        let doc = MockDocument::new("about:blank");
        doc.fail_reads_with(Some(DriverError::ContextDestroyed("navigation".into())));
        assert!(doc.query_all("label").await.unwrap_err().is_transient());
        doc.fail_reads_with(None);
        assert!(doc.query_all("label").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_fails_once_after_skipping() {
        let doc = MockDocument::new("about:blank");
        let button = doc.add(MockNode::new().matches("button"));
        doc.fail_query_once("button", 1, DriverError::StaleNode(button));

        assert!(doc.query_all("label").await.unwrap().is_empty());
        assert_eq!(doc.query_all("button").await.unwrap(), vec![button]);
        assert_eq!(
            doc.query_one("button", false).await,
            Err(DriverError::StaleNode(button))
        );
        assert_eq!(doc.query_all("button").await.unwrap(), vec![button]);
    }
}
