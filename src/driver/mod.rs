//! The document driver seam.
//!
//! Everything that touches a live page goes through [`DocumentDriver`]:
//! querying nodes, reading properties and attributes, clicking and typing.
//! [`EokaDriver`] drives a real browser page, [`MockDocument`] is an
//! in-memory page for tests and dry runs.

mod mock;
mod page;

pub use page::EokaDriver;
pub use mock::{DriverCall, MockDocument, MockNode};

use async_trait::async_trait;
use std::fmt;

/// Opaque handle to a DOM node, valid until the page navigates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u64);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Errors reported by a [`DocumentDriver`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// The node was detached or belongs to a previous document.
    #[error("stale node handle: {0}")]
    StaleNode(NodeHandle),

    /// The page's execution context went away, usually mid-navigation.
    #[error("execution context destroyed: {0}")]
    ContextDestroyed(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("driver error: {0}")]
    Backend(String),
}

impl DriverError {
    /// Errors expected whenever a navigation races the polling tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StaleNode(_) | Self::ContextDestroyed(_))
    }
}

/// Result type for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Minimal DOM capability the form-filling core runs against.
///
/// Implementations are driven from a single task; no two calls overlap except
/// a navigating click joined with [`wait_for_navigation_settled`].
///
/// [`wait_for_navigation_settled`]: DocumentDriver::wait_for_navigation_settled
#[async_trait(?Send)]
pub trait DocumentDriver {
    /// First node matching `selector`. With `wait_for_presence`, waits up to
    /// the driver's selector budget and returns `Ok(None)` when it runs out.
    async fn query_one(
        &self,
        selector: &str,
        wait_for_presence: bool,
    ) -> DriverResult<Option<NodeHandle>>;

    /// All nodes matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> DriverResult<Vec<NodeHandle>>;

    /// A DOM property as a string; missing or non-scalar values read as "".
    async fn get_property(&self, node: NodeHandle, name: &str) -> DriverResult<String>;

    /// An attribute value; a missing attribute reads as "".
    async fn get_attribute(&self, node: NodeHandle, name: &str) -> DriverResult<String>;

    /// The parent element, `None` at the document root.
    async fn parent(&self, node: NodeHandle) -> DriverResult<Option<NodeHandle>>;

    async fn click(&self, node: NodeHandle) -> DriverResult<()>;

    /// Type into whatever currently has focus.
    async fn type_text(&self, text: &str) -> DriverResult<()>;

    async fn current_url(&self) -> DriverResult<String>;

    /// Wait until network activity settles after a navigating click.
    async fn wait_for_navigation_settled(&self) -> DriverResult<()>;

    /// Length of the serialized document, used to detect render stability.
    async fn content_length(&self) -> DriverResult<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DriverError::StaleNode(NodeHandle(3)).is_transient());
        assert!(DriverError::ContextDestroyed("navigated".into()).is_transient());
        assert!(!DriverError::Timeout("wait".into()).is_transient());
        assert!(!DriverError::Backend("cdp".into()).is_transient());
    }

    #[test]
    fn test_node_handle_display() {
        assert_eq!(NodeHandle(7).to_string(), "node#7");
        assert_eq!(
            DriverError::StaleNode(NodeHandle(7)).to_string(),
            "stale node handle: node#7"
        );
    }
}
