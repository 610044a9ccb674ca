//! Known button sequences and matching page buttons against them.
//!
//! The catalog is grouped by domain on disk and flattened here into entries
//! in file order. For a page, [`NavigationResolver`] keeps the entries whose
//! domain applies and binds the first one whose trigger rule matches a
//! candidate button.

use crate::config::NavTarget;
use crate::driver::{DocumentDriver, DriverResult, NodeHandle};
use crate::element::NavButton;
use crate::handled::HandledSet;
use crate::snapshot::{partial_identity, NodeCache};
use std::collections::HashSet;
use tracing::debug;

/// Domain value that applies to every page.
pub const ANY_DOMAIN: &str = "*";

/// One trigger rule and the selectors it leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavSequence {
    pub domain: String,
    pub match_key: String,
    pub match_value: String,
    pub child_selectors: Vec<String>,
    pub awaits_navigation: bool,
}

impl NavSequence {
    /// Whether this entry applies on `url`.
    pub fn applies_to(&self, url: &str) -> bool {
        self.domain == ANY_DOMAIN || url.to_lowercase().contains(&self.domain.to_lowercase())
    }
}

/// Flattened navigation catalog.
#[derive(Debug, Clone, Default)]
pub struct NavCatalog {
    entries: Vec<NavSequence>,
}

impl NavCatalog {
    pub fn new(entries: Vec<NavSequence>) -> Self {
        Self { entries }
    }

    /// Flatten `{domain, sequence}` groups, preserving file order.
    pub fn from_targets(targets: &[NavTarget]) -> Self {
        let entries = targets
            .iter()
            .flat_map(|target| {
                target.sequence.iter().map(|seq| NavSequence {
                    domain: target.domain.trim().to_string(),
                    match_key: seq.parent_key.clone(),
                    match_value: seq.parent_value.clone(),
                    child_selectors: seq.children.clone(),
                    awaits_navigation: seq.wait_for_navigation,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[NavSequence] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Catalog entries applicable to one page.
pub struct NavigationResolver<'a> {
    entries: Vec<&'a NavSequence>,
}

impl<'a> NavigationResolver<'a> {
    pub fn new(catalog: &'a NavCatalog, url: &str) -> Self {
        let entries = catalog
            .entries()
            .iter()
            .filter(|entry| entry.applies_to(url))
            .collect();
        Self { entries }
    }

    /// Whether no entry applies to this page.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first entry, in catalog order, whose trigger rule matches `node`.
    pub async fn resolve<D: DocumentDriver + ?Sized>(
        &self,
        cache: &mut NodeCache<'_, D>,
        node: NodeHandle,
    ) -> DriverResult<Option<&'a NavSequence>> {
        for entry in &self.entries {
            let value = cache.attribute(node, &entry.match_key).await?;
            if !value.is_empty() && value == entry.match_value {
                return Ok(Some(*entry));
            }
        }
        Ok(None)
    }

    /// Bind every matching, not yet handled button on the page.
    ///
    /// Buttons are deduplicated by partial identity; the first one in
    /// document order is kept. A button with neither id nor text is keyed by
    /// the `parent_value` of the entry it matched.
    pub async fn collect_candidates<D: DocumentDriver + ?Sized>(
        &self,
        cache: &mut NodeCache<'_, D>,
        selector: &str,
        handled: &HandledSet,
    ) -> DriverResult<Vec<NavButton>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut buttons = Vec::new();
        for node in cache.driver().query_all(selector).await? {
            let identity = partial_identity(cache, node).await?;
            if !identity.is_empty()
                && (handled.is_button_handled(&identity) || seen.contains(&identity))
            {
                continue;
            }
            let Some(entry) = self.resolve(cache, node).await? else {
                continue;
            };
            let identity = if identity.is_empty() {
                entry.match_value.clone()
            } else {
                identity
            };
            if handled.is_button_handled(&identity) || !seen.insert(identity.clone()) {
                continue;
            }
            debug!(
                "Button {} matches {}={}",
                identity, entry.match_key, entry.match_value
            );
            buttons.push(NavButton {
                node,
                identity,
                children: entry.child_selectors.clone(),
                awaits_navigation: entry.awaits_navigation,
            });
        }
        Ok(buttons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MockDocument, MockNode};

    fn entry(domain: &str, key: &str, value: &str, children: &[&str]) -> NavSequence {
        NavSequence {
            domain: domain.into(),
            match_key: key.into(),
            match_value: value.into(),
            child_selectors: children.iter().map(|c| c.to_string()).collect(),
            awaits_navigation: false,
        }
    }

    #[test]
    fn test_domain_filter() {
        let catalog = NavCatalog::new(vec![
            entry("MyWorkdayJobs.com", "data-automation-id", "apply", &[]),
            entry("*", "data-automation-id", "next", &[]),
            entry("greenhouse.io", "id", "submit", &[]),
        ]);
        let resolver = NavigationResolver::new(&catalog, "https://acme.myworkdayjobs.com/job/1");
        assert_eq!(resolver.entries.len(), 2);

        let elsewhere = NavigationResolver::new(&catalog, "https://example.org");
        assert_eq!(elsewhere.entries.len(), 1);
        assert_eq!(elsewhere.entries[0].match_value, "next");
    }

    #[tokio::test]
    async fn test_first_matching_entry_wins() {
        let catalog = NavCatalog::new(vec![
            entry("*", "data-automation-id", "apply", &["#first"]),
            entry("*", "data-automation-id", "apply", &["#second"]),
        ]);
        let doc = MockDocument::new("https://example.com");
        let button = doc.add(
            MockNode::new()
                .matches("button")
                .attr("data-automation-id", "apply"),
        );

        let resolver = NavigationResolver::new(&catalog, "https://example.com");
        let mut cache = NodeCache::new(&doc);
        let matched = resolver.resolve(&mut cache, button).await.unwrap().unwrap();
        assert_eq!(matched.child_selectors, vec!["#first".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_attribute_never_matches() {
        let catalog = NavCatalog::new(vec![entry("*", "data-automation-id", "", &[])]);
        let doc = MockDocument::new("https://example.com");
        let button = doc.add(MockNode::new().matches("button"));

        let resolver = NavigationResolver::new(&catalog, "https://example.com");
        let mut cache = NodeCache::new(&doc);
        assert_eq!(resolver.resolve(&mut cache, button).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_collect_candidates_dedupes_and_skips_handled() {
        let catalog = NavCatalog::new(vec![
            entry("*", "data-automation-id", "apply", &["#manual"]),
            entry("*", "data-automation-id", "next", &[]),
        ]);
        let doc = MockDocument::new("https://example.com");
        let apply = doc.add(
            MockNode::new()
                .matches("button")
                .prop("innerText", "Apply")
                .attr("data-automation-id", "apply"),
        );
        doc.add(
            MockNode::new()
                .matches("button")
                .prop("innerText", " Apply ")
                .attr("data-automation-id", "apply"),
        );
        doc.add(
            MockNode::new()
                .matches("button")
                .id("next")
                .attr("data-automation-id", "next"),
        );
        doc.add(MockNode::new().matches("button").prop("innerText", "Cancel"));

        let mut handled = HandledSet::new();
        handled.mark_button("next");

        let resolver = NavigationResolver::new(&catalog, "https://example.com");
        let mut cache = NodeCache::new(&doc);
        let buttons = resolver
            .collect_candidates(&mut cache, "button", &handled)
            .await
            .unwrap();
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].node, apply);
        assert_eq!(buttons[0].identity, "Apply");
        assert_eq!(buttons[0].children, vec!["#manual".to_string()]);
    }

    #[tokio::test]
    async fn test_icon_only_button_keyed_by_rule() {
        let catalog = NavCatalog::new(vec![entry(
            "*",
            "data-automation-id",
            "legalNoticeAcceptButton",
            &[],
        )]);
        let doc = MockDocument::new("https://example.com");
        doc.add(MockNode::new().matches("button"));
        let accept = doc.add(
            MockNode::new()
                .matches("button")
                .attr("data-automation-id", "legalNoticeAcceptButton"),
        );
        doc.add(
            MockNode::new()
                .matches("button")
                .attr("data-automation-id", "legalNoticeAcceptButton"),
        );

        let resolver = NavigationResolver::new(&catalog, "https://example.com");
        let mut handled = HandledSet::new();
        let mut cache = NodeCache::new(&doc);
        let buttons = resolver
            .collect_candidates(&mut cache, "button", &handled)
            .await
            .unwrap();
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].node, accept);
        assert_eq!(buttons[0].identity, "legalNoticeAcceptButton");

        handled.mark_button("legalNoticeAcceptButton");
        let buttons = resolver
            .collect_candidates(&mut cache, "button", &handled)
            .await
            .unwrap();
        assert!(buttons.is_empty());
    }

    #[test]
    fn test_from_targets_flattens_in_order() {
        let targets: Vec<NavTarget> = serde_yaml::from_str(
            r##"
- domain: "*"
  sequence:
    - parent_key: id
      parent_value: one
      waitForNavigation: true
    - parent_key: id
      parent_value: two
      children: ["#x"]
- domain: example.com
  sequence:
    - parent_key: id
      parent_value: three
"##,
        )
        .unwrap();
        let catalog = NavCatalog::from_targets(&targets);
        let values: Vec<_> = catalog.entries().iter().map(|e| e.match_value.as_str()).collect();
        assert_eq!(values, vec!["one", "two", "three"]);
        assert!(catalog.entries()[0].awaits_navigation);
        assert!(!catalog.entries()[1].awaits_navigation);
        assert_eq!(catalog.entries()[2].domain, "example.com");
    }
}
