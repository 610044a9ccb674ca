//! Per-tick view of the page.
//!
//! A [`NodeCache`] memoizes property, attribute and parent reads for one tick
//! so the classifier can ask the same question of a node repeatedly (the
//! radio ancestor walk does) without another driver round trip. It is thrown
//! away at the end of the tick; nothing read from it outlives a render.

use crate::driver::{DocumentDriver, DriverResult, NodeHandle};
use std::collections::HashMap;

/// Label `for` attribute to trimmed label text.
pub type LabelMap = HashMap<String, String>;

/// Memoized reads against one driver, valid for a single tick.
pub struct NodeCache<'d, D: DocumentDriver + ?Sized> {
    driver: &'d D,
    properties: HashMap<(NodeHandle, String), String>,
    attributes: HashMap<(NodeHandle, String), String>,
    parents: HashMap<NodeHandle, Option<NodeHandle>>,
}

impl<'d, D: DocumentDriver + ?Sized> NodeCache<'d, D> {
    pub fn new(driver: &'d D) -> Self {
        Self {
            driver,
            properties: HashMap::new(),
            attributes: HashMap::new(),
            parents: HashMap::new(),
        }
    }

    pub fn driver(&self) -> &'d D {
        self.driver
    }

    pub async fn property(&mut self, node: NodeHandle, name: &str) -> DriverResult<String> {
        let key = (node, name.to_string());
        if let Some(value) = self.properties.get(&key) {
            return Ok(value.clone());
        }
        let value = self.driver.get_property(node, name).await?;
        self.properties.insert(key, value.clone());
        Ok(value)
    }

    pub async fn attribute(&mut self, node: NodeHandle, name: &str) -> DriverResult<String> {
        let key = (node, name.to_string());
        if let Some(value) = self.attributes.get(&key) {
            return Ok(value.clone());
        }
        let value = self.driver.get_attribute(node, name).await?;
        self.attributes.insert(key, value.clone());
        Ok(value)
    }

    pub async fn parent(&mut self, node: NodeHandle) -> DriverResult<Option<NodeHandle>> {
        if let Some(parent) = self.parents.get(&node) {
            return Ok(*parent);
        }
        let parent = self.driver.parent(node).await?;
        self.parents.insert(node, parent);
        Ok(parent)
    }

    /// Number of distinct reads cached so far.
    pub fn len(&self) -> usize {
        self.properties.len() + self.attributes.len() + self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collect `for` -> text for every label matching `selector`.
///
/// Labels without a `for` are skipped; the first label for an id wins.
pub async fn read_labels<D: DocumentDriver + ?Sized>(
    cache: &mut NodeCache<'_, D>,
    selector: &str,
) -> DriverResult<LabelMap> {
    let mut labels = LabelMap::new();
    for node in cache.driver().query_all(selector).await? {
        let target = cache.attribute(node, "for").await?;
        if target.is_empty() || labels.contains_key(&target) {
            continue;
        }
        let text = cache.property(node, "textContent").await?;
        labels.insert(target, text.trim().to_string());
    }
    Ok(labels)
}

/// Id of a node if it has one, otherwise its trimmed inner text.
pub async fn partial_identity<D: DocumentDriver + ?Sized>(
    cache: &mut NodeCache<'_, D>,
    node: NodeHandle,
) -> DriverResult<String> {
    let id = cache.property(node, "id").await?;
    if !id.is_empty() {
        return Ok(id);
    }
    Ok(cache.property(node, "innerText").await?.trim().to_string())
}

/// Id of the nearest ancestor (excluding the node itself) that has one.
pub async fn container_id<D: DocumentDriver + ?Sized>(
    cache: &mut NodeCache<'_, D>,
    node: NodeHandle,
) -> DriverResult<Option<String>> {
    let mut current = cache.parent(node).await?;
    while let Some(ancestor) = current {
        let id = cache.property(ancestor, "id").await?;
        if !id.is_empty() {
            return Ok(Some(id));
        }
        current = cache.parent(ancestor).await?;
    }
    Ok(None)
}
