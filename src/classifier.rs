//! Turns the nodes on the page into elements ready to handle.

use crate::config::SelectorConfig;
use crate::driver::{DocumentDriver, DriverResult, NodeHandle};
use crate::element::{should_handle, DropDown, FormElement, RadioGroup, RadioOption, TextBox};
use crate::form_data::{Answer, FormData};
use crate::handled::HandledSet;
use crate::snapshot::{container_id, read_labels, LabelMap, NodeCache};

/// Everything the classifier found during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedPage {
    pub text_boxes: Vec<TextBox>,
    pub radio_groups: Vec<RadioGroup>,
    pub drop_downs: Vec<DropDown>,
    /// Questions whose answer says to leave them alone.
    pub ignored: Vec<String>,
    /// Labelled questions with no matching answer.
    pub unresolved: Vec<String>,
}

impl ClassifiedPage {
    /// Number of elements ready to handle.
    pub fn len(&self) -> usize {
        self.text_boxes.len() + self.radio_groups.len() + self.drop_downs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text boxes first, then radio groups, then dropdowns.
    pub fn into_elements(self) -> Vec<FormElement> {
        self.text_boxes
            .into_iter()
            .map(FormElement::TextBox)
            .chain(self.radio_groups.into_iter().map(FormElement::RadioGroup))
            .chain(self.drop_downs.into_iter().map(FormElement::DropDown))
            .collect()
    }
}

/// Matches labelled form fields against the answer store.
pub struct Classifier<'a> {
    data: &'a FormData,
    selectors: &'a SelectorConfig,
}

impl<'a> Classifier<'a> {
    pub fn new(data: &'a FormData, selectors: &'a SelectorConfig) -> Self {
        Self { data, selectors }
    }

    /// Classify the current render.
    pub async fn classify<D: DocumentDriver + ?Sized>(
        &self,
        cache: &mut NodeCache<'_, D>,
        handled: &HandledSet,
    ) -> DriverResult<ClassifiedPage> {
        let labels = read_labels(cache, &self.selectors.labels).await?;
        let mut page = ClassifiedPage::default();

        self.text_boxes(cache, &labels, handled, &mut page).await?;
        self.radio_groups(cache, &labels, handled, &mut page).await?;
        self.drop_downs(cache, &labels, handled, &mut page).await?;

        Ok(page)
    }

    /// Resolve a question's answer, sorting ignored and unresolved ones aside.
    fn bind(&self, question: &str, handled: &HandledSet, page: &mut ClassifiedPage) -> Option<String> {
        let answer = self.data.answer_for(question);
        if should_handle(question, answer, handled) {
            if let Answer::Text(text) = answer {
                return Some(text.to_string());
            }
        }
        if !handled.is_question_handled(question) {
            let bucket = match answer {
                Answer::Ignored => Some(&mut page.ignored),
                Answer::Missing => Some(&mut page.unresolved),
                Answer::Text(_) => None,
            };
            if let Some(bucket) = bucket {
                if !bucket.iter().any(|q| q == question) {
                    bucket.push(question.to_string());
                }
            }
        }
        None
    }

    async fn text_boxes<D: DocumentDriver + ?Sized>(
        &self,
        cache: &mut NodeCache<'_, D>,
        labels: &LabelMap,
        handled: &HandledSet,
        page: &mut ClassifiedPage,
    ) -> DriverResult<()> {
        for node in cache.driver().query_all(&self.selectors.text_boxes).await? {
            if !cache.property(node, "value").await?.is_empty() {
                continue;
            }
            let id = cache.property(node, "id").await?;
            let Some(question) = labels.get(&id).filter(|q| !q.is_empty()) else {
                continue;
            };
            if let Some(answer) = self.bind(question, handled, page) {
                page.text_boxes.push(TextBox {
                    node,
                    id,
                    question: question.clone(),
                    answer,
                });
            }
        }
        Ok(())
    }

    async fn radio_groups<D: DocumentDriver + ?Sized>(
        &self,
        cache: &mut NodeCache<'_, D>,
        labels: &LabelMap,
        handled: &HandledSet,
        page: &mut ClassifiedPage,
    ) -> DriverResult<()> {
        // (container id, question, options, any option checked)
        let mut groups: Vec<(String, String, Vec<RadioOption>, bool)> = Vec::new();

        for node in cache.driver().query_all(&self.selectors.radios).await? {
            let Some(container) = container_id(cache, node).await? else {
                continue;
            };
            let Some(question) = labels.get(&container).filter(|q| !q.is_empty()) else {
                continue;
            };
            let pos = match groups.iter().position(|g| g.0 == container) {
                Some(pos) => pos,
                None => {
                    groups.push((container, question.clone(), Vec::new(), false));
                    groups.len() - 1
                }
            };
            if groups[pos].3 {
                continue;
            }
            if is_checked(cache, node).await? {
                groups[pos].3 = true;
                continue;
            }
            if let Some(label) = option_label(cache, labels, node).await? {
                groups[pos].2.push(RadioOption { label, node });
            }
        }

        for (container_id, question, options, checked) in groups {
            if checked || options.is_empty() {
                continue;
            }
            if let Some(answer) = self.bind(&question, handled, page) {
                page.radio_groups.push(RadioGroup {
                    container_id,
                    question,
                    answer,
                    options,
                });
            }
        }
        Ok(())
    }

    async fn drop_downs<D: DocumentDriver + ?Sized>(
        &self,
        cache: &mut NodeCache<'_, D>,
        labels: &LabelMap,
        handled: &HandledSet,
        page: &mut ClassifiedPage,
    ) -> DriverResult<()> {
        for node in cache.driver().query_all(&self.selectors.drop_downs).await? {
            let id = cache.property(node, "id").await?;
            let Some(question) = labels.get(&id).filter(|q| !q.is_empty()) else {
                continue;
            };
            if let Some(answer) = self.bind(question, handled, page) {
                page.drop_downs.push(DropDown {
                    node,
                    id,
                    question: question.clone(),
                    answer,
                });
            }
        }
        Ok(())
    }
}

async fn is_checked<D: DocumentDriver + ?Sized>(
    cache: &mut NodeCache<'_, D>,
    node: NodeHandle,
) -> DriverResult<bool> {
    if cache.attribute(node, "aria-checked").await? == "true" {
        return Ok(true);
    }
    Ok(cache.property(node, "checked").await? == "true")
}

/// Label text for a radio option, falling back to its `aria-label`.
async fn option_label<D: DocumentDriver + ?Sized>(
    cache: &mut NodeCache<'_, D>,
    labels: &LabelMap,
    node: NodeHandle,
) -> DriverResult<Option<String>> {
    let id = cache.property(node, "id").await?;
    if let Some(label) = labels.get(&id).filter(|l| !l.is_empty()) {
        return Ok(Some(label.clone()));
    }
    let aria = cache.attribute(node, "aria-label").await?;
    let aria = aria.trim();
    Ok((!aria.is_empty()).then(|| aria.to_string()))
}
