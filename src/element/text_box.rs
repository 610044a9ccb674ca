use super::HandleOutcome;
use crate::config::{TimingConfig, IGNORED_ANSWER};
use crate::driver::{DocumentDriver, DriverResult, NodeHandle};
use std::time::Duration;
use tracing::debug;

/// An empty text input bound to a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBox {
    pub node: NodeHandle,
    pub id: String,
    pub question: String,
    pub answer: String,
}

impl TextBox {
    /// Click into the field and type the answer.
    pub async fn handle<D: DocumentDriver + ?Sized>(
        &self,
        driver: &D,
        timing: &TimingConfig,
    ) -> DriverResult<HandleOutcome> {
        if self.answer == IGNORED_ANSWER {
            return Ok(HandleOutcome::Ignored);
        }

        debug!("Typing into {} ({})", self.id, self.question);
        driver.click(self.node).await?;
        driver.type_text(&self.answer).await?;

        let pause = timing.type_delay_per_char_ms * self.answer.chars().count() as u64;
        if pause > 0 {
            tokio::time::sleep(Duration::from_millis(pause)).await;
        }
        Ok(HandleOutcome::Filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverCall, MockDocument, MockNode};

    fn timing() -> TimingConfig {
        TimingConfig {
            type_delay_per_char_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_types_answer() {
        let doc = MockDocument::new("about:blank");
        let node = doc.add(MockNode::new().matches("input").id("q1"));
        let text_box = TextBox {
            node,
            id: "q1".into(),
            question: "What is your name?".into(),
            answer: "Ada".into(),
        };

        let outcome = text_box.handle(&doc, &timing()).await.unwrap();
        assert_eq!(outcome, HandleOutcome::Filled);
        assert_eq!(
            doc.calls(),
            vec![DriverCall::Click(node), DriverCall::Type("Ada".into())]
        );
        assert_eq!(doc.get_property(node, "value").await.unwrap(), "Ada");
    }

    #[tokio::test]
    async fn test_sentinel_has_no_side_effect() {
        let doc = MockDocument::new("about:blank");
        let node = doc.add(MockNode::new().matches("input"));
        let text_box = TextBox {
            node,
            id: "q2".into(),
            question: "Middle name".into(),
            answer: IGNORED_ANSWER.into(),
        };

        let outcome = text_box.handle(&doc, &timing()).await.unwrap();
        assert_eq!(outcome, HandleOutcome::Ignored);
        assert!(doc.calls().is_empty());
    }
}
