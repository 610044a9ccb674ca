//! The four interactive element kinds and how each is handled.

mod drop_down;
mod nav_button;
mod radio;
mod text_box;

pub use drop_down::DropDown;
pub use nav_button::NavButton;
pub use radio::{RadioGroup, RadioOption};
pub use text_box::TextBox;

use crate::config::Config;
use crate::driver::{DocumentDriver, DriverResult};
use crate::form_data::Answer;
use crate::handled::HandledSet;

/// Result of handling one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Text was typed into the field.
    Filled,
    /// The option with this label or text was clicked.
    Selected(String),
    /// No option matched the answer; nothing was selected.
    NoMatchingOption,
    /// The answer says to leave the field alone.
    Ignored,
    /// The whole navigation sequence was clicked.
    Navigated { clicks: usize },
    /// A child selector never appeared; the rest of the sequence was skipped.
    Truncated { clicks: usize, missing: String },
}

/// An element discovered on the page during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormElement {
    TextBox(TextBox),
    RadioGroup(RadioGroup),
    DropDown(DropDown),
    NavButton(NavButton),
}

impl FormElement {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextBox(_) => "text box",
            Self::RadioGroup(_) => "radio group",
            Self::DropDown(_) => "dropdown",
            Self::NavButton(_) => "nav button",
        }
    }

    /// The question this element answers; `None` for navigation buttons.
    pub fn question(&self) -> Option<&str> {
        match self {
            Self::TextBox(e) => Some(e.question.as_str()),
            Self::RadioGroup(e) => Some(e.question.as_str()),
            Self::DropDown(e) => Some(e.question.as_str()),
            Self::NavButton(_) => None,
        }
    }

    /// Perform the element's action.
    pub async fn handle<D: DocumentDriver + ?Sized>(
        &self,
        driver: &D,
        config: &Config,
    ) -> DriverResult<HandleOutcome> {
        match self {
            Self::TextBox(e) => e.handle(driver, &config.timing).await,
            Self::RadioGroup(e) => e.handle(driver).await,
            Self::DropDown(e) => e.handle(driver, &config.selectors, &config.timing).await,
            Self::NavButton(e) => e.handle(driver).await,
        }
    }

    /// Record this element as handled for the rest of the lifecycle.
    pub fn mark_handled(&self, handled: &mut HandledSet) {
        match self {
            Self::NavButton(e) => {
                handled.mark_button(e.identity.clone());
            }
            _ => {
                if let Some(question) = self.question() {
                    handled.mark_question(question);
                }
            }
        }
    }
}

/// Whether a question-bound element should be offered for handling.
pub fn should_handle(question: &str, answer: Answer<'_>, handled: &HandledSet) -> bool {
    !question.is_empty()
        && matches!(answer, Answer::Text(text) if !text.is_empty())
        && !handled.is_question_handled(question)
}
