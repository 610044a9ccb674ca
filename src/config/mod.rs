pub mod answers;
pub mod catalog;
pub mod schema;

pub use answers::{AnswerEntry, IGNORED_ANSWER};
pub use catalog::{NavSequenceDef, NavTarget};
pub use schema::{
    AutomateConfig, BrowserConfig, Config, DataFiles, LifecycleConfig, SelectorConfig,
    TargetUrl, TimingConfig, Viewport,
};
