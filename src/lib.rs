//! # eoka-formfill
//!
//! Fill multi-step job-application forms. Questions on the page are matched
//! against a store of answers by alias, known button sequences are clicked to
//! move through the wizard, and every page load is handled until the URL
//! changes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eoka_formfill::{Config, FormData, Runner};
//!
//! # #[tokio::main]
//! # async fn main() -> eoka_formfill::Result<()> {
//! let config = Config::load("application.yaml")?;
//! let data = FormData::from_config(&config);
//! let mut runner = Runner::new(&config.browser).await?;
//! let result = runner.run(&config, &data, None).await?;
//! println!("Handled {} fields", result.handled);
//! runner.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The core runs against any [`DocumentDriver`]; [`MockDocument`] is an
//! in-memory page for tests.

pub mod alias_map;
pub mod classifier;
pub mod config;
pub mod driver;
pub mod element;
pub mod form_data;
pub mod handled;
pub mod lifecycle;
pub mod navigation;
mod runner;
pub mod snapshot;

pub use alias_map::AliasMap;
pub use classifier::{ClassifiedPage, Classifier};
pub use config::{
    AnswerEntry, AutomateConfig, BrowserConfig, Config, LifecycleConfig, NavTarget,
    SelectorConfig, TargetUrl, TimingConfig, IGNORED_ANSWER,
};
pub use driver::{
    DocumentDriver, DriverError, DriverResult, EokaDriver, MockDocument, MockNode, NodeHandle,
};
pub use element::{FormElement, HandleOutcome};
pub use form_data::{Answer, FormData};
pub use handled::HandledSet;
pub use lifecycle::{EndReason, LifecycleController, LifecycleReport, RunSummary, StopReason};
pub use navigation::{NavCatalog, NavSequence, NavigationResolver};
pub use runner::{RunResult, Runner};

/// Result type for eoka-formfill operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.name, "Test");
        assert_eq!(config.target.url, "https://example.com");
        assert!(config.answers.is_empty());
        assert!(config.navigation.is_empty());
        assert!(!config.browser.headless);
        assert!(config.automate.buttons);
        assert!(config.automate.forms);
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.selectors.labels, "label");
        assert_eq!(config.selectors.text_boxes, r#"input[type="text"]"#);
        assert_eq!(config.selectors.radios, r#"input[type="radio"]"#);
        assert_eq!(
            config.selectors.drop_downs,
            r#"button[aria-haspopup="listbox"]"#
        );
        assert_eq!(config.selectors.drop_down_options, r#"[role="option"]"#);
        assert_eq!(config.selectors.nav_buttons, "button");

        assert_eq!(config.timing.render_check_ms, 250);
        assert_eq!(config.timing.render_stable_checks, 4);
        assert_eq!(config.timing.render_timeout_ms, 30000);
        assert_eq!(config.timing.selector_timeout_ms, 30000);
        assert_eq!(config.timing.settle_idle_ms, 500);
        assert_eq!(config.timing.type_delay_per_char_ms, 10);
        assert_eq!(config.timing.option_timeout_ms, 2000);

        assert_eq!(config.lifecycle.tick_ms, 500);
        assert_eq!(config.lifecycle.max_idle_ticks, None);
        assert_eq!(config.lifecycle.max_lifecycles, None);
    }

    #[test]
    fn test_parse_browser_config() {
        let yaml = r#"
name: "Test"
browser:
  headless: true
  proxy: "http://localhost:8080"
  user_agent: "Custom UA"
  viewport:
    width: 1920
    height: 1080
target:
  url: "https://example.com"
"#;
        let config = Config::parse(yaml).unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.browser.proxy, Some("http://localhost:8080".into()));
        assert_eq!(config.browser.user_agent, Some("Custom UA".into()));
        let viewport = config.browser.viewport.unwrap();
        assert_eq!((viewport.width, viewport.height), (1920, 1080));
    }

    #[test]
    fn test_parse_answers_and_navigation() {
        let yaml = r#"
name: "Workday"
target:
  url: "https://acme.wd3.myworkdayjobs.com/careers"
automate:
  buttons: true
  forms: false
answers:
  - aliases: ["first name", "given name"]
    answer: "Ada"
  - question: ["middle name"]
    answer: "-ignored-input-fields"
navigation:
  - domain: "myworkdayjobs.com"
    sequence:
      - parent_key: "data-automation-id"
        parent_value: "adventureButton"
        waitForNavigation: true
        children:
          - 'a[data-automation-id="applyManually"]'
"#;
        let config = Config::parse(yaml).unwrap();
        assert!(!config.automate.forms);
        assert_eq!(config.answers.len(), 2);
        assert_eq!(config.answers[0].aliases, vec!["first name", "given name"]);
        assert!(config.answers[1].is_ignored());

        let seq = &config.navigation[0].sequence[0];
        assert_eq!(seq.parent_key, "data-automation-id");
        assert!(seq.wait_for_navigation);
        assert_eq!(seq.children, vec![r#"a[data-automation-id="applyManually"]"#]);
    }

    #[test]
    fn test_parse_json_config() {
        let json = r#"{"name": "Json", "target": {"url": "https://example.com"},
            "answers": [{"question": ["email"], "answer": "ada@example.com"}]}"#;
        let config = Config::parse(json).unwrap();
        assert_eq!(config.answers[0].answer, "ada@example.com");
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            (
                r#"
name: ""
target:
  url: "https://example.com"
"#,
                "name is required",
            ),
            (
                r#"
name: "Test"
target:
  url: ""
"#,
                "target.url is required",
            ),
            (
                r#"
name: "Test"
target:
  url: "https://example.com"
answers:
  - aliases: []
    answer: "Ada"
"#,
                "answers[0]: at least one alias is required",
            ),
            (
                r#"
name: "Test"
target:
  url: "https://example.com"
answers:
  - aliases: ["name", " "]
    answer: "Ada"
"#,
                "answers[0]: alias 1 is empty",
            ),
            (
                r#"
name: "Test"
target:
  url: "https://example.com"
answers:
  - aliases: ["name"]
    answer: ""
"#,
                "answers[0]: answer is empty",
            ),
            (
                r#"
name: "Test"
target:
  url: "https://example.com"
navigation:
  - domain: ""
"#,
                "navigation[0]: domain is required",
            ),
            (
                r#"
name: "Test"
target:
  url: "https://example.com"
navigation:
  - domain: "*"
    sequence:
      - parent_key: "id"
        parent_value: ""
"#,
                "navigation[0]: sequence[0].parent_value is required",
            ),
            (
                r##"
name: "Test"
target:
  url: "https://example.com"
navigation:
  - domain: "*"
    sequence:
      - parent_key: "id"
        parent_value: "next"
        children: ["#a", ""]
"##,
                "navigation[0]: sequence[0].children[1] is empty",
            ),
            (
                r#"
name: "Test"
target:
  url: "https://example.com"
timing:
  render_stable_checks: 0
"#,
                "render_stable_checks must be at least 1",
            ),
            (
                r#"
name: "Test"
target:
  url: "https://example.com"
lifecycle:
  max_lifecycles: 0
"#,
                "max_lifecycles must be at least 1",
            ),
        ];

        for (yaml, expected) in cases {
            match Config::parse(yaml) {
                Err(Error::Config(msg)) => {
                    assert!(msg.contains(expected), "'{}' lacks '{}'", msg, expected)
                }
                other => panic!("expected config error '{}', got {:?}", expected, other.map(|c| c.name)),
            }
        }
    }

    #[test]
    fn test_missing_parent_key_is_parse_error() {
        let yaml = r#"
name: "Test"
target:
  url: "https://example.com"
navigation:
  - domain: "*"
    sequence:
      - parent_value: "next"
"#;
        assert!(matches!(Config::parse(yaml), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_load_appends_data_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(
            dir.path().join("data/form.json"),
            r#"[{"question": ["email"], "answer": "ada@example.com"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("data/button-targets.json"),
            r#"[{"domain": "*", "sequence": [{"parent_key": "id", "parent_value": "next", "waitForNavigation": true, "children": []}]}]"#,
        )
        .unwrap();
        let config_path = dir.path().join("apply.yaml");
        std::fs::write(
            &config_path,
            r#"
name: "Files"
target:
  url: "https://example.com"
data:
  answers: "data/form.json"
  navigation: "data/button-targets.json"
answers:
  - aliases: ["name"]
    answer: "Ada"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.answers.len(), 2);
        assert_eq!(config.answers[0].answer, "Ada");
        assert_eq!(config.answers[1].answer, "ada@example.com");
        assert_eq!(config.navigation.len(), 1);
        assert!(config.navigation[0].sequence[0].wait_for_navigation);
    }

    #[test]
    fn test_load_bundled_config() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/workday.yaml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.name, "Workday application");
        assert_eq!(config.lifecycle.max_idle_ticks, Some(20));

        let data = FormData::from_config(&config);
        assert_eq!(data.catalog().len(), 2);
        assert_eq!(data.answer_for("Legal Name*"), Answer::Text("Ada Lovelace"));
        assert_eq!(data.answer_for("Given Name"), Answer::Text("Ada"));
        assert_eq!(data.answer_for("Middle Name"), Answer::Ignored);
        assert_eq!(data.answer_for("Favorite color"), Answer::Missing);
    }

    #[test]
    fn test_load_missing_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("apply.yaml");
        std::fs::write(
            &config_path,
            r#"
name: "Files"
target:
  url: "https://example.com"
data:
  answers: "missing.json"
"#,
        )
        .unwrap();

        match Config::load(&config_path) {
            Err(Error::Config(msg)) => assert!(msg.contains("failed to read answers")),
            other => panic!("expected config error, got {:?}", other.map(|c| c.name)),
        }
    }
}
