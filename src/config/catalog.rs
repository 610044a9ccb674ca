use serde::Deserialize;

/// Navigation sequences that apply on one domain (`"*"` for any).
#[derive(Debug, Clone, Deserialize)]
pub struct NavTarget {
    /// Case-insensitive URL fragment, or `"*"`.
    pub domain: String,

    #[serde(default)]
    pub sequence: Vec<NavSequenceDef>,
}

/// A trigger-button rule and the selectors clicked after it.
#[derive(Debug, Clone, Deserialize)]
pub struct NavSequenceDef {
    /// Attribute read from the candidate button.
    pub parent_key: String,

    /// Value the attribute must equal.
    pub parent_value: String,

    /// Whether the last click leaves the page.
    #[serde(default, alias = "waitForNavigation")]
    pub wait_for_navigation: bool,

    /// Selectors clicked in order once the trigger has been clicked.
    #[serde(default)]
    pub children: Vec<String>,
}

impl NavTarget {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.domain.trim().is_empty() {
            return Err("domain is required (use '*' for any page)".into());
        }
        for (i, seq) in self.sequence.iter().enumerate() {
            if seq.parent_key.is_empty() {
                return Err(format!("sequence[{}].parent_key is required", i));
            }
            if seq.parent_value.is_empty() {
                return Err(format!("sequence[{}].parent_value is required", i));
            }
            if let Some(pos) = seq.children.iter().position(|c| c.trim().is_empty()) {
                return Err(format!("sequence[{}].children[{}] is empty", i, pos));
            }
        }
        Ok(())
    }
}
