//! Modifier records as they appear in the NDJSON stat catalog.

use serde::{Deserialize, Serialize};

/// One textual rendering of a modifier, possibly containing `#` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherTemplate {
    /// Template text, e.g. `Adds # to Accuracy Rating`
    #[serde(default)]
    pub string: String,
}

impl MatcherTemplate {
    pub fn new(string: impl Into<String>) -> Self {
        Self {
            string: string.into(),
        }
    }
}

/// A named item property with every template it can be rendered as.
///
/// Immutable once loaded; unknown catalog fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    #[serde(rename = "ref", default)]
    pub reference: String,
    #[serde(default)]
    pub matchers: Vec<MatcherTemplate>,
}

impl Modifier {
    /// Create a modifier from a ref and a list of template strings
    pub fn new<I, S>(reference: impl Into<String>, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reference: reference.into(),
            matchers: templates.into_iter().map(MatcherTemplate::new).collect(),
        }
    }

    /// Human-readable label: the first template, or `??` when there is none.
    pub fn description(&self) -> &str {
        self.matchers
            .first()
            .map(|m| m.string.as_str())
            .unwrap_or("??")
    }
}
