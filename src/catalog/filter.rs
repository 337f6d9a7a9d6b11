//! Keyword filter deciding which catalog records enter the working catalog.

use serde::{Deserialize, Serialize};

use super::modifier::Modifier;

/// Keyword sets used to select modifiers from the full stat catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModFilter {
    /// A record is kept when its `ref` starts with any of these
    pub ref_startswith: Vec<String>,
    /// A record is kept when any matcher string contains any of these
    pub string_contains: Vec<String>,
}

impl Default for ModFilter {
    fn default() -> Self {
        Self {
            ref_startswith: vec![
                "Added Small Passive Skills also grant".to_string(),
                "1 Added Passive Skill is".to_string(),
                "Added Small Passive Skills have".to_string(),
            ],
            string_contains: vec![
                "附加的小天賦給予".to_string(),
                "附加的小型天賦給予".to_string(),
                "附加的小天賦增加".to_string(),
                "1 個附加天賦為".to_string(),
            ],
        }
    }
}

impl ModFilter {
    /// Filter that keeps every record
    pub fn accept_all() -> Self {
        Self {
            ref_startswith: Vec::new(),
            string_contains: Vec::new(),
        }
    }

    /// True when neither keyword list has entries
    pub fn is_empty(&self) -> bool {
        self.ref_startswith.is_empty() && self.string_contains.is_empty()
    }

    /// Check whether a modifier belongs in the working catalog.
    ///
    /// An empty filter accepts everything.
    pub fn accepts(&self, modifier: &Modifier) -> bool {
        if self.is_empty() {
            return true;
        }

        if self
            .ref_startswith
            .iter()
            .any(|keyword| modifier.reference.starts_with(keyword.as_str()))
        {
            return true;
        }

        modifier.matchers.iter().any(|m| {
            self.string_contains
                .iter()
                .any(|keyword| m.string.contains(keyword.as_str()))
        })
    }
}
