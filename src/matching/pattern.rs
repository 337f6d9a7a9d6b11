//! Compiles matcher templates into whitespace-tolerant line regexes.
//!
//! Every template character is literal except `#`, which stands for a signed
//! integer or decimal number. Runs of whitespace match any amount of
//! whitespace, including none. Only the first placeholder is captured.

use log::warn;
use regex::Regex;

/// Placeholder symbol used by catalog templates
pub const PLACEHOLDER: char = '#';

const NUMBER: &str = r"[-+]?\d*\.?\d+";

/// Result of matching one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineMatch {
    /// Template without placeholder matched
    Literal,
    /// Template with placeholder matched and the captured number parsed
    Value(f64),
}

impl LineMatch {
    pub fn value(&self) -> Option<f64> {
        match self {
            LineMatch::Literal => None,
            LineMatch::Value(v) => Some(*v),
        }
    }
}

/// Compiled form of a single matcher template.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    template: String,
    regex: Option<Regex>,
    captures_value: bool,
}

/// Compile a template. Empty templates produce a matcher that never matches.
pub fn compile(template: &str) -> CompiledMatcher {
    if template.trim().is_empty() {
        return CompiledMatcher {
            template: template.to_string(),
            regex: None,
            captures_value: false,
        };
    }

    let (pattern, captures_value) = template_to_pattern(template);
    let regex = match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Template '{}' failed to compile: {}", template, e);
            None
        }
    };

    CompiledMatcher {
        template: template.to_string(),
        regex,
        captures_value,
    }
}

fn template_to_pattern(template: &str) -> (String, bool) {
    let mut pattern = String::with_capacity(template.len() * 2);
    let mut captured = false;
    let mut in_whitespace = false;
    let mut buf = [0u8; 4];

    for ch in template.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                pattern.push_str(r"\s*");
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;

        if ch == PLACEHOLDER {
            if captured {
                pattern.push_str(&format!("(?:{})", NUMBER));
            } else {
                pattern.push_str(&format!("({})", NUMBER));
                captured = true;
            }
        } else {
            pattern.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
        }
    }

    (pattern, captured)
}

impl CompiledMatcher {
    /// The template this matcher was compiled from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Regex source, if the template compiled to one
    pub fn pattern(&self) -> Option<&str> {
        self.regex.as_ref().map(|r| r.as_str())
    }

    /// Whether a match yields a numeric value
    pub fn captures_value(&self) -> bool {
        self.captures_value
    }

    /// Number of numeric capture groups (0 or 1)
    pub fn capture_count(&self) -> usize {
        self.regex
            .as_ref()
            .map(|r| r.captures_len() - 1)
            .unwrap_or(0)
    }

    /// Whether the template text appears anywhere in `line`
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(line))
    }

    /// Match a line, parsing the captured number when the template has one.
    ///
    /// A capture that does not parse as a decimal is treated as no match.
    pub fn match_line(&self, line: &str) -> Option<LineMatch> {
        let regex = self.regex.as_ref()?;
        let captures = regex.captures(line)?;

        if !self.captures_value {
            return Some(LineMatch::Literal);
        }

        let text = captures.get(1)?.as_str();
        match text.parse::<f64>() {
            Ok(value) => Some(LineMatch::Value(value)),
            Err(_) => {
                log::debug!("Captured '{}' is not a number in line '{}'", text, line);
                None
            }
        }
    }
}
