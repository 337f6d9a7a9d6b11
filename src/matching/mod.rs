//! Modifier pattern matching and hit detection.
//!
//! - pattern: template → whitespace-tolerant regex with an optional numeric capture
//! - section: pulls the modifier block out of a copied item description
//! - evaluate: applies targets, bounds, and the aggregation rule

mod evaluate;
mod pattern;
mod section;

pub use evaluate::{Evaluation, Evaluator, HitOutcome, Rule, TargetSpec, evaluate};
pub use pattern::{CompiledMatcher, LineMatch, PLACEHOLDER, compile};
pub use section::{SECTION_DELIMITER, extract, sections};
