//! Isolates the modifier block from a copied item description.
//!
//! Item text is split into sections by dash separator lines. The modifier
//! block is the section right before the last separator, since the export
//! format always ends with a trailing metadata section.

use std::sync::LazyLock;

use regex::Regex;

/// Canonical section separator in exported item text
pub const SECTION_DELIMITER: &str = "--------";

// Accepts the shortened seven-dash form as well as the canonical separator.
static DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{7,}").expect("delimiter pattern should be valid"));

/// Split `raw` into its delimiter-separated sections.
pub fn sections(raw: &str) -> Vec<&str> {
    DELIMITER.split(raw).collect()
}

/// Extract the trimmed, non-blank lines of the modifier block.
///
/// Text with fewer than two sections has no modifier block and yields an
/// empty list.
pub fn extract(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }

    let sections = sections(raw);
    if sections.len() < 2 {
        return Vec::new();
    }

    sections[sections.len() - 2]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEM: &str = "Item Class: Jewels
Rarity: Magic
Medium Cluster Jewel
--------
Item Level: 84
--------
Adds 4 Passive Skills (enchant)
Added Small Passive Skills grant: 12% increased Fire Damage (enchant)
--------
  1 Added Passive Skill is Burning Bright
Added Small Passive Skills also grant: +5 to Strength

--------
Place into an allocated Medium or Large Jewel Socket on the Passive Skill Tree.
";

    #[test]
    fn test_extracts_second_to_last_section() {
        let lines = extract(ITEM);
        assert_eq!(
            lines,
            vec![
                "1 Added Passive Skill is Burning Bright",
                "Added Small Passive Skills also grant: +5 to Strength",
            ]
        );
    }

    #[test]
    fn test_single_section_yields_nothing() {
        assert!(extract("Rarity: Magic\nCobalt Jewel").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn test_three_sections_picks_middle() {
        assert_eq!(extract("A-------B-------C"), vec!["B"]);
        assert_eq!(extract("A\n--------\n B \n\n--------\nC"), vec!["B"]);
    }

    #[test]
    fn test_two_sections_picks_first() {
        assert_eq!(extract("first\nline\n--------\nmeta"), vec!["first", "line"]);
    }

    #[test]
    fn test_short_dash_run_is_not_a_delimiter() {
        assert_eq!(sections("A------B").len(), 1);
        assert!(extract("A------B------C").is_empty());
        assert_eq!(sections("A-------B").len(), 2);
    }

    #[test]
    fn test_long_separator_is_one_delimiter() {
        assert_eq!(sections("A----------------B").len(), 2);
    }
}
