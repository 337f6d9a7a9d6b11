//! Splits a stat catalog into area-mod and non-area-mod files.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;

use crate::error::Result;

/// Key marking records that only roll as area modifiers
pub const AREA_MARKER: &str = "fromAreaMods";

/// Counts produced by [`split_area_mods`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub area: usize,
    pub non_area: usize,
    /// 1-based line numbers that were not valid UTF-8 JSON
    pub invalid_lines: Vec<usize>,
}

/// Partition `input` by presence of the `fromAreaMods` key.
///
/// Lines are copied verbatim (trimmed); blank lines are dropped and invalid
/// JSON lines are reported in the summary instead of failing the split.
pub fn split_area_mods(input: &Path, area_out: &Path, non_area_out: &Path) -> Result<SplitSummary> {
    let reader = BufReader::new(File::open(input)?);
    let mut area = BufWriter::new(File::create(area_out)?);
    let mut non_area = BufWriter::new(File::create(non_area_out)?);
    let mut summary = SplitSummary::default();

    for (idx, bytes) in reader.split(b'\n').enumerate() {
        let Ok(line) = String::from_utf8(bytes?) else {
            warn!("Line {} is not valid UTF-8, skipped", idx + 1);
            summary.invalid_lines.push(idx + 1);
            continue;
        };
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }

        let record: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(_) => {
                warn!("Line {} is not valid JSON, skipped", idx + 1);
                summary.invalid_lines.push(idx + 1);
                continue;
            }
        };

        if record.get(AREA_MARKER).is_some() {
            writeln!(area, "{}", raw)?;
            summary.area += 1;
        } else {
            writeln!(non_area, "{}", raw)?;
            summary.non_area += 1;
        }
    }

    area.flush()?;
    non_area.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_split_partitions_by_marker() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("stats.ndjson");
        fs::write(
            &input,
            concat!(
                "{\"ref\":\"A\",\"fromAreaMods\":true}\n",
                "\n",
                "{\"ref\":\"B\"}\n",
                "garbage\n",
                "{\"ref\":\"C\",\"fromAreaMods\":false}\n",
            ),
        )
        .unwrap();
        let area = temp.path().join("area.ndjson");
        let non_area = temp.path().join("non_area.ndjson");

        let summary = split_area_mods(&input, &area, &non_area).unwrap();

        assert_eq!(summary.area, 2);
        assert_eq!(summary.non_area, 1);
        assert_eq!(summary.invalid_lines, vec![4]);
        let area_text = fs::read_to_string(&area).unwrap();
        assert_eq!(area_text.lines().count(), 2);
        assert!(fs::read_to_string(&non_area).unwrap().contains("\"B\""));
    }

    #[test]
    fn test_split_skips_invalid_utf8_line() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("stats.ndjson");
        let mut content = b"{\"ref\":\"A\",\"fromAreaMods\":true}\n".to_vec();
        content.extend_from_slice(b"\xff\xfe garbage\n");
        content.extend_from_slice(b"{\"ref\":\"B\"}\n");
        fs::write(&input, content).unwrap();
        let area = temp.path().join("area.ndjson");
        let non_area = temp.path().join("non_area.ndjson");

        let summary = split_area_mods(&input, &area, &non_area).unwrap();

        assert_eq!(summary.area, 1);
        assert_eq!(summary.non_area, 1);
        assert_eq!(summary.invalid_lines, vec![2]);
    }

    #[test]
    fn test_split_missing_input_is_error() {
        let temp = TempDir::new().unwrap();
        let result = split_area_mods(
            &temp.path().join("nope.ndjson"),
            &temp.path().join("a"),
            &temp.path().join("b"),
        );
        assert!(result.is_err());
    }
}
