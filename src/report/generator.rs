//! Summary rendering.
//!
//! This module turns a [`Summary`] into the persisted JSON document, the
//! console echo, and an optional Markdown report.

use crate::models::{FrequencyTable, Key, ReportMetadata, Summary};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Generate the JSON summary document.
///
/// Pretty-printed with two-space indentation; non-ASCII text is kept as is.
pub fn generate_json_report(summary: &Summary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(Into::into)
}

/// Render the summary for the console, one field per line.
///
/// `top_n` is the configured subreddit cut, printed in the ranking header.
pub fn render_console_summary(summary: &Summary, top_n: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("Rows: {}\n", summary.rows));
    output.push_str(&format!("Labels: {}\n", format_table(&summary.labels)));
    output.push_str(&format!(
        "Top subreddits ({}): {}\n",
        top_n,
        format_ranking(&summary.top_subreddits)
    ));
    output.push_str(&format!(
        "Marker types: {}\n",
        format_table(&summary.marker_types)
    ));
    output.push_str(&format!(
        "Text length (chars): {}\n",
        summary.text_length_chars
    ));

    output
}

/// Text keys are quoted, other keys print bare.
fn console_key(key: &Key) -> String {
    match key {
        Key::Text(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

fn format_table(table: &FrequencyTable<Key>) -> String {
    let entries: Vec<String> = table
        .merged_by_text()
        .into_iter()
        .map(|(key, count)| format!("{}: {}", console_key(key), count))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn format_ranking(ranking: &[(Key, u64)]) -> String {
    let entries: Vec<String> = ranking
        .iter()
        .map(|(key, count)| format!("({}, {})", console_key(key), count))
        .collect();
    format!("[{}]", entries.join(", "))
}

/// Generate a Markdown report of the summary.
pub fn generate_markdown_report(summary: &Summary, metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    output.push_str("# PsyCoMark Dataset Summary\n\n");
    output.push_str(&generate_metadata_section(summary, metadata));
    output.push_str(&generate_table_section(
        "Labels",
        "Label",
        summary.labels.merged_by_text().into_iter(),
    ));
    output.push_str(&generate_table_section(
        "Top Subreddits",
        "Subreddit",
        summary.top_subreddits.iter().map(|(key, count)| (key, *count)),
    ));

    // Marker types are ranked by count.
    let mut marker_types = summary.marker_types.merged_by_text();
    marker_types.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    output.push_str(&generate_table_section(
        "Marker Types",
        "Type",
        marker_types.into_iter(),
    ));

    output.push_str(&generate_length_section(summary));
    output.push_str("---\n\n*Report generated by psycomark-eda*\n");

    output
}

fn generate_metadata_section(summary: &Summary, metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.input));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Rows:** {}\n", summary.rows));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_table_section<'a>(
    title: &str,
    column: &str,
    entries: impl Iterator<Item = (&'a Key, u64)>,
) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));

    let rows: Vec<String> = entries
        .map(|(key, count)| format!("| {} | {} |\n", escape_cell(&key.to_string()), count))
        .collect();

    if rows.is_empty() {
        section.push_str("*None found.*\n\n");
        return section;
    }

    section.push_str(&format!("| {} | Count |\n", column));
    section.push_str("|:---|:---:|\n");
    for row in rows {
        section.push_str(&row);
    }
    section.push('\n');

    section
}

fn generate_length_section(summary: &Summary) -> String {
    let stats = &summary.text_length_chars;
    let mut section = String::new();

    section.push_str("## Text Length (chars)\n\n");
    section.push_str("| Min | P25 | Median | P75 | Max |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        stats.min, stats.p25, stats.median, stats.p75, stats.max
    ));

    section
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Write rendered report content to `path`.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LengthStats;
    use chrono::Utc;
    use serde_json::{json, Number, Value};

    fn create_test_summary() -> Summary {
        let mut labels = FrequencyTable::new();
        labels.increment(Key::from("yes"));
        labels.increment(Key::from("no"));
        labels.increment(Key::from("yes"));

        let mut marker_types = FrequencyTable::new();
        marker_types.increment(Key::from("Actor"));
        marker_types.increment(Key::from("Effect"));
        marker_types.increment(Key::from("Effect"));

        Summary {
            rows: 3,
            labels,
            top_subreddits: vec![(Key::from("conspiracy"), 2), (Key::from("news"), 1)],
            marker_types,
            text_length_chars: LengthStats {
                min: 1,
                p25: 1,
                median: 2,
                p75: 3,
                max: 4,
            },
        }
    }

    #[test]
    fn test_generate_json_report_shape() {
        let summary = create_test_summary();
        let json: Value = serde_json::from_str(&generate_json_report(&summary).unwrap()).unwrap();

        assert_eq!(
            json,
            json!({
                "rows": 3,
                "labels": {"yes": 2, "no": 1},
                "top_subreddits": [["conspiracy", 2], ["news", 1]],
                "marker_types": {"Actor": 1, "Effect": 2},
                "text_length_chars": {"min": 1, "p25": 1, "median": 2, "p75": 3, "max": 4}
            })
        );
    }

    #[test]
    fn test_json_report_field_order_and_indent() {
        let text = generate_json_report(&create_test_summary()).unwrap();

        assert!(text.starts_with("{\n  \"rows\": 3,\n  \"labels\""));
        let rows = text.find("\"rows\"").unwrap();
        let top = text.find("\"top_subreddits\"").unwrap();
        let lengths = text.find("\"text_length_chars\"").unwrap();
        assert!(rows < top && top < lengths);
    }

    #[test]
    fn test_json_report_keeps_non_ascii() {
        let mut summary = create_test_summary();
        summary.top_subreddits = vec![(Key::from("verschwörung"), 1)];

        let text = generate_json_report(&summary).unwrap();
        assert!(text.contains("verschwörung"));
    }

    #[test]
    fn test_json_report_non_string_keys() {
        let mut summary = create_test_summary();
        let mut labels = FrequencyTable::new();
        labels.increment(Key::Number(Number::from(1u64)));
        labels.increment(Key::Bool(false));
        summary.labels = labels;
        summary.top_subreddits = vec![(Key::Number(Number::from(7u64)), 1)];

        let json: Value = serde_json::from_str(&generate_json_report(&summary).unwrap()).unwrap();
        assert_eq!(json["labels"], json!({"1": 1, "false": 1}));
        assert_eq!(json["top_subreddits"], json!([[7, 1]]));
    }

    #[test]
    fn test_console_summary() {
        let console = render_console_summary(&create_test_summary(), 15);
        let lines: Vec<&str> = console.lines().collect();

        assert_eq!(lines[0], "Rows: 3");
        assert_eq!(lines[1], "Labels: {'yes': 2, 'no': 1}");
        assert_eq!(
            lines[2],
            "Top subreddits (15): [('conspiracy', 2), ('news', 1)]"
        );
        assert_eq!(lines[3], "Marker types: {'Actor': 1, 'Effect': 2}");
        assert_eq!(
            lines[4],
            "Text length (chars): {min: 1, p25: 1, median: 2, p75: 3, max: 4}"
        );
    }

    #[test]
    fn test_console_header_uses_configured_cut() {
        let mut summary = create_test_summary();
        summary.top_subreddits.clear();

        let console = render_console_summary(&summary, 5);
        assert!(console.contains("Top subreddits (5): []"));
    }

    #[test]
    fn test_console_merges_keys_like_document() {
        let mut summary = create_test_summary();
        let mut labels = FrequencyTable::new();
        labels.increment(Key::Number(Number::from(1u64)));
        labels.increment(Key::Number(Number::from(1u64)));
        labels.increment(Key::from("1"));
        summary.labels = labels;

        let console = render_console_summary(&summary, 15);
        let json: Value = serde_json::from_str(&generate_json_report(&summary).unwrap()).unwrap();

        assert!(console.contains("Labels: {1: 3}"));
        assert_eq!(json["labels"], json!({"1": 3}));
    }

    #[test]
    fn test_console_matches_document() {
        let summary = create_test_summary();
        let console = render_console_summary(&summary, 15);
        let json: Value = serde_json::from_str(&generate_json_report(&summary).unwrap()).unwrap();

        assert!(console.contains(&format!("Rows: {}", json["rows"])));
        let lengths = &json["text_length_chars"];
        assert!(console.contains(&format!(
            "{{min: {}, p25: {}, median: {}, p75: {}, max: {}}}",
            lengths["min"], lengths["p25"], lengths["median"], lengths["p75"], lengths["max"]
        )));
    }

    #[test]
    fn test_generate_markdown_report() {
        let metadata = ReportMetadata {
            input: "data/train.jsonl".to_string(),
            generated_at: Utc::now(),
            duration_seconds: 0.4,
        };
        let markdown = generate_markdown_report(&create_test_summary(), &metadata);

        assert!(markdown.contains("# PsyCoMark Dataset Summary"));
        assert!(markdown.contains("`data/train.jsonl`"));
        assert!(markdown.contains("| conspiracy | 2 |"));
        assert!(markdown.contains("| 1 | 1 | 2 | 3 | 4 |"));

        // Marker types are ranked by count.
        let effect = markdown.find("| Effect | 2 |").unwrap();
        let actor = markdown.find("| Actor | 1 |").unwrap();
        assert!(effect < actor);
    }

    #[test]
    fn test_markdown_empty_tables() {
        let summary = Summary {
            rows: 0,
            labels: FrequencyTable::new(),
            top_subreddits: Vec::new(),
            marker_types: FrequencyTable::new(),
            text_length_chars: LengthStats::default(),
        };
        let metadata = ReportMetadata {
            input: "empty.jsonl".to_string(),
            generated_at: Utc::now(),
            duration_seconds: 0.0,
        };

        let markdown = generate_markdown_report(&summary, &metadata);
        assert_eq!(markdown.matches("*None found.*").count(), 3);
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eda_summary.json");

        write_report(&path, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");

        let missing_dir = dir.path().join("nope").join("out.json");
        assert!(write_report(&missing_dir, "{}").is_err());
    }
}
