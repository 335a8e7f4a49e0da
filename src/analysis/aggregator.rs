//! Single-pass record aggregation.
//!
//! This module accumulates frequency tables and the text-length sample
//! from a stream of records and turns them into the final [`Summary`].

use super::percentile::compute_basic_percentiles;
use crate::dataset::DatasetError;
use crate::models::{FrequencyTable, Key, Record, Summary};
use tracing::debug;

/// Default number of subreddits kept in the summary.
pub const DEFAULT_TOP_SUBREDDITS: usize = 15;

/// Running tallies for one pass over the dataset.
#[derive(Debug, Default)]
pub struct Aggregator {
    rows: u64,
    labels: FrequencyTable<Key>,
    subreddits: FrequencyTable<Key>,
    marker_types: FrequencyTable<Key>,
    text_lengths: Vec<usize>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            rows: 0,
            labels: FrequencyTable::new(),
            subreddits: FrequencyTable::new(),
            marker_types: FrequencyTable::new(),
            text_lengths: Vec::new(),
        }
    }

    /// Fold one record into the tallies.
    pub fn observe(&mut self, record: Record) {
        self.rows += 1;

        self.text_lengths.push(record.text_len());

        if let Some(label) = record.label {
            self.labels.increment(label);
        }

        if let Some(subreddit) = record.subreddit {
            self.subreddits.increment(subreddit);
        }

        for kind in record.markers.into_iter().filter_map(|m| m.kind) {
            self.marker_types.increment(kind);
        }
    }

    /// Records observed so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    #[allow(dead_code)] // Inspection before summarizing
    pub fn labels(&self) -> &FrequencyTable<Key> {
        &self.labels
    }

    #[allow(dead_code)] // Inspection before summarizing
    pub fn subreddits(&self) -> &FrequencyTable<Key> {
        &self.subreddits
    }

    #[allow(dead_code)] // Inspection before summarizing
    pub fn marker_types(&self) -> &FrequencyTable<Key> {
        &self.marker_types
    }

    /// One length per observed record, in arrival order.
    #[allow(dead_code)] // Inspection before summarizing
    pub fn text_lengths(&self) -> &[usize] {
        &self.text_lengths
    }

    /// Finish the pass and build the summary, keeping the `top_n` subreddits.
    pub fn summarize(self, top_n: usize) -> Summary {
        debug!(
            "Summarizing {} rows: {} labels, {} subreddits, {} marker types ({} markers)",
            self.rows,
            self.labels.len(),
            self.subreddits.len(),
            self.marker_types.len(),
            self.marker_types.total()
        );

        Summary {
            rows: self.rows,
            top_subreddits: self.subreddits.most_common(top_n),
            text_length_chars: compute_basic_percentiles(&self.text_lengths),
            labels: self.labels,
            marker_types: self.marker_types,
        }
    }
}

/// Consume a record stream, stopping at the first error.
pub fn aggregate<I>(records: I) -> Result<Aggregator, DatasetError>
where
    I: IntoIterator<Item = Result<Record, DatasetError>>,
{
    let mut aggregator = Aggregator::new();
    for record in records {
        aggregator.observe(record?);
    }
    Ok(aggregator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RecordReader;
    use crate::models::LengthStats;
    use serde_json::{json, Number, Value};
    use std::io::Cursor;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(obj) => Record::from_object(obj).unwrap(),
            other => panic!("expected object, got {}", other),
        }
    }

    fn aggregate_str(input: &str) -> Result<Aggregator, DatasetError> {
        aggregate(RecordReader::new(Cursor::new(input.as_bytes().to_vec())))
    }

    #[test]
    fn test_observe_counts() {
        let mut agg = Aggregator::new();
        agg.observe(record(json!({
            "conspiracy": "yes",
            "subreddit": "conspiracy",
            "text": "abc",
            "markers": [{"type": "Actor"}, {"type": "Actor"}, {"type": "Effect"}]
        })));
        agg.observe(record(json!({
            "conspiracy": "no",
            "subreddit": "news",
            "text": "hello world"
        })));
        agg.observe(record(json!({"conspiracy": "yes", "subreddit": "conspiracy"})));

        assert_eq!(agg.rows(), 3);
        assert_eq!(agg.labels().get(&Key::from("yes")), 2);
        assert_eq!(agg.labels().get(&Key::from("no")), 1);
        assert_eq!(agg.subreddits().get(&Key::from("conspiracy")), 2);
        assert_eq!(agg.marker_types().get(&Key::from("Actor")), 2);
        assert_eq!(agg.marker_types().get(&Key::from("Effect")), 1);
        assert_eq!(agg.text_lengths(), &[3, 11, 0]);
    }

    #[test]
    fn test_one_length_per_record() {
        let mut agg = Aggregator::new();
        agg.observe(Record::default());
        agg.observe(record(json!({"text": null, "markers": null})));
        agg.observe(record(json!({"text": ""})));

        assert_eq!(agg.rows(), 3);
        assert_eq!(agg.text_lengths().len(), 3);
        assert!(agg.labels().is_empty());
        assert!(agg.subreddits().is_empty());
        assert!(agg.marker_types().is_empty());
    }

    #[test]
    fn test_markers_null_absent_and_empty_are_equivalent() {
        let variants = [
            json!({"text": "x"}),
            json!({"text": "x", "markers": null}),
            json!({"text": "x", "markers": []}),
        ];

        for variant in variants {
            let mut agg = Aggregator::new();
            agg.observe(record(variant));
            assert_eq!(agg.rows(), 1);
            assert!(agg.marker_types().is_empty());
            assert_eq!(agg.text_lengths(), &[1]);
        }
    }

    #[test]
    fn test_empty_valued_text_and_markers_are_counted_rows() {
        let agg = aggregate_str(
            "{\"text\": false}\n{\"text\": 0}\n{\"markers\": {}}\n{\"markers\": false}\n",
        )
        .unwrap();

        assert_eq!(agg.rows(), 4);
        assert_eq!(agg.text_lengths(), &[0, 0, 0, 0]);
        assert!(agg.marker_types().is_empty());
    }

    #[test]
    fn test_mixed_label_types() {
        let mut agg = Aggregator::new();
        agg.observe(record(json!({"conspiracy": 1})));
        agg.observe(record(json!({"conspiracy": 1})));
        agg.observe(record(json!({"conspiracy": "1"})));
        agg.observe(record(json!({"conspiracy": true})));

        assert_eq!(agg.labels().len(), 3);
        assert_eq!(agg.labels().get(&Key::Number(Number::from(1u64))), 2);
    }

    #[test]
    fn test_summary_top_subreddits() {
        let mut agg = Aggregator::new();
        for i in 0..20u64 {
            // subreddit i appears i + 1 times
            for _ in 0..=i {
                agg.observe(record(json!({"subreddit": format!("r{}", i)})));
            }
        }

        let summary = agg.summarize(DEFAULT_TOP_SUBREDDITS);
        assert_eq!(summary.top_subreddits.len(), 15);
        assert_eq!(summary.top_subreddits[0], (Key::from("r19"), 20));
        assert_eq!(summary.top_subreddits[14], (Key::from("r5"), 6));
        assert!(summary
            .top_subreddits
            .windows(2)
            .all(|pair| pair[0].1 >= pair[1].1));
    }

    #[test]
    fn test_summary_text_lengths() {
        let agg = aggregate_str(
            "{\"text\": \"a\"}\n{\"text\": \"bb\"}\n\n{\"text\": \"ccc\"}\n{\"text\": \"dddd\"}\n",
        )
        .unwrap();

        let summary = agg.summarize(DEFAULT_TOP_SUBREDDITS);
        assert_eq!(summary.rows, 4);
        assert_eq!(
            summary.text_length_chars,
            LengthStats {
                min: 1,
                p25: 1,
                median: 2,
                p75: 3,
                max: 4
            }
        );
    }

    #[test]
    fn test_empty_stream() {
        let summary = aggregate_str("").unwrap().summarize(DEFAULT_TOP_SUBREDDITS);

        assert_eq!(summary.rows, 0);
        assert!(summary.top_subreddits.is_empty());
        assert_eq!(summary.text_length_chars, LengthStats::default());
    }

    #[test]
    fn test_malformed_line_aborts() {
        let result = aggregate_str("{\"subreddit\": \"a\"}\n{\"subreddit\": \n{\"subreddit\": \"b\"}\n");

        match result {
            Err(DatasetError::Decode { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected decode error, got {:?}", other.map(|a| a.rows())),
        }
    }

    #[test]
    fn test_rows_match_non_blank_lines() {
        let input = "{}\n\n{\"text\": \"x\"}\n   \n{\"conspiracy\": null}\n";
        let non_blank = input.lines().filter(|l| !l.trim().is_empty()).count() as u64;

        let agg = aggregate_str(input).unwrap();
        assert_eq!(agg.rows(), non_blank);
        assert_eq!(agg.text_lengths().len() as u64, agg.rows());
    }
}
