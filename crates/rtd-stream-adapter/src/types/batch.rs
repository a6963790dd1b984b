/*
[INPUT]:  Subscription arguments and refreshed provider rows
[OUTPUT]: Argument list and refresh batch types
[POS]:    Data layer - connect and pull payloads
[UPDATE]: When the connect/pull payload shape changes
*/

use super::text::{Symbol, Topic};
use super::value::RtdValue;

/// Caller-chosen tag correlating a subscription with rows returned by a pull.
pub type TopicId = i32;

/// Ordered `(topic, symbol)` argument list sent with a connect request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicArgs {
    topic: Topic,
    symbol: Symbol,
}

impl TopicArgs {
    pub fn new(topic: Topic, symbol: Symbol) -> Self {
        Self { topic, symbol }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn as_strings(&self) -> [&str; 2] {
        [self.topic.as_str(), self.symbol.as_str()]
    }
}

/// One `(topic-id, value)` row of a refresh batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshRow {
    pub topic_id: TopicId,
    pub value: RtdValue,
}

impl RefreshRow {
    pub fn new(topic_id: TopicId, value: impl Into<RtdValue>) -> Self {
        Self {
            topic_id,
            value: value.into(),
        }
    }
}

/// Two-column table returned by a pull, with the provider-reported topic count.
///
/// Only the first `min(topic_count, rows.len())` rows are meaningful.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshBatch {
    topic_count: usize,
    rows: Vec<RefreshRow>,
}

impl RefreshBatch {
    pub fn new(rows: Vec<RefreshRow>) -> Self {
        Self {
            topic_count: rows.len(),
            rows,
        }
    }

    pub fn with_count(topic_count: usize, rows: Vec<RefreshRow>) -> Self {
        Self { topic_count, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn topic_count(&self) -> usize {
        self.topic_count
    }

    pub fn is_empty(&self) -> bool {
        self.topic_count == 0 || self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &RefreshRow> {
        self.rows.iter().take(self.topic_count)
    }

    pub fn matching(&self, topic_id: TopicId) -> impl Iterator<Item = &RefreshRow> {
        self.rows().filter(move |row| row.topic_id == topic_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_keep_topic_then_symbol_order() {
        let args = TopicArgs::new(Topic::new("LAST"), Symbol::new("AAPL"));
        assert_eq!(args.as_strings(), ["LAST", "AAPL"]);
    }

    #[test]
    fn rows_are_bounded_by_topic_count() {
        let batch = RefreshBatch::with_count(
            1,
            vec![RefreshRow::new(1, 10.0), RefreshRow::new(1, 11.0)],
        );
        assert_eq!(batch.rows().count(), 1);
        assert!(!batch.is_empty());
    }

    #[test]
    fn matching_filters_by_topic_id() {
        let batch = RefreshBatch::new(vec![
            RefreshRow::new(1, 10.0),
            RefreshRow::new(2, "other"),
            RefreshRow::new(1, 12),
        ]);
        let values: Vec<_> = batch.matching(1).map(|row| row.value.clone()).collect();
        assert_eq!(values, vec![RtdValue::Double(10.0), RtdValue::Int(12)]);
    }

    #[test]
    fn zero_count_batch_is_empty() {
        let batch = RefreshBatch::with_count(0, vec![RefreshRow::new(1, 1)]);
        assert!(batch.is_empty());
        assert_eq!(batch.rows().count(), 0);
        assert!(RefreshBatch::empty().is_empty());
    }
}
