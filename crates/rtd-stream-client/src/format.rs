/*
[INPUT]:  Provider values (text, double, integer, other)
[OUTPUT]: Bounded display strings for the console
[POS]:    Output layer - value rendering
[UPDATE]: When supporting new value kinds
*/

use rtd_stream_adapter::{RtdValue, truncate_chars};

pub const DEFAULT_VALUE_BUFFER_LEN: usize = 128;

/// Renders values into at most `buffer_len - 1` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueFormatter {
    buffer_len: usize,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_VALUE_BUFFER_LEN)
    }
}

impl ValueFormatter {
    pub fn new(buffer_len: usize) -> Self {
        Self { buffer_len }
    }

    pub fn max_chars(&self) -> usize {
        self.buffer_len.saturating_sub(1)
    }

    pub fn format(&self, value: &RtdValue) -> String {
        let rendered = render(value);
        if rendered.chars().count() <= self.max_chars() {
            return rendered;
        }
        truncate_chars(&rendered, self.max_chars())
    }
}

fn render(value: &RtdValue) -> String {
    match value {
        RtdValue::Text(text) => text.clone(),
        RtdValue::Double(number) => format!("{number:.6}"),
        RtdValue::Int(number) => number.to_string(),
        RtdValue::Other { type_code } => format!("<unknown type {type_code}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rtd_stream_adapter::type_code;

    #[rstest]
    #[case(RtdValue::Double(3.14159265), "3.141593")]
    #[case(RtdValue::Double(187.5), "187.500000")]
    #[case(RtdValue::Int(42), "42")]
    #[case(RtdValue::Int(-7), "-7")]
    #[case(RtdValue::Text("HELLO".to_string()), "HELLO")]
    #[case(RtdValue::Other { type_code: type_code::BOOL }, "<unknown type 11>")]
    #[case(RtdValue::empty(), "<unknown type 0>")]
    fn formats_each_kind(#[case] value: RtdValue, #[case] expected: &str) {
        assert_eq!(ValueFormatter::default().format(&value), expected);
    }

    #[test]
    fn long_text_is_cut_to_buffer() {
        let formatter = ValueFormatter::new(16);
        let value = RtdValue::Text("X".repeat(200));
        assert_eq!(formatter.format(&value), "X".repeat(15));
    }

    #[test]
    fn huge_double_respects_buffer() {
        let formatter = ValueFormatter::new(16);
        let text = formatter.format(&RtdValue::Double(1e300));
        assert_eq!(text.chars().count(), 15);
    }
}
