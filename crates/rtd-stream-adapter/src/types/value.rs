/*
[INPUT]:  Raw provider cell values
[OUTPUT]: Tagged value union with stable numeric type codes
[POS]:    Data layer - provider value representation
[UPDATE]: When providers start emitting new value kinds
*/

/// Numeric type codes carried by provider values.
///
/// The codes follow the automation variant tags providers historically use, so an
/// unrecognized tag can be reported by number.
pub mod type_code {
    pub const EMPTY: u16 = 0;
    pub const I4: u16 = 3;
    pub const R8: u16 = 5;
    pub const BSTR: u16 = 8;
    pub const ERROR: u16 = 10;
    pub const BOOL: u16 = 11;
}

/// A single tagged value delivered by a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum RtdValue {
    Text(String),
    Double(f64),
    Int(i32),
    /// Any tag the client does not decode; carries the raw type code.
    Other { type_code: u16 },
}

impl RtdValue {
    pub fn empty() -> Self {
        RtdValue::Other {
            type_code: type_code::EMPTY,
        }
    }

    pub fn type_code(&self) -> u16 {
        match self {
            RtdValue::Text(_) => type_code::BSTR,
            RtdValue::Double(_) => type_code::R8,
            RtdValue::Int(_) => type_code::I4,
            RtdValue::Other { type_code } => *type_code,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RtdValue::Other { type_code: code } if *code == type_code::EMPTY)
    }
}

impl From<f64> for RtdValue {
    fn from(value: f64) -> Self {
        RtdValue::Double(value)
    }
}

impl From<i32> for RtdValue {
    fn from(value: i32) -> Self {
        RtdValue::Int(value)
    }
}

impl From<String> for RtdValue {
    fn from(value: String) -> Self {
        RtdValue::Text(value)
    }
}

impl From<&str> for RtdValue {
    fn from(value: &str) -> Self {
        RtdValue::Text(value.to_string())
    }
}
