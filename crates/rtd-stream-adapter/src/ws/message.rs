/*
[INPUT]:  Raw WebSocket price payloads
[OUTPUT]: Parsed PriceData structs and per-topic field extraction
[POS]:    WebSocket layer - message parsing and topic mapping
[UPDATE]: When the price payload format or topic mapping changes
*/

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::RtdValue;

/// Market price data
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceData {
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub index_price: String,
    #[serde(default)]
    pub last_price: String,
    #[serde(default)]
    pub mark_price: String,
    #[serde(default)]
    pub mid_price: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub spread: Vec<String>,
    pub symbol: String,
    #[serde(default)]
    pub time: String,
}

/// Price field a topic name selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Last,
    Mark,
    Index,
    Mid,
    Bid,
    Ask,
    Time,
}

impl PriceField {
    pub fn parse(topic: &str) -> Option<Self> {
        match topic.to_ascii_uppercase().as_str() {
            "LAST" => Some(PriceField::Last),
            "MARK" => Some(PriceField::Mark),
            "INDEX" => Some(PriceField::Index),
            "MID" => Some(PriceField::Mid),
            "BID" => Some(PriceField::Bid),
            "ASK" => Some(PriceField::Ask),
            "TIME" => Some(PriceField::Time),
            _ => None,
        }
    }

    /// Extract this field from a price frame. Blank or unparsable prices yield `None`.
    pub fn extract(&self, data: &PriceData) -> Option<RtdValue> {
        let raw = match self {
            PriceField::Last => data.last_price.as_str(),
            PriceField::Mark => data.mark_price.as_str(),
            PriceField::Index => data.index_price.as_str(),
            PriceField::Mid => data.mid_price.as_str(),
            PriceField::Bid => data.spread.first().map(String::as_str)?,
            PriceField::Ask => data.spread.get(1).map(String::as_str)?,
            PriceField::Time => {
                let time = data.time.trim();
                if time.is_empty() {
                    return None;
                }
                return Some(RtdValue::Text(time.to_string()));
            }
        };
        parse_price(raw).map(RtdValue::Double)
    }
}

fn parse_price(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw).ok()?.to_f64()
}
