//! Tick normalization
//!
//! Turns a raw Binance trade message into a [`NewTrade`]. Only `s` (symbol)
//! and `p` (price) are read; every other field is ignored. The record
//! timestamp is the local clock at conversion time, never the feed's.

use super::MalformedMessage;
use crate::store::NewTrade;
use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

const SYMBOL_FIELD: &str = "s";
const PRICE_FIELD: &str = "p";

/// Normalize a raw message, stamping it with the current time
pub fn normalize(raw: &str) -> Result<NewTrade, MalformedMessage> {
    normalize_at(raw, Utc::now())
}

/// Normalize a raw message, stamping it with `now` truncated to whole seconds
pub fn normalize_at(raw: &str, now: DateTime<Utc>) -> Result<NewTrade, MalformedMessage> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| MalformedMessage::InvalidJson(e.to_string()))?;
    let object = value.as_object().ok_or(MalformedMessage::NotAnObject)?;

    let symbol = parse_symbol(object)?;
    let price = parse_price(object)?;

    Ok(NewTrade {
        symbol,
        price,
        timestamp: now.trunc_subsecs(0),
    })
}

fn parse_symbol(object: &Map<String, Value>) -> Result<String, MalformedMessage> {
    match object.get(SYMBOL_FIELD) {
        None => Err(MalformedMessage::MissingField(SYMBOL_FIELD)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(MalformedMessage::EmptySymbol),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(MalformedMessage::WrongType {
            field: SYMBOL_FIELD,
            expected: "string",
        }),
    }
}

fn parse_price(object: &Map<String, Value>) -> Result<Decimal, MalformedMessage> {
    let text = match object.get(PRICE_FIELD) {
        None => return Err(MalformedMessage::MissingField(PRICE_FIELD)),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            return Err(MalformedMessage::WrongType {
                field: PRICE_FIELD,
                expected: "numeric string",
            })
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| MalformedMessage::InvalidPrice(text))
}
