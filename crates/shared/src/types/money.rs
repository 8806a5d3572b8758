//! Decimal amounts and lenient parsing of persisted values.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount is a `rust_decimal::Decimal`.
//!
//! Amounts reach the store from form inputs typed on Arabic keyboards and from
//! older clients that wrote numbers, numeric strings or empty strings. The
//! helpers here accept all of those shapes and always write a canonical
//! decimal string back.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Replaces Arabic-Indic and Persian digits with ASCII digits.
#[must_use]
pub fn normalize_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            _ => c,
        })
        .collect()
}

/// Parses a user-typed amount into a non-negative decimal.
///
/// Digits are normalized, thousands separators and any other non-numeric
/// characters are dropped, and every dot after the first is discarded.
/// Returns `None` when nothing numeric remains.
#[must_use]
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let normalized = normalize_digits(input);
    let mut seen_dot = false;
    let cleaned: String = normalized
        .chars()
        .filter(|c| {
            if *c == '.' {
                let keep = !seen_dot;
                seen_dot = true;
                keep
            } else {
                c.is_ascii_digit()
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned == "." {
        return None;
    }

    let candidate = if cleaned.starts_with('.') {
        format!("0{cleaned}")
    } else {
        cleaned
    };
    Decimal::from_str(&candidate).ok()
}

/// Serde adapter for amounts stored by heterogeneous clients.
///
/// Reads numbers, numeric strings (Arabic digits included), empty strings and
/// null; writes the normalized decimal as a string.
pub mod lenient_amount {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use serde_json::Value;

    use super::parse_amount;

    /// Serializes an amount as its normalized decimal string.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    pub fn serialize<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&amount.normalize())
    }

    /// Deserializes an amount from any of the accepted shapes.
    ///
    /// # Errors
    ///
    /// Returns an error for booleans, arrays, objects and unparseable numbers.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Decimal::ZERO),
            Value::String(s) => {
                let trimmed = s.trim();
                let negative = trimmed.starts_with('-');
                let amount = parse_amount(trimmed).unwrap_or(Decimal::ZERO);
                Ok(if negative { -amount } else { amount })
            }
            Value::Number(n) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map_err(|e| D::Error::custom(format!("invalid amount {text}: {e}")))
            }
            other => Err(D::Error::custom(format!("invalid amount: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Row {
        #[serde(with = "lenient_amount", default)]
        amount: Decimal,
    }

    #[test]
    fn test_normalize_digits() {
        assert_eq!(normalize_digits("١٢٣"), "123");
        assert_eq!(normalize_digits("۴۵۶"), "456");
        assert_eq!(normalize_digits("12a"), "12a");
    }

    #[rstest]
    #[case("150", Some(dec!(150)))]
    #[case("1,250.50", Some(dec!(1250.50)))]
    #[case("١٬٢٠٠", Some(dec!(1200)))]
    #[case("12.5.3", Some(dec!(12.53)))]
    #[case(".5", Some(dec!(0.5)))]
    #[case("007", Some(dec!(7)))]
    #[case("", None)]
    #[case("abc", None)]
    #[case(".", None)]
    fn test_parse_amount(#[case] input: &str, #[case] expected: Option<Decimal>) {
        assert_eq!(parse_amount(input), expected);
    }

    #[rstest]
    #[case(r#"{"amount": 100}"#, dec!(100))]
    #[case(r#"{"amount": 12.75}"#, dec!(12.75))]
    #[case(r#"{"amount": "250"}"#, dec!(250))]
    #[case(r#"{"amount": ""}"#, Decimal::ZERO)]
    #[case(r#"{"amount": null}"#, Decimal::ZERO)]
    #[case(r#"{"amount": "-40"}"#, dec!(-40))]
    #[case(r#"{}"#, Decimal::ZERO)]
    fn test_lenient_deserialize(#[case] json: &str, #[case] expected: Decimal) {
        let row: Row = serde_json::from_str(json).unwrap();
        assert_eq!(row.amount, expected);
    }

    #[test]
    fn test_lenient_rejects_non_numeric_shapes() {
        assert!(serde_json::from_str::<Row>(r#"{"amount": true}"#).is_err());
        assert!(serde_json::from_str::<Row>(r#"{"amount": [1]}"#).is_err());
    }

    #[test]
    fn test_serialize_normalizes() {
        let row = Row {
            amount: dec!(450.00),
        };
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"amount":"450"}"#);
    }
}
