//! Parser for the daily pipe-delimited rate feed.
//!
//! The raw feed starts with one metadata line (publication date and sequence
//! number) and one header row, both discarded. Every remaining non-empty row
//! carries at least five `|`-separated fields, of which column 0 is the
//! country name, column 3 the currency code, and column 4 the rate.

use crate::core::rates::CurrencyRecord;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("feed is missing the metadata line")]
    MissingMetadata,
    #[error("feed ends before the header row")]
    MissingHeader,
    #[error("row {row}: expected at least 5 fields, found {found}")]
    TooFewFields { row: usize, found: usize },
    #[error("row {row}: invalid rate '{value}'")]
    InvalidRate { row: usize, value: String },
}

/// Parses a raw feed snapshot into records, preserving feed order.
///
/// Any malformed data row fails the whole parse; a feed that cannot be
/// parsed in full is treated as an upstream fault rather than trimmed down
/// to the rows that happen to be well-formed.
pub fn parse_feed(raw: &str) -> Result<Vec<CurrencyRecord>, ParseError> {
    let Some((_metadata, rest)) = raw.split_once('\n') else {
        return Err(ParseError::MissingMetadata);
    };

    let mut lines = rest.lines();
    if lines.next().is_none() {
        return Err(ParseError::MissingHeader);
    }

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = index + 1;
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < 5 {
            return Err(ParseError::TooFewFields {
                row,
                found: fields.len(),
            });
        }
        let rate = parse_rate(fields[4]).ok_or_else(|| ParseError::InvalidRate {
            row,
            value: fields[4].to_string(),
        })?;
        records.push(CurrencyRecord {
            country: fields[0].trim().to_string(),
            code: fields[3].trim().to_string(),
            rate,
        });
    }
    Ok(records)
}

/// The upstream feed writes rates with a decimal comma.
fn parse_rate(value: &str) -> Option<f64> {
    let normalized = value.trim().replace(',', ".");
    let rate: f64 = normalized.parse().ok()?;
    (rate.is_finite() && rate > 0.0).then_some(rate)
}
