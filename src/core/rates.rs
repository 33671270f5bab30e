//! Currency rate data model and conversion.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// One entry of the daily feed snapshot.
///
/// `rate` is units of the foreign currency bought by one unit of the base
/// currency and is guaranteed positive by the parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyRecord {
    pub country: String,
    pub code: String,
    pub rate: f64,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown currency code: {0}")]
pub struct UnknownCurrency(pub String);

/// Ordered view over one feed snapshot. Records keep feed order.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    records: Vec<CurrencyRecord>,
}

impl RateTable {
    pub fn new(records: Vec<CurrencyRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CurrencyRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CurrencyRecord> {
        self.records
    }

    pub fn find(&self, code: &str) -> Option<&CurrencyRecord> {
        self.records
            .iter()
            .find(|record| record.code.eq_ignore_ascii_case(code))
    }

    /// Converts `amount` of the foreign currency `code` into the base
    /// currency.
    pub fn convert(&self, amount: f64, code: &str) -> Result<f64, UnknownCurrency> {
        let record = self
            .find(code)
            .ok_or_else(|| UnknownCurrency(code.to_string()))?;
        Ok(amount / record.rate)
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn current_rates(&self) -> Result<RateTable>;
}
