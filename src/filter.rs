//! Search and fee-band filter applied to a transaction feed.

use crate::types::TransactionRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fee above which a transaction counts as "high fee" (tinybars / wei).
pub const HIGH_FEE_THRESHOLD: u64 = 1_000_000;

/// Fee band selected in the filter dropdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    #[default]
    All,
    HighFee,
    LowFee,
}

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 3] = [FilterMode::All, FilterMode::HighFee, FilterMode::LowFee];

    /// Label shown in the dropdown
    pub fn label(&self) -> &'static str {
        match self {
            FilterMode::All => "All Transactions",
            FilterMode::HighFee => "High Fee (>1M tinybars)",
            FilterMode::LowFee => "Low Fee (<=1M tinybars)",
        }
    }

    /// Whether a charged fee falls in this band. Unknown fees only pass `All`.
    pub fn accepts(&self, fee: Option<u64>) -> bool {
        match (self, fee) {
            (FilterMode::All, _) => true,
            (FilterMode::HighFee, Some(fee)) => fee > HIGH_FEE_THRESHOLD,
            (FilterMode::LowFee, Some(fee)) => fee <= HIGH_FEE_THRESHOLD,
            (FilterMode::HighFee | FilterMode::LowFee, None) => false,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterMode::All => "all",
            FilterMode::HighFee => "high-fee",
            FilterMode::LowFee => "low-fee",
        };
        f.write_str(s)
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(FilterMode::All),
            "high-fee" | "high" => Ok(FilterMode::HighFee),
            "low-fee" | "low" => Ok(FilterMode::LowFee),
            other => Err(format!(
                "unknown filter mode '{}' (expected all, high-fee or low-fee)",
                other
            )),
        }
    }
}

/// Current search query and fee band, owned by the presentation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    pub mode: FilterMode,
}

impl FilterState {
    pub fn new(query: impl Into<String>, mode: FilterMode) -> Self {
        Self {
            query: query.into(),
            mode,
        }
    }

    /// True when the filter narrows the feed at all
    pub fn is_active(&self) -> bool {
        !self.query.is_empty() || self.mode != FilterMode::All
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.mode = FilterMode::All;
    }

    /// Substring match on entity id or timestamp, then the fee band.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        let matches_search = self.query.is_empty()
            || record
                .entity_id
                .as_deref()
                .is_some_and(|id| id.contains(&self.query))
            || record
                .consensus_timestamp
                .as_deref()
                .is_some_and(|ts| ts.contains(&self.query));

        matches_search && self.mode.accepts(record.charged_fee)
    }
}

/// Records kept by `filter`, in feed order.
pub fn project<'a>(records: &'a [TransactionRecord], filter: &FilterState) -> Vec<&'a TransactionRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}
