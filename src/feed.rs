//! Feed view-model: holds the last successful fetch, its status, and derived stats.
//!
//! The held set is swapped wholesale on every successful fetch. A failed fetch
//! keeps the previous records so the dashboard shows stale data plus an error
//! indicator instead of going blank.

use crate::error::FetchError;
use crate::filter::{self, FilterState};
use crate::types::TransactionRecord;
use chrono::{DateTime, Local};
use tracing::{debug, warn};

/// Lifecycle of the held record set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedStatus {
    Loading,
    Ready,
    Error,
}

/// Statistics shown in the stat cards
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedStats {
    pub count: usize,
    /// `None` when there are no records ("no data").
    pub average_fee: Option<u64>,
    /// Wall-clock time of the last successful fetch, not a record field.
    pub last_updated_at: Option<DateTime<Local>>,
}

/// Compute count, rounded average fee and last update time.
///
/// Absent fees contribute nothing to the sum but still count towards the
/// divisor. Rounding is half-up.
pub fn derive_stats(records: &[TransactionRecord], last_updated_at: Option<DateTime<Local>>) -> FeedStats {
    let count = records.len();
    let average_fee = if count == 0 {
        None
    } else {
        let sum: u128 = records
            .iter()
            .filter_map(|r| r.charged_fee)
            .map(u128::from)
            .sum();
        let n = count as u128;
        let rounded = (sum + n / 2) / n;
        Some(u64::try_from(rounded).unwrap_or(u64::MAX))
    };

    FeedStats {
        count,
        average_fee,
        last_updated_at,
    }
}

/// Reconciler state for one dashboard feed
#[derive(Debug)]
pub struct FeedView {
    records: Vec<TransactionRecord>,
    status: FeedStatus,
    last_updated_at: Option<DateTime<Local>>,
    last_error: Option<FetchError>,
    in_flight: bool,
}

impl Default for FeedView {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedView {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            status: FeedStatus::Loading,
            last_updated_at: None,
            last_error: None,
            in_flight: false,
        }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }

    /// Mark a fetch as started. Returns `false` if one is already pending,
    /// in which case the caller must not issue another request.
    pub fn begin_fetch(&mut self) -> bool {
        if self.in_flight {
            debug!("Fetch already in flight, ignoring refresh request");
            return false;
        }
        self.in_flight = true;
        self.status = FeedStatus::Loading;
        true
    }

    /// Reconcile a fetch result, stamping success with the current local time.
    pub fn apply_fetch(&mut self, result: Result<Vec<TransactionRecord>, FetchError>) {
        self.apply_fetch_at(result, Local::now());
    }

    pub fn apply_fetch_at(
        &mut self,
        result: Result<Vec<TransactionRecord>, FetchError>,
        now: DateTime<Local>,
    ) {
        self.in_flight = false;
        match result {
            Ok(records) => {
                debug!("Feed updated with {} records", records.len());
                self.records = records;
                self.status = FeedStatus::Ready;
                self.last_updated_at = Some(now);
                self.last_error = None;
            }
            Err(e) => {
                warn!(
                    "Fetch failed, keeping {} stale records: {}",
                    self.records.len(),
                    e
                );
                self.status = FeedStatus::Error;
                self.last_error = Some(e);
            }
        }
    }

    pub fn stats(&self) -> FeedStats {
        derive_stats(&self.records, self.last_updated_at)
    }

    pub fn project(&self, filter: &FilterState) -> Vec<&TransactionRecord> {
        filter::project(&self.records, filter)
    }

    /// Drop everything and go back to the pre-fetch state
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterMode;
    use chrono::TimeZone;

    fn record(entity: &str, ts: &str, fee: Option<u64>) -> TransactionRecord {
        TransactionRecord {
            entity_id: Some(entity.to_string()),
            consensus_timestamp: Some(ts.to_string()),
            charged_fee: fee,
            ..Default::default()
        }
    }

    fn scenario() -> Vec<TransactionRecord> {
        vec![
            record("0.0.123", "2024-01-01T00:00:00Z", Some(2_000_000)),
            record("0.0.456", "2024-01-02T00:00:00Z", Some(500_000)),
        ]
    }

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let feed = FeedView::new();
        assert!(feed.records().is_empty());
        assert_eq!(feed.status(), FeedStatus::Loading);
        assert!(!feed.is_fetching());
        assert_eq!(feed.stats().last_updated_at, None);
    }

    #[test]
    fn test_apply_success_replaces_records() {
        let mut feed = FeedView::new();
        feed.apply_fetch_at(Ok(scenario()), fixed_now());
        assert_eq!(feed.records(), scenario().as_slice());
        assert_eq!(feed.status(), FeedStatus::Ready);

        let replacement = vec![record("0.0.789", "2024-01-05T00:00:00Z", None)];
        feed.apply_fetch_at(Ok(replacement.clone()), fixed_now());
        assert_eq!(feed.records(), replacement.as_slice());
    }

    #[test]
    fn test_apply_failure_keeps_stale_records() {
        let mut feed = FeedView::new();
        feed.apply_fetch_at(Ok(scenario()), fixed_now());
        feed.apply_fetch(Err(FetchError::Upstream { status: 502 }));

        assert_eq!(feed.records().len(), 2);
        assert_eq!(feed.status(), FeedStatus::Error);
        assert_eq!(feed.last_error(), Some(&FetchError::Upstream { status: 502 }));
        // Last successful update time survives the failure
        assert_eq!(feed.stats().last_updated_at, Some(fixed_now()));
    }

    #[test]
    fn test_failure_before_first_fetch_leaves_empty_set() {
        let mut feed = FeedView::new();
        feed.apply_fetch(Err(FetchError::Network("refused".into())));
        assert!(feed.records().is_empty());
        assert_eq!(feed.status(), FeedStatus::Error);
    }

    #[test]
    fn test_success_clears_previous_error() {
        let mut feed = FeedView::new();
        feed.apply_fetch(Err(FetchError::Network("refused".into())));
        feed.apply_fetch(Ok(scenario()));
        assert!(feed.last_error().is_none());
        assert_eq!(feed.status(), FeedStatus::Ready);
    }

    #[test]
    fn test_begin_fetch_coalesces_concurrent_requests() {
        let mut feed = FeedView::new();
        assert!(feed.begin_fetch());
        assert!(!feed.begin_fetch());
        assert!(feed.is_fetching());

        feed.apply_fetch(Ok(Vec::new()));
        assert!(!feed.is_fetching());
        assert!(feed.begin_fetch());
        assert_eq!(feed.status(), FeedStatus::Loading);
    }

    #[test]
    fn test_scenario_stats() {
        let mut feed = FeedView::new();
        feed.apply_fetch_at(Ok(scenario()), fixed_now());
        let stats = feed.stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.average_fee, Some(1_250_000));
        assert_eq!(stats.last_updated_at, Some(fixed_now()));
    }

    #[test]
    fn test_scenario_projections() {
        let mut feed = FeedView::new();
        feed.apply_fetch(Ok(scenario()));

        let by_query = feed.project(&FilterState::new("123", FilterMode::All));
        assert_eq!(by_query.len(), 1);
        assert_eq!(by_query[0].entity_id.as_deref(), Some("0.0.123"));

        let high = feed.project(&FilterState::new("", FilterMode::HighFee));
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].entity_id.as_deref(), Some("0.0.123"));

        let low = feed.project(&FilterState::new("", FilterMode::LowFee));
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].entity_id.as_deref(), Some("0.0.456"));
    }

    #[test]
    fn test_derive_stats_empty_has_no_average() {
        let stats = derive_stats(&[], None);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average_fee, None);
    }

    #[test]
    fn test_derive_stats_absent_fee_counts_in_divisor() {
        let records = vec![
            record("0.0.1", "1", Some(300)),
            record("0.0.2", "2", None),
        ];
        assert_eq!(derive_stats(&records, None).average_fee, Some(150));
    }

    #[test]
    fn test_derive_stats_rounds_half_up() {
        let records = vec![record("0.0.1", "1", Some(1)), record("0.0.2", "2", Some(2))];
        // 3 / 2 = 1.5 -> 2
        assert_eq!(derive_stats(&records, None).average_fee, Some(2));
        let records = vec![
            record("0.0.1", "1", Some(1)),
            record("0.0.2", "2", Some(1)),
            record("0.0.3", "3", Some(2)),
        ];
        // 4 / 3 = 1.33 -> 1
        assert_eq!(derive_stats(&records, None).average_fee, Some(1));
    }

    #[test]
    fn test_derive_stats_does_not_overflow() {
        let records = vec![
            record("0.0.1", "1", Some(u64::MAX)),
            record("0.0.2", "2", Some(u64::MAX)),
        ];
        assert_eq!(derive_stats(&records, None).average_fee, Some(u64::MAX));
    }

    #[test]
    fn test_clear_resets() {
        let mut feed = FeedView::new();
        feed.apply_fetch(Ok(scenario()));
        feed.clear();
        assert!(feed.records().is_empty());
        assert_eq!(feed.status(), FeedStatus::Loading);
        assert_eq!(feed.stats().average_fee, None);
    }
}
