//! Reusable pieces of the feed dashboards.
//!
//! - `feed_panel` - filter bar, stat cards, status banner, empty state
//! - `record_row` - one transaction row for the Hedera or EVM list

pub mod feed_panel;
pub mod record_row;

pub use feed_panel::{empty_state, empty_state_message, filter_bar, stat_cards, status_banner};
pub use record_row::{evm_row, hedera_row};
