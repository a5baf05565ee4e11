//! Hedera transaction tracker: mirror-node and EVM feeds, a filterable
//! dashboard, and a local read-only proxy.

pub mod activity_log;
pub mod config;
pub mod error;
pub mod evm;
pub mod export;
pub mod feed;
pub mod filter;
pub mod gui;
pub mod mirror;
pub mod pairing;
pub mod server;
pub mod types;
pub mod user_settings;
pub mod utils;
pub mod wallet;
