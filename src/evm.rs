//! EVM feed: scans recent blocks for transactions touching an address.

use crate::error::FetchError;
use crate::types::{EvmDetails, TransactionRecord};
use ethers::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Block numbers covered by a scan of `blocks_to_scan` blocks ending at `head`.
///
/// Exactly `blocks_to_scan` blocks, fewer only near genesis.
pub fn scan_range(head: u64, blocks_to_scan: u64) -> std::ops::RangeInclusive<u64> {
    head.saturating_sub(blocks_to_scan.max(1) - 1)..=head
}

pub struct EvmFeed {
    provider: Arc<Provider<Http>>,
    blocks_to_scan: u64,
    timeout: Duration,
}

impl EvmFeed {
    pub fn new(provider: Arc<Provider<Http>>, blocks_to_scan: u64, timeout: Duration) -> Self {
        Self {
            provider,
            blocks_to_scan: blocks_to_scan.max(1),
            timeout,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Result<Self, FetchError> {
        let provider = config
            .evm
            .get_provider(config.request_timeout)
            .map_err(|e| FetchError::Validation(format!("Invalid RPC URL: {}", e)))?;
        Ok(Self::new(provider, config.evm.blocks_to_scan, config.request_timeout))
    }

    fn map_err(&self, err: ProviderError) -> FetchError {
        match err {
            ProviderError::HTTPError(e) => FetchError::from_reqwest(e, self.timeout),
            ProviderError::SerdeJson(e) => FetchError::MalformedResponse(e.to_string()),
            // Transport errors arrive boxed inside JsonRpcClientError
            other if other.to_string().contains("timed out") => FetchError::Timeout(self.timeout),
            other => FetchError::Network(other.to_string()),
        }
    }

    /// Transactions sent from or to `address` in the last `blocks_to_scan`
    /// blocks, newest block first.
    pub async fn fetch_for(&self, address: Address) -> Result<Vec<TransactionRecord>, FetchError> {
        let head = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| self.map_err(e))?
            .as_u64();
        let range = scan_range(head, self.blocks_to_scan);
        debug!("Scanning blocks {:?} for {:?}", range, address);

        let mut blocks = Vec::new();
        for number in range.rev() {
            match self
                .provider
                .get_block_with_txs(number)
                .await
                .map_err(|e| self.map_err(e))?
            {
                Some(block) => blocks.push(block),
                // Pruned or not yet propagated to this node
                None => warn!("Block {} not available, skipping", number),
            }
        }

        let records = records_for_address(&blocks, address, head);
        debug!("Found {} transactions for {:?}", records.len(), address);
        Ok(records)
    }
}

/// Match transactions in `blocks` against `address` and annotate them.
///
/// Addresses are compared as bytes, so checksum casing never matters.
pub fn records_for_address(blocks: &[Block<Transaction>], address: Address, head: u64) -> Vec<TransactionRecord> {
    let mut records = Vec::new();
    for block in blocks {
        let block_number = block.number.map(|n| n.as_u64()).unwrap_or_default();
        let confirmations = head.saturating_sub(block_number) + 1;
        for tx in &block.transactions {
            if tx.from == address || tx.to == Some(address) {
                records.push(to_record(tx, block_number, block.timestamp, confirmations));
            }
        }
    }
    records
}

fn to_record(tx: &Transaction, block_number: u64, timestamp: U256, confirmations: u64) -> TransactionRecord {
    let price = tx.max_fee_per_gas.or(tx.gas_price);
    let max_fee = price
        .and_then(|p| p.checked_mul(tx.gas))
        .filter(|fee| *fee <= U256::from(u64::MAX))
        .map(|fee| fee.as_u64());

    TransactionRecord {
        entity_id: Some(format!("{:?}", tx.from)),
        consensus_timestamp: Some(timestamp.to_string()),
        // Known only from the receipt
        charged_fee: None,
        max_fee,
        transaction_id: Some(format!("{:?}", tx.hash)),
        name: Some(if tx.to.is_some() { "TRANSFER" } else { "CONTRACT CREATION" }.to_string()),
        result: None,
        evm: Some(EvmDetails {
            hash: tx.hash,
            from: tx.from,
            to: tx.to,
            value: tx.value,
            block_number,
            confirmations,
        }),
    }
}
