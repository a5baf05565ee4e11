//! CSV export of the currently projected records.

use crate::types::TransactionRecord;
use crate::utils::parse_timestamp;
use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct CsvRow<'a> {
    entity_id: &'a str,
    consensus_timestamp: &'a str,
    /// RFC 3339 in UTC, empty when the timestamp does not parse
    time_utc: String,
    charged_fee: Option<u64>,
    max_fee: Option<u64>,
    transaction_id: &'a str,
    name: &'a str,
    result: &'a str,
    from: String,
    to: String,
    value_wei: String,
    block_number: Option<u64>,
    confirmations: Option<u64>,
}

impl<'a> From<&'a TransactionRecord> for CsvRow<'a> {
    fn from(r: &'a TransactionRecord) -> Self {
        let evm = r.evm.as_ref();
        Self {
            entity_id: r.entity_id.as_deref().unwrap_or(""),
            consensus_timestamp: r.consensus_timestamp.as_deref().unwrap_or(""),
            time_utc: r
                .consensus_timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
            charged_fee: r.charged_fee,
            max_fee: r.max_fee,
            transaction_id: r.transaction_id.as_deref().unwrap_or(""),
            name: r.name.as_deref().unwrap_or(""),
            result: r.result.as_deref().unwrap_or(""),
            from: evm.map(|e| format!("{:?}", e.from)).unwrap_or_default(),
            to: evm
                .and_then(|e| e.to)
                .map(|to| format!("{:?}", to))
                .unwrap_or_default(),
            value_wei: evm.map(|e| e.value.to_string()).unwrap_or_default(),
            block_number: evm.map(|e| e.block_number),
            confirmations: evm.map(|e| e.confirmations),
        }
    }
}

/// Write `records` as CSV with a header row. Returns the number of rows.
pub fn write_csv<W: Write>(writer: W, records: &[&TransactionRecord]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(CsvRow::from(*record))?;
    }
    wtr.flush()?;
    Ok(records.len())
}

pub fn export_to_path(path: &Path, records: &[&TransactionRecord]) -> Result<usize> {
    let file = File::create(path)?;
    let rows = write_csv(file, records)?;
    tracing::info!("Exported {} records to {:?}", rows, path);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EvmDetails;
    use ethers::types::{Address, H256, U256};

    fn hedera_record() -> TransactionRecord {
        TransactionRecord {
            entity_id: Some("0.0.123".to_string()),
            consensus_timestamp: Some("1704067200.000000000".to_string()),
            charged_fee: Some(2_000_000),
            name: Some("CRYPTOTRANSFER".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_write_csv_hedera_rows() {
        let record = hedera_record();
        let mut out = Vec::new();
        assert_eq!(write_csv(&mut out, &[&record]).unwrap(), 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("entity_id,consensus_timestamp,time_utc,charged_fee,max_fee"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("0.0.123,1704067200.000000000,2024-01-01T00:00:00+00:00,2000000,,"));
        assert!(row.contains("CRYPTOTRANSFER"));
    }

    #[test]
    fn test_write_csv_evm_row() {
        let record = TransactionRecord {
            entity_id: Some("0x01".to_string()),
            consensus_timestamp: Some("garbage".to_string()),
            evm: Some(EvmDetails {
                hash: H256::zero(),
                from: Address::from([1u8; 20]),
                to: None,
                value: U256::from(5u64),
                block_number: 42,
                confirmations: 3,
            }),
            ..Default::default()
        };
        let mut out = Vec::new();
        write_csv(&mut out, &[&record]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let row = text.lines().nth(1).unwrap();
        // Unparsable timestamp leaves time_utc empty; contract creation leaves `to` empty
        assert!(row.starts_with("0x01,garbage,,"));
        assert!(row.ends_with(",,5,42,3"));
    }

    #[test]
    fn test_write_csv_empty_projection() {
        let mut out = Vec::new();
        assert_eq!(write_csv(&mut out, &[]).unwrap(), 0);
    }
}
