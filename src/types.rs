//! Common types shared across modules.

use crate::error::FetchError;
use ethers::types::{Address, TxHash, U256};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// One observed ledger transaction, normalized from either feed source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub entity_id: Option<String>,
    /// Ordering key. Mirror-node `seconds.nanos`, or unix seconds for EVM blocks.
    pub consensus_timestamp: Option<String>,
    /// Charged fee in tinybars (wei for EVM). `None` is "unknown", not zero.
    pub charged_fee: Option<u64>,
    pub max_fee: Option<u64>,
    pub transaction_id: Option<String>,
    /// Transaction type as reported by the mirror node (e.g. `CRYPTOTRANSFER`).
    pub name: Option<String>,
    pub result: Option<String>,
    #[serde(skip)]
    pub evm: Option<EvmDetails>,
}

impl TransactionRecord {
    /// Stable list key: the timestamp when present, otherwise the batch position.
    pub fn list_key(&self, index: usize) -> String {
        match &self.consensus_timestamp {
            Some(ts) => ts.clone(),
            None => format!("#{}", index),
        }
    }
}

/// Extra fields carried by records produced by the EVM block scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmDetails {
    pub hash: TxHash,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub block_number: u64,
    pub confirmations: u64,
}

/// A transaction as returned by the mirror node. Unlisted fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorTransaction {
    #[serde(default, deserialize_with = "de_opt_text")]
    pub entity_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub consensus_timestamp: Option<String>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub charged_tx_fee: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub max_fee: Option<u64>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

/// Envelope of `GET /api/v1/transactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorTransactionsResponse {
    pub transactions: Vec<MirrorTransaction>,
}

impl From<MirrorTransaction> for TransactionRecord {
    fn from(tx: MirrorTransaction) -> Self {
        Self {
            entity_id: tx.entity_id,
            consensus_timestamp: tx.consensus_timestamp,
            charged_fee: tx.charged_tx_fee,
            max_fee: tx.max_fee,
            transaction_id: tx.transaction_id,
            name: tx.name,
            result: tx.result,
            evm: None,
        }
    }
}

/// Decode a mirror-node response body into records, preserving source order.
pub fn parse_mirror_body(body: &serde_json::Value) -> Result<Vec<TransactionRecord>, FetchError> {
    let response = MirrorTransactionsResponse::deserialize(body)
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
    Ok(response.transactions.into_iter().map(Into::into).collect())
}

/// Accept an amount as a JSON number, a decimal string, or null.
fn de_opt_amount<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(u64),
        Text(String),
    }

    match Option::<Amount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Amount::Number(n)) => Ok(Some(n)),
        Some(Amount::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<u64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid amount '{}'", s)))
        }
    }
}

/// Accept an identifier as a JSON string or number, stored as text.
fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Text>::deserialize(deserializer)?.map(|t| match t {
        Text::Text(s) => s,
        Text::Number(n) => n.to_string(),
    }))
}

/// Hedera entity id in `shard.realm.num` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl AccountId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

/// Error returned when an account id is not `shard.realm.num`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid account id '{0}': expected shard.realm.num")]
pub struct InvalidAccountId(pub String);

impl FromStr for AccountId {
    type Err = InvalidAccountId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() != 3 {
            return Err(InvalidAccountId(s.to_string()));
        }
        let parse = |p: &str| p.parse::<u64>().map_err(|_| InvalidAccountId(s.to_string()));
        Ok(AccountId {
            shard: parse(parts[0])?,
            realm: parse(parts[1])?,
            num: parse(parts[2])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_mirror_body_preserves_order_and_fields() {
        let body = json!({
            "transactions": [
                {
                    "entity_id": "0.0.123",
                    "consensus_timestamp": "1704067200.000000001",
                    "charged_tx_fee": 2000000,
                    "max_fee": "100000000",
                    "transaction_id": "0.0.2-1704067190-000000000",
                    "name": "CRYPTOTRANSFER",
                    "result": "SUCCESS",
                    "memo_base64": ""
                },
                {
                    "entity_id": null,
                    "consensus_timestamp": "1704067100.000000000",
                    "charged_tx_fee": 0
                }
            ],
            "links": { "next": null }
        });

        let records = parse_mirror_body(&body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entity_id.as_deref(), Some("0.0.123"));
        assert_eq!(records[0].charged_fee, Some(2_000_000));
        assert_eq!(records[0].max_fee, Some(100_000_000));
        assert_eq!(records[0].name.as_deref(), Some("CRYPTOTRANSFER"));
        assert_eq!(records[1].entity_id, None);
        // A genuine zero fee stays distinct from an absent one
        assert_eq!(records[1].charged_fee, Some(0));
        assert_eq!(records[1].max_fee, None);
    }

    #[test]
    fn test_parse_mirror_body_missing_transactions_is_malformed() {
        let body = json!({ "links": {} });
        let err = parse_mirror_body(&body).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_mirror_body_rejects_garbage_fee() {
        let body = json!({ "transactions": [ { "charged_tx_fee": "lots" } ] });
        assert!(matches!(
            parse_mirror_body(&body),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_mirror_body_accepts_numeric_ids() {
        let body = json!({
            "transactions": [
                { "entity_id": 123, "charged_tx_fee": 10 },
                { "consensus_timestamp": 1704067300, "charged_tx_fee": 20 },
                { "consensus_timestamp": 1704067300.5 }
            ]
        });

        let records = parse_mirror_body(&body).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].entity_id.as_deref(), Some("123"));
        assert_eq!(records[1].consensus_timestamp.as_deref(), Some("1704067300"));
        assert_eq!(records[2].consensus_timestamp.as_deref(), Some("1704067300.5"));

        // Numeric ids take part in the substring search like text ones
        let filter = crate::filter::FilterState::new("123", crate::filter::FilterMode::All);
        assert_eq!(crate::filter::project(&records, &filter).len(), 1);
    }

    #[test]
    fn test_list_key_falls_back_to_index() {
        let record = TransactionRecord::default();
        assert_eq!(record.list_key(4), "#4");
        let record = TransactionRecord {
            consensus_timestamp: Some("1.2".to_string()),
            ..Default::default()
        };
        assert_eq!(record.list_key(4), "1.2");
    }

    #[test]
    fn test_account_id_parse_and_display() {
        let id: AccountId = "0.0.4512".parse().unwrap();
        assert_eq!(id, AccountId::new(0, 0, 4512));
        assert_eq!(id.to_string(), "0.0.4512");
        assert_eq!(" 1.2.3 ".parse::<AccountId>().unwrap(), AccountId::new(1, 2, 3));
    }

    #[test]
    fn test_account_id_rejects_malformed() {
        assert!("".parse::<AccountId>().is_err());
        assert!("0.0".parse::<AccountId>().is_err());
        assert!("0.0.x".parse::<AccountId>().is_err());
        assert!("0.0.1.2".parse::<AccountId>().is_err());
    }
}
