use crate::error::ConfigError;
use crate::types::AccountId;
use anyhow::Result;
use ethers::providers::{Http, Provider};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_APP_NAME: &str = "Hedera Transaction Tracker";
pub const DEFAULT_EVM_CHAIN_ID: u64 = 11155111;
pub const DEFAULT_BLOCKS_TO_SCAN: u64 = 10;
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Hedera network the mirror node belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HederaNetwork {
    #[default]
    Testnet,
    Mainnet,
}

impl HederaNetwork {
    pub const ALL: [HederaNetwork; 2] = [HederaNetwork::Testnet, HederaNetwork::Mainnet];

    pub fn mirror_node_url(&self) -> &'static str {
        match self {
            HederaNetwork::Testnet => "https://testnet.mirrornode.hedera.com",
            HederaNetwork::Mainnet => "https://mainnet-public.mirrornode.hedera.com",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HederaNetwork::Testnet => "Hedera Testnet",
            HederaNetwork::Mainnet => "Hedera Mainnet",
        }
    }

    /// HashScan base for this network
    pub fn explorer_url(&self) -> String {
        format!("https://hashscan.io/{}", self)
    }

    pub fn explorer_transaction_url(&self, transaction_id: &str) -> String {
        format!("{}/transaction/{}", self.explorer_url(), transaction_id)
    }

    pub fn explorer_account_url(&self, account_id: &str) -> String {
        format!("{}/account/{}", self.explorer_url(), account_id)
    }
}

impl fmt::Display for HederaNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HederaNetwork::Testnet => f.write_str("testnet"),
            HederaNetwork::Mainnet => f.write_str("mainnet"),
        }
    }
}

impl FromStr for HederaNetwork {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "testnet" => Ok(HederaNetwork::Testnet),
            "mainnet" => Ok(HederaNetwork::Mainnet),
            other => Err(format!("expected testnet or mainnet, got '{}'", other)),
        }
    }
}

/// A predefined EVM-compatible network with label, chain ID, native token, and default RPC.
#[derive(Clone, Debug)]
pub struct EvmNetwork {
    pub label: &'static str,
    pub chain_id: u64,
    pub native_token: &'static str,
    pub default_rpc: &'static str,
    pub explorer: &'static str,
}

impl EvmNetwork {
    pub const fn new(
        label: &'static str,
        chain_id: u64,
        native_token: &'static str,
        default_rpc: &'static str,
        explorer: &'static str,
    ) -> Self {
        Self {
            label,
            chain_id,
            native_token,
            default_rpc,
            explorer,
        }
    }
}

pub const NETWORKS: &[EvmNetwork] = &[
    EvmNetwork::new("Ethereum", 1, "ETH", "https://ethereum-rpc.publicnode.com", "https://etherscan.io"),
    EvmNetwork::new("Sepolia", 11155111, "ETH", "https://ethereum-sepolia-rpc.publicnode.com", "https://sepolia.etherscan.io"),
    EvmNetwork::new("Holesky", 17000, "ETH", "https://ethereum-holesky-rpc.publicnode.com", "https://holesky.etherscan.io"),
    EvmNetwork::new("Hedera Testnet (EVM)", 296, "HBAR", "https://testnet.hashio.io/api", "https://hashscan.io/testnet"),
    EvmNetwork::new("Hedera Mainnet (EVM)", 295, "HBAR", "https://mainnet.hashio.io/api", "https://hashscan.io/mainnet"),
    EvmNetwork::new("BNB Chain", 56, "BNB", "https://bsc-dataseed.binance.org", "https://bscscan.com"),
];

pub fn find_network_by_chain_id(chain_id: u64) -> Option<&'static EvmNetwork> {
    NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// Get the full URL to view a transaction on the block explorer
pub fn get_tx_explorer_url(chain_id: u64, tx_hash: &str) -> Option<String> {
    find_network_by_chain_id(chain_id).map(|n| format!("{}/tx/{}", n.explorer, tx_hash))
}

/// Check if a chain supports EIP-1559 (Type 2 transactions)
pub fn chain_supports_eip1559(chain_id: u64) -> bool {
    match chain_id {
        // Legacy gas pricing only
        56 | 61 | 295 | 296 => false,
        _ => true,
    }
}

/// Operator credentials for the proxy (`ACCOUNT_ID` / `PRIVATE_KEY`).
#[derive(Clone)]
pub struct OperatorCredentials {
    pub account_id: AccountId,
    key: Vec<u8>,
}

impl OperatorCredentials {
    /// Validate both values. The key is hex (optional `0x`), either a raw
    /// 32-byte key or a DER-encoded one.
    pub fn parse(account_id: &str, private_key: &str) -> std::result::Result<Self, ConfigError> {
        let account_id = account_id.parse::<AccountId>().map_err(|e| ConfigError::Invalid {
            key: "ACCOUNT_ID",
            reason: e.to_string(),
        })?;

        let hex_key = private_key.trim();
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let key = hex::decode(hex_key).map_err(|e| ConfigError::Invalid {
            key: "PRIVATE_KEY",
            reason: format!("not valid hex: {}", e),
        })?;
        let is_der = key.len() > 32 && key.first() == Some(&0x30);
        if key.len() != 32 && !is_der {
            return Err(ConfigError::Invalid {
                key: "PRIVATE_KEY",
                reason: format!("expected a 32-byte or DER-encoded key, got {} bytes", key.len()),
            });
        }

        Ok(Self { account_id, key })
    }

    pub fn key_len(&self) -> usize {
        self.key.len()
    }
}

// Never print key material
impl fmt::Debug for OperatorCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorCredentials")
            .field("account_id", &self.account_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct EvmConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Hex private key for a local signer. A Ledger is used when absent.
    pub private_key: Option<String>,
    pub blocks_to_scan: u64,
}

impl EvmConfig {
    pub fn network_label(&self) -> &str {
        find_network_by_chain_id(self.chain_id)
            .map(|n| n.label)
            .unwrap_or("Unknown")
    }

    pub fn native_token(&self) -> &str {
        find_network_by_chain_id(self.chain_id)
            .map(|n| n.native_token)
            .unwrap_or("ETH")
    }

    pub fn get_provider(&self, timeout: Duration) -> Result<Arc<Provider<Http>>> {
        let url = Url::parse(&self.rpc_url)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Arc::new(Provider::new(Http::new_with_client(url, client))))
    }
}

impl Default for EvmConfig {
    fn default() -> Self {
        let rpc_url = find_network_by_chain_id(DEFAULT_EVM_CHAIN_ID)
            .map(|n| n.default_rpc.to_string())
            .unwrap_or_else(|| "https://rpc.sepolia.org".to_string());
        Self {
            rpc_url,
            chain_id: DEFAULT_EVM_CHAIN_ID,
            private_key: None,
            blocks_to_scan: DEFAULT_BLOCKS_TO_SCAN,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProxyConfig {
    pub port: u16,
    pub cors_origin: String,
    pub require_operator: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            require_operator: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app_name: String,
    pub network: HederaNetwork,
    pub mirror_node_url: String,
    pub request_timeout: Duration,
    pub proxy: ProxyConfig,
    pub evm: EvmConfig,
    /// Raw `ACCOUNT_ID` / `PRIVATE_KEY` values, validated lazily.
    pub operator_account_id: Option<String>,
    pub operator_private_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let network = HederaNetwork::default();
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            network,
            mirror_node_url: network.mirror_node_url().to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            proxy: ProxyConfig::default(),
            evm: EvmConfig::default(),
            operator_account_id: None,
            operator_private_key: None,
        }
    }
}

fn parse_var<T>(key: &'static str, value: Option<String>) -> std::result::Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        None => Ok(None),
        Some(v) => v.trim().parse::<T>().map(Some).map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

fn parse_bool(key: &'static str, value: Option<String>) -> std::result::Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => Err(ConfigError::Invalid {
                key,
                reason: format!("expected a boolean, got '{}'", other),
            }),
        },
    }
}

impl Config {
    /// Load from the process environment (call `dotenvy::dotenv()` first).
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let network: HederaNetwork = parse_var("NETWORK", get("NETWORK"))?.unwrap_or_default();
        let mirror_node_url = match get("MIRROR_NODE_URL") {
            Some(url) => {
                Url::parse(url.trim()).map_err(|e| ConfigError::Invalid {
                    key: "MIRROR_NODE_URL",
                    reason: e.to_string(),
                })?;
                url.trim().trim_end_matches('/').to_string()
            }
            None => network.mirror_node_url().to_string(),
        };

        let timeout_secs: u64 = parse_var("REQUEST_TIMEOUT_SECS", get("REQUEST_TIMEOUT_SECS"))?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "REQUEST_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let proxy = ProxyConfig {
            port: parse_var("PORT", get("PORT"))?.unwrap_or(DEFAULT_PORT),
            cors_origin: get("CORS_ORIGIN").unwrap_or(defaults.proxy.cors_origin),
            require_operator: parse_bool("REQUIRE_OPERATOR", get("REQUIRE_OPERATOR"))?,
        };

        let chain_id: u64 = parse_var("ETH_CHAIN_ID", get("ETH_CHAIN_ID"))?.unwrap_or(DEFAULT_EVM_CHAIN_ID);
        let rpc_url = match get("ETH_RPC_URL") {
            Some(url) => url,
            None => find_network_by_chain_id(chain_id)
                .map(|n| n.default_rpc.to_string())
                .ok_or(ConfigError::Missing("ETH_RPC_URL"))?,
        };
        let evm = EvmConfig {
            rpc_url,
            chain_id,
            private_key: get("ETH_PRIVATE_KEY"),
            blocks_to_scan: parse_var("ETH_BLOCKS_TO_SCAN", get("ETH_BLOCKS_TO_SCAN"))?
                .unwrap_or(DEFAULT_BLOCKS_TO_SCAN)
                .max(1),
        };

        Ok(Self {
            app_name: get("APP_NAME").unwrap_or(defaults.app_name),
            network,
            mirror_node_url,
            request_timeout: Duration::from_secs(timeout_secs),
            proxy,
            evm,
            operator_account_id: get("ACCOUNT_ID"),
            operator_private_key: get("PRIVATE_KEY"),
        })
    }

    /// Validated operator credentials, if both values are set.
    pub fn operator(&self) -> std::result::Result<Option<OperatorCredentials>, ConfigError> {
        match (&self.operator_account_id, &self.operator_private_key) {
            (Some(id), Some(key)) => OperatorCredentials::parse(id, key).map(Some),
            (None, None) => Ok(None),
            (None, Some(_)) => Err(ConfigError::Missing("ACCOUNT_ID")),
            (Some(_), None) => Err(ConfigError::Missing("PRIVATE_KEY")),
        }
    }

    /// Operator credentials that must be present, for `--require-operator`.
    pub fn require_operator(&self) -> std::result::Result<OperatorCredentials, ConfigError> {
        self.operator()?.ok_or(ConfigError::Missing("ACCOUNT_ID"))
    }

    /// Switch to another Hedera network, resetting the mirror URL to its default.
    pub fn with_network(mut self, network: HederaNetwork) -> Self {
        self.network = network;
        self.mirror_node_url = network.mirror_node_url().to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const RAW_KEY: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    // ==================== Config::from_lookup tests ====================

    #[test]
    fn test_defaults_when_environment_empty() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.network, HederaNetwork::Testnet);
        assert_eq!(config.mirror_node_url, "https://testnet.mirrornode.hedera.com");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.proxy.port, 3000);
        assert_eq!(config.proxy.cors_origin, "http://localhost:5173");
        assert!(!config.proxy.require_operator);
        assert_eq!(config.app_name, "Hedera Transaction Tracker");
        assert_eq!(config.evm.chain_id, 11155111);
        assert_eq!(config.evm.blocks_to_scan, 10);
        assert!(config.evm.private_key.is_none());
    }

    #[test]
    fn test_mainnet_selects_public_mirror() {
        let config = Config::from_lookup(lookup(&[("NETWORK", "mainnet")])).unwrap();
        assert_eq!(config.mirror_node_url, "https://mainnet-public.mirrornode.hedera.com");
    }

    #[test]
    fn test_mirror_url_override_trims_trailing_slash() {
        let config =
            Config::from_lookup(lookup(&[("MIRROR_NODE_URL", "http://localhost:5551/")])).unwrap();
        assert_eq!(config.mirror_node_url, "http://localhost:5551");
    }

    #[test]
    fn test_invalid_values_are_reported_with_key() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

        let err = Config::from_lookup(lookup(&[("NETWORK", "previewnet")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "NETWORK", .. }));

        let err = Config::from_lookup(lookup(&[("REQUEST_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "REQUEST_TIMEOUT_SECS", .. }));

        let err = Config::from_lookup(lookup(&[("REQUIRE_OPERATOR", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "REQUIRE_OPERATOR", .. }));
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = Config::from_lookup(lookup(&[("PORT", ""), ("ACCOUNT_ID", "  ")])).unwrap();
        assert_eq!(config.proxy.port, 3000);
        assert!(config.operator_account_id.is_none());
    }

    #[test]
    fn test_unknown_chain_requires_rpc_url() {
        let err = Config::from_lookup(lookup(&[("ETH_CHAIN_ID", "31337")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("ETH_RPC_URL"));

        let config = Config::from_lookup(lookup(&[
            ("ETH_CHAIN_ID", "31337"),
            ("ETH_RPC_URL", "http://127.0.0.1:8545"),
        ]))
        .unwrap();
        assert_eq!(config.evm.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.evm.network_label(), "Unknown");
    }

    // ==================== operator credential tests ====================

    #[test]
    fn test_operator_absent_is_ok() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert!(config.operator().unwrap().is_none());
        assert_eq!(
            config.require_operator().unwrap_err(),
            ConfigError::Missing("ACCOUNT_ID")
        );
    }

    #[test]
    fn test_operator_valid() {
        let config = Config::from_lookup(lookup(&[
            ("ACCOUNT_ID", "0.0.4512"),
            ("PRIVATE_KEY", RAW_KEY),
            ("REQUIRE_OPERATOR", "true"),
        ]))
        .unwrap();
        assert!(config.proxy.require_operator);
        let creds = config.require_operator().unwrap();
        assert_eq!(creds.account_id, AccountId::new(0, 0, 4512));
        assert_eq!(creds.key_len(), 32);
        assert!(!format!("{:?}", creds).contains("1111"));
    }

    #[test]
    fn test_operator_accepts_der_key() {
        let der = "302e020100300506032b657004220420\
                   1111111111111111111111111111111111111111111111111111111111111111";
        assert!(OperatorCredentials::parse("0.0.2", der).is_ok());
    }

    #[test]
    fn test_operator_half_configured_is_missing() {
        let config = Config::from_lookup(lookup(&[("PRIVATE_KEY", RAW_KEY)])).unwrap();
        assert_eq!(config.operator().unwrap_err(), ConfigError::Missing("ACCOUNT_ID"));
    }

    #[test]
    fn test_operator_invalid_values() {
        assert!(matches!(
            OperatorCredentials::parse("4512", RAW_KEY),
            Err(ConfigError::Invalid { key: "ACCOUNT_ID", .. })
        ));
        assert!(matches!(
            OperatorCredentials::parse("0.0.4512", "not-hex"),
            Err(ConfigError::Invalid { key: "PRIVATE_KEY", .. })
        ));
        assert!(matches!(
            OperatorCredentials::parse("0.0.4512", "0xabcd"),
            Err(ConfigError::Invalid { key: "PRIVATE_KEY", .. })
        ));
    }

    // ==================== network table tests ====================

    #[test]
    fn test_hedera_network_urls() {
        assert_eq!(
            HederaNetwork::Testnet.explorer_account_url("0.0.123"),
            "https://hashscan.io/testnet/account/0.0.123"
        );
        assert_eq!(
            HederaNetwork::Mainnet.explorer_transaction_url("0.0.2-1704067190-000000000"),
            "https://hashscan.io/mainnet/transaction/0.0.2-1704067190-000000000"
        );
        // Same explorer as the Hedera EVM entries of the network table
        let evm_testnet = find_network_by_chain_id(296).unwrap();
        assert_eq!(HederaNetwork::Testnet.explorer_url(), evm_testnet.explorer);
        assert_eq!("MAINNET".parse::<HederaNetwork>().unwrap(), HederaNetwork::Mainnet);
    }

    #[test]
    fn test_with_network_resets_mirror_url() {
        let config = Config::default().with_network(HederaNetwork::Mainnet);
        assert_eq!(config.mirror_node_url, HederaNetwork::Mainnet.mirror_node_url());
    }

    #[test]
    fn test_find_network_by_chain_id() {
        assert_eq!(find_network_by_chain_id(11155111).unwrap().label, "Sepolia");
        assert!(find_network_by_chain_id(999999).is_none());
    }

    #[test]
    fn test_get_tx_explorer_url() {
        assert_eq!(
            get_tx_explorer_url(11155111, "0xabc").unwrap(),
            "https://sepolia.etherscan.io/tx/0xabc"
        );
        assert!(get_tx_explorer_url(31337, "0xabc").is_none());
    }

    #[test]
    fn test_chain_supports_eip1559() {
        assert!(chain_supports_eip1559(1));
        assert!(chain_supports_eip1559(11155111));
        assert!(!chain_supports_eip1559(56));
        assert!(!chain_supports_eip1559(296));
        assert!(chain_supports_eip1559(999999));
    }
}
