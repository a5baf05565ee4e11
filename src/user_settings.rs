use crate::config::{find_network_by_chain_id, Config, HederaNetwork, DEFAULT_BLOCKS_TO_SCAN};
use crate::filter::FilterMode;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

fn default_auto_refresh_secs() -> u64 {
    0 // Disabled
}

fn default_blocks_to_scan() -> u64 {
    DEFAULT_BLOCKS_TO_SCAN
}

fn default_ledger_hd_path() -> String {
    crate::wallet::DEFAULT_HD_PATH.to_string()
}

/// User settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Hedera network; `None` keeps whatever the environment selected
    #[serde(default)]
    pub hedera_network: Option<HederaNetwork>,
    /// Seconds between automatic refreshes (0 disables)
    #[serde(default = "default_auto_refresh_secs")]
    pub auto_refresh_secs: u64,
    /// Selected EVM chain; `None` keeps the environment's chain
    #[serde(default)]
    pub evm_chain_id: Option<u64>,
    /// Custom RPC overrides per chain ID
    #[serde(default)]
    pub custom_rpcs: HashMap<u64, String>,
    #[serde(default = "default_blocks_to_scan")]
    pub blocks_to_scan: u64,
    /// Derivation path used when signing with a Ledger
    #[serde(default = "default_ledger_hd_path")]
    pub ledger_hd_path: String,
    /// Last fee band picked in the filter
    #[serde(default)]
    pub default_filter_mode: FilterMode,
    /// Account ids recorded by earlier pairings
    #[serde(default)]
    pub paired_accounts: Vec<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            hedera_network: None,
            auto_refresh_secs: default_auto_refresh_secs(),
            evm_chain_id: None,
            custom_rpcs: HashMap::new(),
            blocks_to_scan: default_blocks_to_scan(),
            ledger_hd_path: default_ledger_hd_path(),
            default_filter_mode: FilterMode::default(),
            paired_accounts: Vec::new(),
        }
    }
}

impl UserSettings {
    fn settings_path() -> PathBuf {
        crate::activity_log::app_data_dir().join(SETTINGS_FILE)
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => {
                        tracing::info!("Loaded settings from {:?}", path);
                        return settings;
                    }
                    Err(e) => tracing::warn!("Failed to parse settings file: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read settings file: {}", e),
            }
        }
        tracing::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }

    pub fn settings_path_display() -> String {
        Self::settings_path().display().to_string()
    }

    /// Get custom RPC for a chain, or None if using default
    pub fn get_custom_rpc(&self, chain_id: u64) -> Option<&String> {
        self.custom_rpcs.get(&chain_id).filter(|s| !s.is_empty())
    }

    /// Set custom RPC for a chain (empty string removes the override)
    pub fn set_custom_rpc(&mut self, chain_id: u64, rpc: String) {
        if rpc.trim().is_empty() {
            self.custom_rpcs.remove(&chain_id);
        } else {
            self.custom_rpcs.insert(chain_id, rpc.trim().to_string());
        }
    }

    pub fn add_paired_account(&mut self, account_id: &str) {
        if !self.paired_accounts.iter().any(|a| a == account_id) {
            self.paired_accounts.push(account_id.to_string());
        }
    }

    pub fn remove_paired_account(&mut self, account_id: &str) {
        self.paired_accounts.retain(|a| a != account_id);
    }

    /// Overlay these preferences on the environment configuration.
    pub fn apply_to(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(network) = self.hedera_network {
            if network != config.network {
                config = config.with_network(network);
            }
        }
        if let Some(chain_id) = self.evm_chain_id {
            if chain_id != config.evm.chain_id {
                if let Some(network) = find_network_by_chain_id(chain_id) {
                    config.evm.chain_id = chain_id;
                    config.evm.rpc_url = network.default_rpc.to_string();
                }
            }
        }
        if let Some(rpc) = self.get_custom_rpc(config.evm.chain_id) {
            config.evm.rpc_url = rpc.clone();
        }
        config.evm.blocks_to_scan = self.blocks_to_scan.max(1);
        config
    }
}
