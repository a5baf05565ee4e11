//! Hedera dApp pairing session.
//!
//! The wallet handshake itself happens outside this crate; the session only
//! records its outcome and scopes mirror queries to paired accounts. It is
//! created with [`PairingSession::init`] and must be closed with
//! [`PairingSession::dispose`] (also done on drop).

use crate::config::{Config, HederaNetwork};
use crate::error::{FetchError, WalletError};
use crate::mirror::MirrorClient;
use crate::types::{AccountId, TransactionRecord};
use chrono::{DateTime, Local};
use rand::RngCore;
use serde::Serialize;
use tracing::info;

/// Shown to the wallet when pairing
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppMetadata {
    pub name: String,
    pub description: String,
    pub icons: Vec<String>,
}

impl AppMetadata {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.app_name.clone(),
            description: "A dashboard for tracking Hedera transactions".to_string(),
            icons: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pairing {
    pub topic: String,
    pub account_ids: Vec<AccountId>,
    pub network: HederaNetwork,
    pub paired_at: DateTime<Local>,
}

pub struct PairingSession {
    metadata: AppMetadata,
    network: HederaNetwork,
    mirror: MirrorClient,
    topic: String,
    pairings: Vec<Pairing>,
    active: bool,
}

fn new_topic() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl PairingSession {
    pub fn init(config: &Config) -> Result<Self, FetchError> {
        let session = Self {
            metadata: AppMetadata::from_config(config),
            network: config.network,
            mirror: MirrorClient::from_config(config)?,
            topic: new_topic(),
            pairings: Vec::new(),
            active: true,
        };
        info!(
            "Pairing session {} opened for '{}' on {}",
            session.topic, session.metadata.name, session.network
        );
        Ok(session)
    }

    pub fn metadata(&self) -> &AppMetadata {
        &self.metadata
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn network(&self) -> HederaNetwork {
        self.network
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pairings(&self) -> &[Pairing] {
        &self.pairings
    }

    /// Every paired account, deduplicated, in pairing order.
    pub fn paired_accounts(&self) -> Vec<AccountId> {
        let mut accounts: Vec<AccountId> = Vec::new();
        for id in self.pairings.iter().flat_map(|p| p.account_ids.iter()) {
            if !accounts.contains(id) {
                accounts.push(*id);
            }
        }
        accounts
    }

    /// Record a completed pairing for `account_id`.
    pub fn record_pairing(&mut self, account_id: &str) -> Result<&Pairing, WalletError> {
        if !self.active {
            return Err(WalletError::Unavailable("Pairing session is closed".to_string()));
        }
        if account_id.trim().is_empty() {
            return Err(WalletError::Validation("Account ID is required".to_string()));
        }
        let id: AccountId = account_id
            .parse()
            .map_err(|e: crate::types::InvalidAccountId| WalletError::Validation(e.to_string()))?;

        self.pairings.push(Pairing {
            topic: self.topic.clone(),
            account_ids: vec![id],
            network: self.network,
            paired_at: Local::now(),
        });
        info!("Paired account {}", id);
        Ok(&self.pairings[self.pairings.len() - 1])
    }

    /// Forget every pairing that includes `account_id`.
    pub fn unpair(&mut self, account_id: &AccountId) {
        let before = self.pairings.len();
        self.pairings.retain(|p| !p.account_ids.contains(account_id));
        if self.pairings.len() != before {
            info!("Unpaired account {}", account_id);
        }
    }

    /// Mirror client for account-scoped jobs, if the session is open.
    pub fn mirror(&self) -> Option<MirrorClient> {
        self.active.then(|| self.mirror.clone())
    }

    /// Newest 100 transactions of `account_id`.
    pub async fn account_transactions(&self, account_id: &str) -> Result<Vec<TransactionRecord>, FetchError> {
        if !self.active {
            return Err(FetchError::Validation("Pairing session is closed".to_string()));
        }
        self.mirror.account_transactions(account_id).await
    }

    /// Drop all pairings and close the session. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.active {
            self.active = false;
            self.pairings.clear();
            info!("Pairing session {} disposed", self.topic);
        }
    }
}

impl Drop for PairingSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
