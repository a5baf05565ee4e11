//! Ethereum wallet provider and the GUI-owned wallet session.
//!
//! The provider signs with either a local key or a Ledger. Ledger access is
//! serialized process-wide and transient HID errors are retried.

use crate::config::{chain_supports_eip1559, Config, RECEIPT_TIMEOUT};
use crate::error::WalletError;
use crate::utils::parse_eth_str_to_wei;
use ethers::prelude::*;
use ethers::signers::{HDPath, Ledger};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

const MAX_RETRY_ATTEMPTS: usize = 5;
const RETRY_BASE_DELAY_MS: u64 = 300;

/// Default Ledger Live path for the first account
pub const DEFAULT_HD_PATH: &str = "m/44'/60'/0'/0/0";

/// How often the session re-reads the signer's accounts
pub const ACCOUNT_POLL_INTERVAL: Duration = Duration::from_secs(5);

static LEDGER_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Serializes all Ledger/HID access; concurrent APDU exchanges fail on some platforms.
fn ledger_lock() -> &'static Mutex<()> {
    LEDGER_LOCK.get_or_init(|| Mutex::new(()))
}

/// HID timing or busy errors that may resolve on retry
fn is_transient_error(err_str: &str) -> bool {
    let lower = err_str.to_lowercase();
    lower.contains("overlapped i/o operation")
        || lower.contains("busy")
        || (lower.contains("hidapi") && !lower.contains("no device") && !lower.contains("device not found"))
        || (lower.contains("transport") && lower.contains("error"))
        || lower.contains("i/o error")
}

#[derive(Clone)]
pub enum SignerKind {
    Local(LocalWallet),
    Ledger { hd_path: String },
}

impl std::fmt::Debug for SignerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignerKind::Local(wallet) => write!(f, "Local({:?})", wallet.address()),
            SignerKind::Ledger { hd_path } => write!(f, "Ledger({})", hd_path),
        }
    }
}

/// Cloneable handle to the RPC provider and signer, safe to move into jobs.
#[derive(Clone, Debug)]
pub struct WalletProvider {
    provider: Arc<Provider<Http>>,
    chain_id: u64,
    signer: SignerKind,
    receipt_timeout: Duration,
}

impl WalletProvider {
    pub fn new(provider: Arc<Provider<Http>>, chain_id: u64, signer: SignerKind) -> Self {
        Self {
            provider,
            chain_id,
            signer,
            receipt_timeout: RECEIPT_TIMEOUT,
        }
    }

    /// Local key when `ETH_PRIVATE_KEY` is set, otherwise the Ledger at `hd_path`.
    pub fn from_config(config: &Config, hd_path: Option<&str>) -> Result<Self, WalletError> {
        let provider = config
            .evm
            .get_provider(config.request_timeout)
            .map_err(|e| WalletError::Unavailable(format!("Invalid RPC URL: {}", e)))?;
        let signer = match &config.evm.private_key {
            Some(key) => SignerKind::Local(parse_local_wallet(key)?),
            None => SignerKind::Ledger {
                hd_path: hd_path.unwrap_or(DEFAULT_HD_PATH).to_string(),
            },
        };
        Ok(Self::new(provider, config.evm.chain_id, signer))
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn is_ledger(&self) -> bool {
        matches!(self.signer, SignerKind::Ledger { .. })
    }

    async fn connect_ledger(&self, hd_path: &str) -> Result<Ledger, WalletError> {
        let mut last_err = String::new();
        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            match Ledger::new(HDPath::Other(hd_path.to_string()), self.chain_id).await {
                Ok(ledger) => return Ok(ledger),
                Err(e) => {
                    last_err = e.to_string();
                    if is_transient_error(&last_err) && attempt < MAX_RETRY_ATTEMPTS {
                        warn!("Transient Ledger error (attempt {}): {}, retrying...", attempt, last_err);
                        tokio::time::sleep(Duration::from_millis(RETRY_BASE_DELAY_MS * attempt as u64)).await;
                        continue;
                    }
                    break;
                }
            }
        }
        Err(match WalletError::classify(&last_err) {
            // Any connect failure means there is no usable signer
            WalletError::Network(msg) => WalletError::Unavailable(msg),
            other => other,
        })
    }

    /// Accounts the signer exposes. Always one for both signer kinds.
    pub async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        match &self.signer {
            SignerKind::Local(wallet) => Ok(vec![wallet.address()]),
            SignerKind::Ledger { hd_path } => {
                let _lock = ledger_lock().lock().await;
                let ledger = self.connect_ledger(hd_path).await?;
                Ok(vec![ledger.address()])
            }
        }
    }

    /// Validate, sign and broadcast a plain value transfer.
    pub async fn send_transaction(&self, to: &str, amount: &str) -> Result<TxHash, WalletError> {
        let to = to.trim();
        if to.is_empty() || amount.trim().is_empty() {
            return Err(WalletError::Validation(
                "Please fill in recipient address and amount".to_string(),
            ));
        }
        let to: Address = to
            .parse()
            .map_err(|_| WalletError::Validation(format!("Invalid recipient address: {}", to)))?;
        let value = parse_eth_str_to_wei(amount).map_err(|e| WalletError::Validation(e.to_string()))?;

        let tx: TypedTransaction = if chain_supports_eip1559(self.chain_id) {
            Eip1559TransactionRequest::new()
                .to(to)
                .value(value)
                .chain_id(self.chain_id)
                .into()
        } else {
            TransactionRequest::new()
                .to(to)
                .value(value)
                .chain_id(self.chain_id)
                .into()
        };
        info!("Sending {} wei to {:?} on chain {}", value, to, self.chain_id);

        let hash = match &self.signer {
            SignerKind::Local(wallet) => {
                self.send_with(wallet.clone().with_chain_id(self.chain_id), tx).await?
            }
            SignerKind::Ledger { hd_path } => {
                let _lock = ledger_lock().lock().await;
                let ledger = self.connect_ledger(hd_path).await?;
                self.send_with(ledger, tx).await?
            }
        };
        info!("Transaction sent: {:?}", hash);
        Ok(hash)
    }

    async fn send_with<S>(&self, signer: S, tx: TypedTransaction) -> Result<TxHash, WalletError>
    where
        S: Signer + 'static,
    {
        let client = SignerMiddleware::new((*self.provider).clone(), signer);
        let pending = client
            .send_transaction(tx, None)
            .await
            .map_err(|e| WalletError::classify(e.to_string()))?;
        Ok(pending.tx_hash())
    }

    /// Wait for the receipt, bounded by the receipt timeout.
    pub async fn wait(&self, hash: TxHash) -> Result<TransactionReceipt, WalletError> {
        debug!("Waiting for receipt of {:?}", hash);
        let pending = PendingTransaction::new(hash, self.provider.as_ref());
        match tokio::time::timeout(self.receipt_timeout, pending).await {
            Err(_) => Err(WalletError::Timeout(self.receipt_timeout)),
            Ok(Err(e)) => Err(WalletError::Network(e.to_string())),
            Ok(Ok(None)) => Err(WalletError::Network(format!(
                "Transaction {:?} was dropped from the mempool",
                hash
            ))),
            Ok(Ok(Some(receipt))) => {
                if receipt.status == Some(U64::zero()) {
                    return Err(WalletError::Network(format!("Transaction {:?} reverted", hash)));
                }
                info!("Transaction {:?} confirmed in block {:?}", hash, receipt.block_number);
                Ok(receipt)
            }
        }
    }

    /// Poll the signer's accounts on a worker thread until cancelled.
    ///
    /// Only changes are reported; the first poll is compared against `current`.
    pub fn watch_accounts(&self, current: Vec<Address>, interval: Duration) -> AccountWatcher {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let (update_tx, update_rx) = mpsc::channel();
        let provider = self.clone();

        let handle = std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = update_tx.send(Err(WalletError::Unavailable(e.to_string())));
                    return;
                }
            };
            rt.block_on(async move {
                let mut last = current;
                loop {
                    tokio::select! {
                        _ = &mut cancel_rx => break,
                        _ = tokio::time::sleep(interval) => {}
                    }
                    let accounts = match provider.request_accounts().await {
                        Ok(accounts) => accounts,
                        // A vanished device is an account change to "none"
                        Err(WalletError::Unavailable(_)) => Vec::new(),
                        Err(e) => {
                            debug!("Account poll failed: {}", e);
                            continue;
                        }
                    };
                    if accounts != last {
                        last = accounts.clone();
                        if update_tx.send(Ok(accounts)).is_err() {
                            break;
                        }
                    }
                }
                debug!("Account watcher stopped");
            });
        });

        AccountWatcher {
            cancel: Some(cancel_tx),
            updates: update_rx,
            handle: Some(handle),
        }
    }
}

fn parse_local_wallet(key: &str) -> Result<LocalWallet, WalletError> {
    let key = key.trim();
    key.strip_prefix("0x")
        .unwrap_or(key)
        .parse::<LocalWallet>()
        .map_err(|e| WalletError::Unavailable(format!("Invalid ETH_PRIVATE_KEY: {}", e)))
}

/// Handle to a running account poller. Dropping it cancels the poller.
pub struct AccountWatcher {
    cancel: Option<oneshot::Sender<()>>,
    updates: Receiver<Result<Vec<Address>, WalletError>>,
    handle: Option<JoinHandle<()>>,
}

impl AccountWatcher {
    /// Next reported account change, if any
    pub fn try_next(&self) -> Option<Result<Vec<Address>, WalletError>> {
        match self.updates.try_recv() {
            Ok(update) => Some(update),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// True until the poller thread has exited.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the poller to stop. It exits at its next wake-up; the thread
    /// handle is kept so `is_running` reflects the real exit.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

impl Drop for AccountWatcher {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// What changed when the session drained watcher updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    Switched(Address),
    Disconnected,
}

/// Connected wallet state owned by the Ethereum view.
pub struct WalletSession {
    provider: WalletProvider,
    account: Option<Address>,
    watcher: Option<AccountWatcher>,
}

impl WalletSession {
    pub fn new(provider: WalletProvider) -> Self {
        Self {
            provider,
            account: None,
            watcher: None,
        }
    }

    pub fn provider(&self) -> &WalletProvider {
        &self.provider
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// Adopt the result of `request_accounts` and start watching for changes.
    pub fn attach(&mut self, accounts: Vec<Address>, poll_interval: Duration) -> Result<Address, WalletError> {
        let account = *accounts
            .first()
            .ok_or_else(|| WalletError::Unavailable("Wallet returned no accounts".to_string()))?;
        info!("Wallet connected: {:?}", account);
        self.account = Some(account);
        self.watcher = Some(self.provider.watch_accounts(accounts, poll_interval));
        Ok(account)
    }

    /// Drain watcher updates. Returns the last account event, if any.
    pub fn poll(&mut self) -> Option<AccountEvent> {
        let mut event = None;
        let watcher = self.watcher.as_ref()?;
        while let Some(update) = watcher.try_next() {
            match update {
                Ok(accounts) => match accounts.first() {
                    Some(&account) => {
                        info!("Wallet account changed to {:?}", account);
                        self.account = Some(account);
                        event = Some(AccountEvent::Switched(account));
                    }
                    None => {
                        info!("Wallet disconnected");
                        self.account = None;
                        event = Some(AccountEvent::Disconnected);
                    }
                },
                Err(e) => warn!("Account watcher failed: {}", e),
            }
        }
        if event == Some(AccountEvent::Disconnected) {
            self.dispose();
        }
        event
    }

    /// Stop the watcher and forget the account. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.cancel();
            info!("Wallet session disposed");
        }
        self.account = None;
    }
}

impl Drop for WalletSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test key (anvil account 0)
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn local_provider() -> WalletProvider {
        let provider = Provider::<Http>::try_from("http://127.0.0.1:9").unwrap();
        WalletProvider::new(
            Arc::new(provider),
            11155111,
            SignerKind::Local(parse_local_wallet(TEST_KEY).unwrap()),
        )
    }

    // ==================== error classification tests ====================

    #[test]
    fn test_is_transient_error() {
        assert!(is_transient_error("Overlapped I/O operation is in progress"));
        assert!(is_transient_error("device busy"));
        assert!(is_transient_error("hidapi error: read failed"));
        assert!(!is_transient_error("hidapi error: device not found"));
        assert!(!is_transient_error("user denied"));
    }

    #[test]
    fn test_parse_local_wallet() {
        let wallet = parse_local_wallet(TEST_KEY).unwrap();
        assert_eq!(wallet.address(), TEST_ADDRESS.parse::<Address>().unwrap());
        assert!(matches!(parse_local_wallet("zz"), Err(WalletError::Unavailable(_))));
    }

    // ==================== provider tests ====================

    #[test]
    fn test_request_accounts_local() {
        let accounts = tokio_test::block_on(local_provider().request_accounts()).unwrap();
        assert_eq!(accounts, vec![TEST_ADDRESS.parse::<Address>().unwrap()]);
    }

    #[test]
    fn test_send_requires_recipient_and_amount() {
        let provider = local_provider();
        let err = tokio_test::block_on(provider.send_transaction("", "1")).unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));
        let err = tokio_test::block_on(provider.send_transaction(TEST_ADDRESS, " ")).unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));
    }

    #[test]
    fn test_send_rejects_bad_inputs() {
        let provider = local_provider();
        let err = tokio_test::block_on(provider.send_transaction("0x1234", "1")).unwrap_err();
        assert!(matches!(err, WalletError::Validation(msg) if msg.contains("Invalid recipient")));
        let err = tokio_test::block_on(provider.send_transaction(TEST_ADDRESS, "-1")).unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));
        let err = tokio_test::block_on(provider.send_transaction(TEST_ADDRESS, "lots")).unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));
    }

    #[test]
    fn test_from_config_picks_signer() {
        let mut config = Config::default();
        let provider = WalletProvider::from_config(&config, None).unwrap();
        assert!(provider.is_ledger());

        config.evm.private_key = Some(TEST_KEY.to_string());
        let provider = WalletProvider::from_config(&config, None).unwrap();
        assert!(!provider.is_ledger());
        assert_eq!(provider.chain_id(), 11155111);
    }

    // ==================== session tests ====================

    #[test]
    fn test_attach_requires_an_account() {
        let mut session = WalletSession::new(local_provider());
        let err = session.attach(Vec::new(), ACCOUNT_POLL_INTERVAL).unwrap_err();
        assert!(matches!(err, WalletError::Unavailable(_)));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_attach_and_dispose() {
        let mut session = WalletSession::new(local_provider());
        let address: Address = TEST_ADDRESS.parse().unwrap();
        assert_eq!(session.attach(vec![address], Duration::from_millis(10)).unwrap(), address);
        assert!(session.is_connected());

        // Local signer never changes accounts
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(session.poll(), None);

        session.dispose();
        assert!(!session.is_connected());
        assert_eq!(session.poll(), None);
        session.dispose();
    }

    #[test]
    fn test_watcher_reports_change_from_stale_account() {
        let provider = local_provider();
        let stale = Address::zero();
        let watcher = provider.watch_accounts(vec![stale], Duration::from_millis(10));

        let mut update = None;
        for _ in 0..100 {
            if let Some(u) = watcher.try_next() {
                update = Some(u);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let accounts = update.expect("watcher should report the real account").unwrap();
        assert_eq!(accounts, vec![TEST_ADDRESS.parse::<Address>().unwrap()]);
    }

    #[test]
    fn test_watcher_stops_on_cancel() {
        let provider = local_provider();
        let mut watcher = provider.watch_accounts(Vec::new(), Duration::from_secs(60));
        assert!(watcher.is_running());

        watcher.cancel();
        let mut stopped = false;
        for _ in 0..200 {
            if !watcher.is_running() {
                stopped = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(stopped, "poller thread should exit after cancel");

        // The thread dropped its sender on the way out
        assert!(matches!(watcher.updates.try_recv(), Err(TryRecvError::Disconnected)));
        assert!(watcher.try_next().is_none());
        watcher.cancel();
    }
}
