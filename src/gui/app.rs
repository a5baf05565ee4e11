use super::async_job::{take_finished, AsyncJob};
use super::notifications::{fetch_error_message, wallet_error_message, NotificationKind, Notifications};
use super::theme::{configure_style, AppTheme};
use crate::activity_log;
use crate::config::{Config, HederaNetwork};
use crate::error::{FetchError, WalletError};
use crate::evm::EvmFeed;
use crate::export;
use crate::feed::FeedView;
use crate::filter::FilterState;
use crate::mirror::{MirrorClient, Order, TransactionQuery, MAX_LIMIT};
use crate::pairing::PairingSession;
use crate::types::{AccountId, TransactionRecord};
use crate::user_settings::UserSettings;
use crate::utils::short_address;
use crate::wallet::{AccountEvent, WalletProvider, WalletSession, ACCOUNT_POLL_INTERVAL};
use anyhow::{anyhow, Result};
use eframe::{
    egui::{self, RichText},
    App, Frame, NativeOptions,
};
use ethers::types::{Address, TransactionReceipt, TxHash};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::runtime::Builder;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuiSection {
    Hedera,
    Ethereum,
    Settings,
}

pub(crate) struct HederaState {
    pub(crate) feed: FeedView,
    pub(crate) filter: FilterState,
    pub(crate) job: Option<AsyncJob<Vec<TransactionRecord>>>,
    /// Paired account the feed is narrowed to; `None` is the network-wide feed
    pub(crate) scope: Option<AccountId>,
    pub(crate) pairing_input: String,
}

impl HederaState {
    fn new(settings: &UserSettings) -> Self {
        Self {
            feed: FeedView::new(),
            filter: FilterState::new("", settings.default_filter_mode),
            job: None,
            scope: None,
            pairing_input: String::new(),
        }
    }

    /// Drop held records and any pending fetch
    fn reset(&mut self) {
        self.job = None;
        self.feed.clear();
    }
}

pub(crate) struct EthereumState {
    pub(crate) feed: FeedView,
    pub(crate) filter: FilterState,
    pub(crate) fetch_job: Option<AsyncJob<Vec<TransactionRecord>>>,
    pub(crate) session: Option<WalletSession>,
    pub(crate) connect_job: Option<AsyncJob<(WalletProvider, Vec<Address>)>>,
    pub(crate) send_to: String,
    pub(crate) send_amount: String,
    pub(crate) send_job: Option<AsyncJob<TxHash>>,
    pub(crate) confirm_job: Option<AsyncJob<TransactionReceipt>>,
}

impl EthereumState {
    /// EVM records carry no charged fee, so the saved fee band is not applied.
    fn new() -> Self {
        Self {
            feed: FeedView::new(),
            filter: FilterState::default(),
            fetch_job: None,
            session: None,
            connect_job: None,
            send_to: String::new(),
            send_amount: String::new(),
            send_job: None,
            confirm_job: None,
        }
    }

    pub(crate) fn account(&self) -> Option<Address> {
        self.session.as_ref().and_then(|s| s.account())
    }

    pub(crate) fn is_sending(&self) -> bool {
        self.send_job.is_some() || self.confirm_job.is_some()
    }
}

/// Pending values on the settings page
pub(crate) struct SettingsFormState {
    pub(crate) hedera_network: HederaNetwork,
    pub(crate) auto_refresh_secs: u64,
    pub(crate) evm_chain_id: u64,
    pub(crate) custom_rpc: String,
    pub(crate) blocks_to_scan: u64,
    pub(crate) ledger_hd_path: String,
}

impl SettingsFormState {
    fn from_settings(settings: &UserSettings, config: &Config) -> Self {
        Self {
            hedera_network: config.network,
            auto_refresh_secs: settings.auto_refresh_secs,
            evm_chain_id: config.evm.chain_id,
            custom_rpc: settings
                .get_custom_rpc(config.evm.chain_id)
                .cloned()
                .unwrap_or_default(),
            blocks_to_scan: settings.blocks_to_scan,
            ledger_hd_path: settings.ledger_hd_path.clone(),
        }
    }
}

pub(crate) const EMPTY_LOG_TEXT: &str = "No activity yet. Sent transactions and pairings are recorded here.";

pub(crate) struct LogViewState {
    pub(crate) content: String,
    pub(crate) job: Option<AsyncJob<String>>,
    pub(crate) error: Option<String>,
}

impl Default for LogViewState {
    fn default() -> Self {
        Self {
            content: EMPTY_LOG_TEXT.to_string(),
            job: None,
            error: None,
        }
    }
}

/// Whether the auto-refresh timer has elapsed. An interval of 0 disables it.
pub fn should_auto_refresh(interval_secs: u64, last: Instant, now: Instant) -> bool {
    interval_secs > 0 && now.saturating_duration_since(last) >= Duration::from_secs(interval_secs)
}

pub struct GuiApp {
    /// Configuration as read from the environment, before user settings
    pub(crate) env_config: Config,
    pub(crate) config: Config,
    pub(crate) user_settings: UserSettings,
    pub(crate) theme: AppTheme,
    pub(crate) section: GuiSection,
    pub(crate) notifications: Notifications,
    pub(crate) show_notifications_popup: bool,
    pub(crate) hedera: HederaState,
    pub(crate) ethereum: EthereumState,
    pub(crate) pairing: Option<PairingSession>,
    pub(crate) settings_form: SettingsFormState,
    pub(crate) log_view: LogViewState,
    pub(crate) last_auto_refresh: Instant,
}

impl GuiApp {
    fn new(env_config: Config, ctx: &egui::Context) -> Self {
        let theme = AppTheme::default();
        configure_style(ctx, &theme);

        let user_settings = UserSettings::load();
        let config = user_settings.apply_to(&env_config);

        let mut app = Self {
            settings_form: SettingsFormState::from_settings(&user_settings, &config),
            hedera: HederaState::new(&user_settings),
            ethereum: EthereumState::new(),
            env_config,
            config,
            user_settings,
            theme,
            section: GuiSection::Hedera,
            notifications: Notifications::default(),
            show_notifications_popup: false,
            pairing: None,
            log_view: LogViewState::default(),
            last_auto_refresh: Instant::now(),
        };
        app.open_pairing_session();
        app.refresh_hedera();
        app
    }

    pub(crate) fn spawn_job<T, FutBuilder, Fut>(&self, builder: FutBuilder) -> AsyncJob<T>
    where
        T: Send + 'static,
        FutBuilder: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<T>> + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(builder()),
                Err(e) => Err(anyhow!("Failed to create async runtime: {}", e)),
            };
            let _ = tx.send(result);
        });
        AsyncJob::new(rx)
    }

    /// Open a pairing session for the current network and restore saved pairings.
    fn open_pairing_session(&mut self) {
        if let Some(mut old) = self.pairing.take() {
            old.dispose();
        }
        match PairingSession::init(&self.config) {
            Ok(mut session) => {
                for account in &self.user_settings.paired_accounts {
                    if let Err(e) = session.record_pairing(account) {
                        tracing::warn!("Skipping saved pairing {}: {}", account, e);
                    }
                }
                self.pairing = Some(session);
            }
            Err(e) => {
                self.notifications
                    .error(format!("Failed to open pairing session: {}", e));
            }
        }
    }

    pub(crate) fn refresh_hedera(&mut self) {
        if !self.hedera.feed.begin_fetch() {
            return;
        }
        self.last_auto_refresh = Instant::now();

        let job = match self.hedera.scope {
            Some(account) => match self.pairing.as_ref().and_then(|p| p.mirror()) {
                Some(client) => {
                    tracing::info!("Fetching transactions for paired account {}", account);
                    self.spawn_job(move || async move {
                        Ok(client.account_transactions(&account.to_string()).await?)
                    })
                }
                None => {
                    let err = FetchError::Validation("Pairing session is closed".to_string());
                    self.notifications.error(fetch_error_message(&err));
                    self.hedera.feed.apply_fetch(Err(err));
                    return;
                }
            },
            None => match MirrorClient::from_config(&self.config) {
                Ok(client) => {
                    tracing::info!("Fetching latest transactions from {}", client.base_url());
                    let query = TransactionQuery {
                        account_id: None,
                        limit: Some(MAX_LIMIT),
                        order: Some(Order::Desc),
                    };
                    self.spawn_job(move || async move { Ok(client.fetch(&query).await?) })
                }
                Err(e) => {
                    self.notifications.error(fetch_error_message(&e));
                    self.hedera.feed.apply_fetch(Err(e));
                    return;
                }
            },
        };
        self.hedera.job = Some(job);
    }

    pub(crate) fn refresh_ethereum(&mut self) {
        let Some(account) = self.ethereum.account() else {
            return;
        };
        if !self.ethereum.feed.begin_fetch() {
            return;
        }
        match EvmFeed::from_config(&self.config) {
            Ok(feed) => {
                tracing::info!("Scanning {} for {:?}", self.config.evm.network_label(), account);
                self.ethereum.fetch_job = Some(self.spawn_job(move || async move { Ok(feed.fetch_for(account).await?) }));
            }
            Err(e) => {
                self.notifications.error(fetch_error_message(&e));
                self.ethereum.feed.apply_fetch(Err(e));
            }
        }
    }

    /// Narrow the Hedera feed to one paired account, or back to the whole network.
    pub(crate) fn set_hedera_scope(&mut self, scope: Option<AccountId>) {
        if self.hedera.scope == scope {
            return;
        }
        self.hedera.scope = scope;
        self.hedera.reset();
        self.refresh_hedera();
    }

    pub(crate) fn pair_account(&mut self) {
        let input = self.hedera.pairing_input.trim().to_string();
        let Some(session) = self.pairing.as_mut() else {
            self.notifications.error("Pairing session is not available");
            return;
        };
        match session.record_pairing(&input) {
            Ok(pairing) => {
                let network = pairing.network;
                let accounts: Vec<String> = pairing.account_ids.iter().map(|a| a.to_string()).collect();
                for account in &accounts {
                    self.user_settings.add_paired_account(account);
                }
                if let Err(e) = self.user_settings.save() {
                    self.notifications.error(format!("Failed to save settings: {}", e));
                }
                if let Err(e) = activity_log::append_log("Pairing", network.label(), accounts.join(", ")) {
                    tracing::warn!("Failed to write activity log: {}", e);
                }
                self.hedera.pairing_input.clear();
                self.notifications
                    .success(format!("Paired account {}", accounts.join(", ")));
            }
            Err(e) => self.notifications.error(wallet_error_message(&e)),
        }
    }

    pub(crate) fn unpair_account(&mut self, account: AccountId) {
        if let Some(session) = self.pairing.as_mut() {
            session.unpair(&account);
        }
        self.user_settings.remove_paired_account(&account.to_string());
        if let Err(e) = self.user_settings.save() {
            self.notifications.error(format!("Failed to save settings: {}", e));
        }
        self.notifications.info(format!("Unpaired account {}", account));
        if self.hedera.scope == Some(account) {
            self.set_hedera_scope(None);
        }
    }

    pub(crate) fn connect_wallet(&mut self) {
        if self.ethereum.connect_job.is_some() {
            return;
        }
        let hd_path = self.user_settings.ledger_hd_path.clone();
        let provider = match WalletProvider::from_config(&self.config, Some(&hd_path)) {
            Ok(provider) => provider,
            Err(e) => {
                self.notifications.error(wallet_error_message(&e));
                return;
            }
        };
        if provider.is_ledger() {
            self.notifications.info("Connecting to Ledger. Unlock it and open the Ethereum app.");
        }
        self.ethereum.connect_job = Some(self.spawn_job(move || async move {
            let accounts = provider.request_accounts().await?;
            Ok((provider, accounts))
        }));
    }

    /// Dispose the wallet session and forget everything fetched for it.
    pub(crate) fn logout_wallet(&mut self) {
        if let Some(mut session) = self.ethereum.session.take() {
            session.dispose();
        }
        self.ethereum.fetch_job = None;
        self.ethereum.send_job = None;
        self.ethereum.confirm_job = None;
        self.ethereum.feed.clear();
        self.notifications.info("Wallet disconnected");
    }

    pub(crate) fn send_transaction(&mut self) {
        if self.ethereum.is_sending() {
            return;
        }
        let Some(session) = self.ethereum.session.as_ref() else {
            self.notifications.error("Connect a wallet first");
            return;
        };
        let provider = session.provider().clone();
        let to = self.ethereum.send_to.clone();
        let amount = self.ethereum.send_amount.clone();
        if provider.is_ledger() {
            self.notifications.info("Confirm the transaction on your Ledger");
        }
        self.ethereum.send_job = Some(self.spawn_job(move || async move {
            Ok(provider.send_transaction(&to, &amount).await?)
        }));
    }

    fn on_wallet_connected(&mut self, provider: WalletProvider, accounts: Vec<Address>) {
        if let Some(mut old) = self.ethereum.session.take() {
            old.dispose();
        }
        let mut session = WalletSession::new(provider);
        match session.attach(accounts, ACCOUNT_POLL_INTERVAL) {
            Ok(account) => {
                self.notifications
                    .success(format!("Wallet connected: {}", short_address(&account)));
                self.ethereum.session = Some(session);
                self.ethereum.feed.clear();
                self.refresh_ethereum();
            }
            Err(e) => self.notifications.error(wallet_error_message(&e)),
        }
    }

    fn on_transaction_sent(&mut self, hash: TxHash) {
        self.notifications.success(format!("Transaction sent: {:?}", hash));
        let details = format!(
            "{} {} to {} tx {:?}",
            self.ethereum.send_amount.trim(),
            self.config.evm.native_token(),
            self.ethereum.send_to.trim(),
            hash
        );
        if let Err(e) = activity_log::append_log("Send", self.config.evm.network_label(), details) {
            tracing::warn!("Failed to write activity log: {}", e);
        }
        self.ethereum.send_to.clear();
        self.ethereum.send_amount.clear();

        if let Some(session) = self.ethereum.session.as_ref() {
            let provider = session.provider().clone();
            self.ethereum.confirm_job = Some(self.spawn_job(move || async move { Ok(provider.wait(hash).await?) }));
        }
    }

    fn poll_jobs(&mut self) {
        if let Some(result) = take_finished(&mut self.hedera.job) {
            let result = result.map_err(FetchError::from_job_error);
            if let Err(e) = &result {
                self.notifications.error(fetch_error_message(e));
            }
            self.hedera.feed.apply_fetch(result);
        }

        if let Some(result) = take_finished(&mut self.ethereum.fetch_job) {
            let result = result.map_err(FetchError::from_job_error);
            if let Err(e) = &result {
                self.notifications.error(fetch_error_message(e));
            }
            self.ethereum.feed.apply_fetch(result);
        }

        if let Some(result) = take_finished(&mut self.ethereum.connect_job) {
            match result {
                Ok((provider, accounts)) => self.on_wallet_connected(provider, accounts),
                Err(e) => self
                    .notifications
                    .error(wallet_error_message(&WalletError::from_job_error(e))),
            }
        }

        if let Some(result) = take_finished(&mut self.ethereum.send_job) {
            match result {
                Ok(hash) => self.on_transaction_sent(hash),
                Err(e) => self
                    .notifications
                    .error(wallet_error_message(&WalletError::from_job_error(e))),
            }
        }

        if let Some(result) = take_finished(&mut self.ethereum.confirm_job) {
            match result {
                Ok(receipt) => {
                    let block = receipt
                        .block_number
                        .map(|b| format!(" in block {}", b))
                        .unwrap_or_default();
                    self.notifications
                        .success(format!("Transaction confirmed{}", block));
                    self.refresh_ethereum();
                }
                Err(e) => self
                    .notifications
                    .error(wallet_error_message(&WalletError::from_job_error(e))),
            }
        }

        let event = self.ethereum.session.as_mut().and_then(|s| s.poll());
        match event {
            Some(AccountEvent::Switched(account)) => {
                self.notifications
                    .info(format!("Wallet account changed to {}", short_address(&account)));
                self.ethereum.fetch_job = None;
                self.ethereum.feed.clear();
                self.refresh_ethereum();
            }
            Some(AccountEvent::Disconnected) => self.logout_wallet(),
            None => {}
        }

        if let Some(result) = take_finished(&mut self.log_view.job) {
            match result {
                Ok(content) => {
                    self.log_view.content = content;
                    self.log_view.error = None;
                }
                Err(e) => self.log_view.error = Some(e.to_string()),
            }
        }
    }

    fn poll_auto_refresh(&mut self) {
        let now = Instant::now();
        if should_auto_refresh(self.user_settings.auto_refresh_secs, self.last_auto_refresh, now) {
            self.last_auto_refresh = now;
            tracing::debug!("Auto-refresh");
            self.refresh_hedera();
            self.refresh_ethereum();
        }
    }

    pub(crate) fn refresh_logs(&mut self) {
        if self.log_view.job.is_none() {
            self.log_view.job = Some(self.spawn_job(|| async move {
                match activity_log::read_log() {
                    Ok(content) if content.is_empty() => Ok(EMPTY_LOG_TEXT.to_string()),
                    Ok(content) => Ok(content),
                    Err(e) => Err(anyhow!("Failed to read log file: {}", e)),
                }
            }));
        }
    }

    /// Ask for a destination and write the current projection of a feed as CSV.
    pub(crate) fn export_feed(&mut self, section: GuiSection) {
        let (feed, filter) = match section {
            GuiSection::Ethereum => (&self.ethereum.feed, &self.ethereum.filter),
            _ => (&self.hedera.feed, &self.hedera.filter),
        };
        let rows = feed.project(filter);
        if rows.is_empty() {
            self.notifications.info("Nothing to export");
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV files", &["csv"])
            .set_file_name("transactions.csv")
            .save_file()
        else {
            return;
        };
        let network = match section {
            GuiSection::Ethereum => self.config.evm.network_label().to_string(),
            _ => self.config.network.label().to_string(),
        };
        match export::export_to_path(&path, &rows) {
            Ok(count) => {
                let details = format!("{} rows to {}", count, path.display());
                if let Err(e) = activity_log::append_log("Export", &network, &details) {
                    tracing::warn!("Failed to write activity log: {}", e);
                }
                self.notifications
                    .success(format!("Exported {} transactions to {}", count, path.display()));
            }
            Err(e) => self.notifications.error(format!("Export failed: {}", e)),
        }
    }

    /// Persist the settings form and rebuild whatever depends on it.
    pub(crate) fn apply_settings(&mut self) {
        let form = &self.settings_form;
        self.user_settings.hedera_network = Some(form.hedera_network);
        self.user_settings.auto_refresh_secs = form.auto_refresh_secs;
        self.user_settings.evm_chain_id = Some(form.evm_chain_id);
        self.user_settings
            .set_custom_rpc(form.evm_chain_id, form.custom_rpc.clone());
        self.user_settings.blocks_to_scan = form.blocks_to_scan.max(1);
        self.user_settings.ledger_hd_path = form.ledger_hd_path.trim().to_string();
        self.user_settings.default_filter_mode = self.hedera.filter.mode;

        if let Err(e) = self.user_settings.save() {
            self.notifications.error(format!("Failed to save settings: {}", e));
            return;
        }

        let previous = std::mem::replace(&mut self.config, self.user_settings.apply_to(&self.env_config));
        if previous.mirror_node_url != self.config.mirror_node_url || previous.network != self.config.network {
            self.hedera.scope = None;
            self.hedera.reset();
            self.open_pairing_session();
            self.refresh_hedera();
        }
        if previous.evm.chain_id != self.config.evm.chain_id || previous.evm.rpc_url != self.config.evm.rpc_url {
            if self.ethereum.session.is_some() {
                self.logout_wallet();
            }
        } else if previous.evm.blocks_to_scan != self.config.evm.blocks_to_scan {
            self.refresh_ethereum();
        }
        self.notifications.success("Settings saved");
    }

    /// Close the wallet watcher and the pairing session.
    fn dispose_sessions(&mut self) {
        if let Some(mut session) = self.ethereum.session.take() {
            session.dispose();
        }
        if let Some(mut pairing) = self.pairing.take() {
            pairing.dispose();
        }
    }

    fn render_notification_overlay(&mut self, ctx: &egui::Context) {
        let count = self.notifications.len();
        let latest = self
            .notifications
            .latest()
            .map(|n| (n.kind, n.message.clone()));
        let toast_visible = self.notifications.toast_visible();

        egui::Area::new(egui::Id::new("notification_overlay"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -10.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                self.theme.frame_banner(self.theme.primary).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let icon_color = if count > 0 { self.theme.accent } else { self.theme.text_secondary };
                        if ui
                            .add(
                                egui::Button::new(RichText::new("[!]").strong().color(icon_color))
                                    .fill(egui::Color32::TRANSPARENT)
                                    .stroke(egui::Stroke::NONE),
                            )
                            .on_hover_text("Click to view notification history")
                            .clicked()
                        {
                            self.show_notifications_popup = !self.show_notifications_popup;
                        }

                        if toast_visible {
                            if let Some((kind, message)) = &latest {
                                let color = match kind {
                                    NotificationKind::Error => self.theme.error,
                                    NotificationKind::Success => self.theme.success,
                                    NotificationKind::Info => self.theme.text_primary,
                                };
                                let first_line = message.lines().next().unwrap_or_default();
                                let text = if first_line.chars().count() > 60 {
                                    format!("{}...", first_line.chars().take(60).collect::<String>())
                                } else {
                                    first_line.to_string()
                                };
                                ui.label(RichText::new(text).size(12.0).color(color))
                                    .on_hover_text(message.as_str());
                            }
                        } else if count > 0 {
                            ui.label(RichText::new(count.to_string()).size(10.0).color(self.theme.warning));
                        }
                    });
                });
            });

        if self.show_notifications_popup {
            let mut open = true;
            egui::Window::new("[#] Notification History")
                .open(&mut open)
                .collapsible(false)
                .resizable(true)
                .default_width(450.0)
                .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -50.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(format!("{} notifications", count)).color(self.theme.text_secondary));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.add(self.theme.button_small("Clear")).clicked() {
                                self.notifications.clear();
                            }
                        });
                    });
                    ui.separator();
                    egui::ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .max_height(280.0)
                        .show(ui, |ui| {
                            if self.notifications.is_empty() {
                                ui.label(RichText::new("No notifications yet.").color(self.theme.text_secondary));
                            }
                            for entry in self.notifications.iter() {
                                ui.horizontal_wrapped(|ui| {
                                    ui.label(
                                        RichText::new(format!("[{}]", entry.time_ago()))
                                            .size(11.0)
                                            .color(self.theme.text_secondary),
                                    );
                                    ui.label(RichText::new(entry.kind.prefix()).size(11.0));
                                    ui.label(RichText::new(&entry.message).size(12.0));
                                });
                                ui.add_space(3.0);
                            }
                        });
                });
            self.show_notifications_popup = open;
        }
    }

    fn render_nav(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("nav")
            .resizable(false)
            .default_width(180.0)
            .frame(
                egui::Frame::none()
                    .fill(self.theme.surface)
                    .inner_margin(egui::Margin::symmetric(0.0, self.theme.spacing_md)),
            )
            .show(ctx, |ui| {
                let nav_items = [
                    (GuiSection::Hedera, "Hedera"),
                    (GuiSection::Ethereum, "Ethereum"),
                    (GuiSection::Settings, "Settings"),
                ];
                for (section, label) in nav_items {
                    let selected = self.section == section;
                    ui.horizontal(|ui| {
                        if selected {
                            ui.add_space(2.0);
                            let (rect, _) = ui.allocate_exact_size(egui::vec2(3.0, 20.0), egui::Sense::hover());
                            ui.painter().rect_filled(rect, 0.0, self.theme.primary);
                            ui.add_space(4.0);
                        } else {
                            ui.add_space(9.0);
                        }
                        let color = if selected { self.theme.text_primary } else { self.theme.text_secondary };
                        let response = ui.add(
                            egui::Button::new(RichText::new(label).size(14.0).color(color))
                                .fill(egui::Color32::TRANSPARENT)
                                .stroke(egui::Stroke::NONE),
                        );
                        if response.clicked() && !selected {
                            self.section = section;
                            if section == GuiSection::Settings {
                                self.refresh_logs();
                            }
                        }
                    });
                    ui.add_space(self.theme.spacing_xs);
                }
            });
    }
}

impl App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_jobs();
        self.poll_auto_refresh();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(self.theme.spacing_sm);
            ui.horizontal(|ui| {
                ui.heading(RichText::new(&self.config.app_name).strong().color(self.theme.accent));
                ui.label(
                    RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                        .size(12.0)
                        .color(self.theme.text_secondary),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let wallet = match self.ethereum.account() {
                        Some(account) => format!("[*] {}", short_address(&account)),
                        None => "[ ] No wallet".to_string(),
                    };
                    ui.label(RichText::new(wallet).monospace().color(self.theme.text_secondary));
                    ui.separator();
                    ui.label(RichText::new(self.config.network.label()).color(self.theme.text_primary));
                });
            });
            ui.add_space(self.theme.spacing_sm);
        });

        self.render_notification_overlay(ctx);
        self.render_nav(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match self.section {
                GuiSection::Hedera => self.view_hedera(ui),
                GuiSection::Ethereum => self.view_ethereum(ui),
                GuiSection::Settings => self.view_settings(ui),
            });
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.dispose_sessions();
    }
}

impl Drop for GuiApp {
    fn drop(&mut self) {
        self.dispose_sessions();
    }
}

pub fn launch(config: Config) -> Result<()> {
    let title = config.app_name.clone();
    let app_creator = move |cc: &eframe::CreationContext<'_>| Box::new(GuiApp::new(config, &cc.egui_ctx)) as Box<dyn App>;

    let native_options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([720.0, 480.0]),
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native(&title, native_options, Box::new(app_creator)).map_err(|e| anyhow!("Failed to start GUI: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_refresh_disabled_at_zero() {
        let start = Instant::now();
        assert!(!should_auto_refresh(0, start, start + Duration::from_secs(3600)));
    }

    #[test]
    fn test_auto_refresh_after_interval() {
        let start = Instant::now();
        assert!(!should_auto_refresh(30, start, start + Duration::from_secs(29)));
        assert!(should_auto_refresh(30, start, start + Duration::from_secs(30)));
        // A clock reading before the last refresh never triggers
        assert!(!should_auto_refresh(30, start + Duration::from_secs(60), start));
    }

    #[test]
    fn test_new_states_take_saved_filter_mode() {
        let settings = UserSettings {
            default_filter_mode: crate::filter::FilterMode::LowFee,
            ..Default::default()
        };
        let hedera = HederaState::new(&settings);
        assert_eq!(hedera.filter.mode, crate::filter::FilterMode::LowFee);
        assert!(hedera.filter.query.is_empty());
        assert!(hedera.scope.is_none());

        let ethereum = EthereumState::new();
        assert_eq!(ethereum.filter.mode, crate::filter::FilterMode::All);
        assert!(ethereum.account().is_none());
        assert!(!ethereum.is_sending());
    }

    #[test]
    fn test_settings_form_reflects_config() {
        let settings = UserSettings::default();
        let config = Config::default().with_network(HederaNetwork::Mainnet);
        let form = SettingsFormState::from_settings(&settings, &config);
        assert_eq!(form.hedera_network, HederaNetwork::Mainnet);
        assert_eq!(form.evm_chain_id, config.evm.chain_id);
        assert!(form.custom_rpc.is_empty());
    }
}
