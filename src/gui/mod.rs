//! Desktop dashboard built with egui/eframe.
//!
//! - `app` - `GuiApp`, per-feed state, background jobs, and the frame loop
//! - `async_job` - polling of worker-thread results
//! - `notifications` - toast and history
//! - `theme` - colors and styled widget factories
//! - `views` - Hedera, Ethereum and Settings screens
//! - `widgets` - filter bar, stat cards, rows
//!
//! ```no_run
//! use hedera_tracker::config::Config;
//! use hedera_tracker::gui;
//!
//! gui::launch(Config::default()).expect("Failed to launch GUI");
//! ```

mod app;
pub mod async_job;
pub mod notifications;
pub mod theme;
pub mod views;
pub mod widgets;

pub use app::{launch, should_auto_refresh, GuiApp, GuiSection};
pub use async_job::AsyncJob;
pub use notifications::{NotificationEntry, NotificationKind, Notifications};
pub use theme::{configure_style, AppTheme};
