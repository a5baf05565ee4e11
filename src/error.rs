//! Error taxonomy for feed fetching, wallet calls, and startup configuration.
//!
//! Every error here is caught at the fetcher/wallet boundary and turned into a
//! notification; only [`ConfigError`] for operator credentials is fatal.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single feed fetch (mirror node or EVM scan).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The source could not be reached (DNS, connection refused, TLS, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The transport gave up waiting for the source.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The source answered with a non-success status.
    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    /// The body could not be decoded or lacks an expected field.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request was rejected before it was sent.
    #[error("invalid request: {0}")]
    Validation(String),
}

impl FetchError {
    /// Classify a reqwest failure. `timeout` is the client's configured limit.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else if let Some(status) = err.status() {
            FetchError::Upstream {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            FetchError::MalformedResponse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }

    /// Recover a `FetchError` from a background job result.
    ///
    /// Jobs report `anyhow::Error`; anything that is not already a fetch error
    /// (runtime creation failure, disconnected worker) counts as a network error.
    pub fn from_job_error(err: anyhow::Error) -> Self {
        err.downcast::<FetchError>()
            .unwrap_or_else(|other| FetchError::Network(other.to_string()))
    }
}

/// Failure of a wallet provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No signer is available (Ledger not connected, no key configured).
    #[error("wallet unavailable: {0}")]
    Unavailable(String),

    /// The user declined the prompt on the device.
    #[error("request was rejected in the wallet")]
    UserRejected,

    /// Missing or malformed input before submission.
    #[error("{0}")]
    Validation(String),

    /// RPC provider failure.
    #[error("provider error: {0}")]
    Network(String),

    /// The receipt did not arrive in time.
    #[error("timed out waiting for confirmation after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl WalletError {
    /// Map a signer or provider error message onto the taxonomy.
    ///
    /// Ledger failures only carry text, so classification is by substring.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("denied") || lower.contains("rejected") || lower.contains("6985") {
            WalletError::UserRejected
        } else if lower.contains("device not found")
            || lower.contains("no device")
            || lower.contains("hidapi")
            || lower.contains("locked")
            || lower.contains("6983")
        {
            WalletError::Unavailable(message)
        } else {
            WalletError::Network(message)
        }
    }

    pub fn from_job_error(err: anyhow::Error) -> Self {
        err.downcast::<WalletError>()
            .unwrap_or_else(|other| WalletError::Network(other.to_string()))
    }
}

/// Invalid or missing startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
