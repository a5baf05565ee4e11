//! Mirror-node REST client.

use crate::error::FetchError;
use crate::types::{parse_mirror_body, AccountId, TransactionRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Largest page the mirror node serves
pub const MAX_LIMIT: u32 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Asc => f.write_str("asc"),
            Order::Desc => f.write_str("desc"),
        }
    }
}

/// Parameters of `GET /api/v1/transactions`. Unset fields are not sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionQuery {
    pub account_id: Option<String>,
    pub limit: Option<u32>,
    pub order: Option<Order>,
}

impl TransactionQuery {
    /// The account-scoped query used by the dashboard: newest 100 first.
    pub fn for_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            limit: Some(MAX_LIMIT),
            order: Some(Order::Desc),
        }
    }

    fn validate(&self) -> Result<(), FetchError> {
        if let Some(id) = &self.account_id {
            id.parse::<AccountId>()
                .map_err(|e| FetchError::Validation(e.to_string()))?;
        }
        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_LIMIT {
                return Err(FetchError::Validation(format!(
                    "limit must be between 1 and {}, got {}",
                    MAX_LIMIT, limit
                )));
            }
        }
        Ok(())
    }

    /// Query pairs in mirror-node naming
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = &self.account_id {
            pairs.push(("account.id", id.trim().to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.to_string()));
        }
        pairs
    }
}

#[derive(Clone, Debug)]
pub struct MirrorClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl MirrorClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &crate::config::Config) -> Result<Self, FetchError> {
        Self::new(config.mirror_node_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and return the response body untouched.
    pub async fn fetch_raw(&self, query: &TransactionQuery) -> Result<serde_json::Value, FetchError> {
        query.validate()?;
        let url = format!("{}/api/v1/transactions", self.base_url);
        debug!("GET {} {:?}", url, query.to_pairs());

        let response = self
            .http
            .get(&url)
            .query(&query.to_pairs())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Mirror node answered {} for {}", status, url);
            return Err(FetchError::Upstream {
                status: status.as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))
    }

    /// Fetch and normalize into records, in the order the mirror node returned them.
    pub async fn fetch(&self, query: &TransactionQuery) -> Result<Vec<TransactionRecord>, FetchError> {
        let body = self.fetch_raw(query).await?;
        let records = parse_mirror_body(&body)?;
        debug!("Mirror node returned {} transactions", records.len());
        Ok(records)
    }

    /// Transactions of one account, newest first.
    pub async fn account_transactions(&self, account_id: &str) -> Result<Vec<TransactionRecord>, FetchError> {
        if account_id.trim().is_empty() {
            return Err(FetchError::Validation("Account ID is required".to_string()));
        }
        self.fetch(&TransactionQuery::for_account(account_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn localhost_binding_permitted() -> bool {
        std::net::TcpListener::bind("127.0.0.1:0").is_ok()
    }

    const BODY: &str = r#"{
        "transactions": [
            {"entity_id": "0.0.123", "consensus_timestamp": "1704067200.000000001", "charged_tx_fee": 2000000},
            {"entity_id": "0.0.456", "consensus_timestamp": "1704153600.000000001", "charged_tx_fee": 500000}
        ],
        "links": {"next": null}
    }"#;

    fn client(server: &Server) -> MirrorClient {
        MirrorClient::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_query_pairs_use_mirror_names() {
        let query = TransactionQuery::for_account("0.0.123");
        assert_eq!(
            query.to_pairs(),
            vec![
                ("account.id", "0.0.123".to_string()),
                ("limit", "100".to_string()),
                ("order", "desc".to_string()),
            ]
        );
        assert!(TransactionQuery::default().to_pairs().is_empty());
    }

    #[test]
    fn test_query_validation() {
        let bad_limit = TransactionQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert!(matches!(bad_limit.validate(), Err(FetchError::Validation(_))));

        let bad_id = TransactionQuery {
            account_id: Some("alice".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_id.validate(), Err(FetchError::Validation(_))));
    }

    #[tokio::test]
    async fn test_fetch_preserves_order() {
        if !localhost_binding_permitted() {
            return;
        }

        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v1/transactions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .create_async()
            .await;

        let records = client(&server).fetch(&TransactionQuery::default()).await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.entity_id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["0.0.123", "0.0.456"]);
        assert_eq!(records[1].charged_fee, Some(500_000));
    }

    #[tokio::test]
    async fn test_account_transactions_sends_scoped_query() {
        if !localhost_binding_permitted() {
            return;
        }

        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/api/v1/transactions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("account.id".into(), "0.0.123".into()),
                Matcher::UrlEncoded("limit".into(), "100".into()),
                Matcher::UrlEncoded("order".into(), "desc".into()),
            ]))
            .with_status(200)
            .with_body(BODY)
            .create_async()
            .await;

        let records = client(&server).account_transactions("0.0.123").await.unwrap();
        assert_eq!(records.len(), 2);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_account_transactions_rejects_empty_id() {
        let client = MirrorClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client.account_transactions("  ").await.unwrap_err();
        assert_eq!(err, FetchError::Validation("Account ID is required".to_string()));
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        if !localhost_binding_permitted() {
            return;
        }

        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v1/transactions")
            .with_status(503)
            .create_async()
            .await;

        let err = client(&server).fetch(&TransactionQuery::default()).await.unwrap_err();
        assert_eq!(err, FetchError::Upstream { status: 503 });
    }

    #[tokio::test]
    async fn test_missing_transactions_field_is_malformed() {
        if !localhost_binding_permitted() {
            return;
        }

        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v1/transactions")
            .with_status(200)
            .with_body(r#"{"links": {}}"#)
            .create_async()
            .await;

        let err = client(&server).fetch(&TransactionQuery::default()).await.unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        if !localhost_binding_permitted() {
            return;
        }

        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v1/transactions")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let err = client(&server).fetch_raw(&TransactionQuery::default()).await.unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_raw_passes_body_through() {
        if !localhost_binding_permitted() {
            return;
        }

        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v1/transactions")
            .with_status(200)
            .with_body(BODY)
            .create_async()
            .await;

        let body = client(&server).fetch_raw(&TransactionQuery::default()).await.unwrap();
        assert!(body["links"]["next"].is_null());
        assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        if !localhost_binding_permitted() {
            return;
        }
        // Bind then drop to get a port nothing listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = MirrorClient::new(format!("http://127.0.0.1:{}", port), Duration::from_secs(2)).unwrap();
        let err = client.fetch(&TransactionQuery::default()).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_slow_source_is_timeout() {
        if !localhost_binding_permitted() {
            return;
        }
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                if let Ok((socket, _)) = listener.accept().await {
                    held.push(socket);
                }
            }
        });

        let timeout = Duration::from_millis(300);
        let client = MirrorClient::new(format!("http://{}", addr), timeout).unwrap();
        let started = std::time::Instant::now();
        let err = client.fetch(&TransactionQuery::default()).await.unwrap_err();

        assert_eq!(err, FetchError::Timeout(timeout));
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }
}
