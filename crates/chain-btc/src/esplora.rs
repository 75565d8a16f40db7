//! Esplora / mempool.space REST client.
//!
//! One client serves both networks; the base URL is picked per call.
//! Requests are bounded by a single timeout and never retried: a failed
//! broadcast must not be resubmitted blindly.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::SourceError;
use crate::fee::FeeRateTier;
use crate::network::BtcNetwork;
use crate::source::{ChainSource, ChainTransaction};
use crate::utxo::Utxo;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(50);

/// Longest error body kept from a failed response.
const MAX_ERROR_BODY: usize = 500;

/// Environment variable names read by [`EsploraConfig::from_env`].
pub mod env_vars {
    pub const MAINNET_API_URL: &str = "BTC_MAINNET_API_URL";
    pub const TESTNET_API_URL: &str = "BTC_TESTNET_API_URL";
    pub const MAINNET_EXPLORER_URL: &str = "BTC_MAINNET_EXPLORER_URL";
    pub const TESTNET_EXPLORER_URL: &str = "BTC_TESTNET_EXPLORER_URL";
    pub const HTTP_TIMEOUT_SECS: &str = "BTC_HTTP_TIMEOUT_SECS";
}

/// Endpoints and timeout for [`EsploraClient`].
#[derive(Debug, Clone)]
pub struct EsploraConfig {
    pub mainnet_url: String,
    pub testnet_url: String,
    pub mainnet_explorer: String,
    pub testnet_explorer: String,
    pub timeout: Duration,
}

impl Default for EsploraConfig {
    fn default() -> Self {
        Self {
            mainnet_url: BtcNetwork::Mainnet.default_api_url().to_string(),
            testnet_url: BtcNetwork::Testnet.default_api_url().to_string(),
            mainnet_explorer: BtcNetwork::Mainnet.default_explorer_url().to_string(),
            testnet_explorer: BtcNetwork::Testnet.default_explorer_url().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl EsploraConfig {
    /// Defaults overridden by `BTC_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(env_vars::MAINNET_API_URL) {
            tracing::debug!(%url, "using {} for mainnet", env_vars::MAINNET_API_URL);
            config.mainnet_url = url;
        }
        if let Some(url) = lookup(env_vars::TESTNET_API_URL) {
            tracing::debug!(%url, "using {} for testnet", env_vars::TESTNET_API_URL);
            config.testnet_url = url;
        }
        if let Some(url) = lookup(env_vars::MAINNET_EXPLORER_URL) {
            config.mainnet_explorer = url;
        }
        if let Some(url) = lookup(env_vars::TESTNET_EXPLORER_URL) {
            config.testnet_explorer = url;
        }
        if let Some(raw) = lookup(env_vars::HTTP_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    value = %raw,
                    "ignoring invalid {}",
                    env_vars::HTTP_TIMEOUT_SECS
                ),
            }
        }

        config.mainnet_url = config.mainnet_url.trim_end_matches('/').to_string();
        config.testnet_url = config.testnet_url.trim_end_matches('/').to_string();
        config.mainnet_explorer = config.mainnet_explorer.trim_end_matches('/').to_string();
        config.testnet_explorer = config.testnet_explorer.trim_end_matches('/').to_string();
        config
    }

    pub fn api_url(&self, network: BtcNetwork) -> &str {
        match network {
            BtcNetwork::Mainnet => &self.mainnet_url,
            BtcNetwork::Testnet => &self.testnet_url,
        }
    }

    pub fn explorer_url(&self, network: BtcNetwork) -> &str {
        match network {
            BtcNetwork::Mainnet => &self.mainnet_explorer,
            BtcNetwork::Testnet => &self.testnet_explorer,
        }
    }
}

/// `/address/{addr}/utxo` entry.
#[derive(Deserialize)]
struct EsploraUtxo {
    txid: String,
    vout: u32,
    value: u64,
    status: EsploraUtxoStatus,
}

#[derive(Deserialize)]
struct EsploraUtxoStatus {
    confirmed: bool,
}

impl From<EsploraUtxo> for Utxo {
    fn from(u: EsploraUtxo) -> Self {
        Utxo {
            txid: u.txid,
            vout: u.vout,
            value_sats: u.value,
            confirmed: u.status.confirmed,
        }
    }
}

/// Async client for an Esplora-compatible API.
pub struct EsploraClient {
    client: reqwest::Client,
    config: EsploraConfig,
}

impl EsploraClient {
    pub fn new(config: EsploraConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(SourceError::Client)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EsploraConfig {
        &self.config
    }

    fn url(&self, network: BtcNetwork, path: &str) -> String {
        format!("{}{}", self.config.api_url(network), path)
    }

    async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        tracing::trace!(%url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(url, e))?;
        Self::read_body(url, resp).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn post_text(&self, url: &str, body: String) -> Result<String, SourceError> {
        tracing::trace!(%url, "POST");
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(url, e))?;
        Self::read_body(url, resp).await
    }

    async fn read_body(url: &str, resp: reqwest::Response) -> Result<String, SourceError> {
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| SourceError::from_reqwest(url, e))?;

        if status >= 400 {
            return Err(SourceError::Status {
                url: url.to_string(),
                status,
                body: body.trim().chars().take(MAX_ERROR_BODY).collect(),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ChainSource for EsploraClient {
    async fn utxos(&self, network: BtcNetwork, address: &str) -> Result<Vec<Utxo>, SourceError> {
        let url = self.url(network, &format!("/address/{address}/utxo"));
        let utxos: Vec<EsploraUtxo> = self.get_json(&url).await?;
        Ok(utxos.into_iter().map(Utxo::from).collect())
    }

    async fn raw_transaction(
        &self,
        network: BtcNetwork,
        txid: &str,
    ) -> Result<String, SourceError> {
        let url = self.url(network, &format!("/tx/{txid}/hex"));
        let hex = self.get_text(&url).await?;
        let hex = hex.trim();
        if hex.is_empty() {
            return Err(SourceError::Decode {
                url,
                reason: "empty raw transaction".into(),
            });
        }
        Ok(hex.to_string())
    }

    async fn fee_estimates(&self, network: BtcNetwork) -> Result<FeeRateTier, SourceError> {
        let url = self.url(network, "/v1/fees/recommended");
        self.get_json(&url).await
    }

    async fn broadcast(&self, network: BtcNetwork, raw_hex: &str) -> Result<String, SourceError> {
        let url = self.url(network, "/tx");
        let txid = self.post_text(&url, raw_hex.to_string()).await?;
        let txid = txid.trim();
        if txid.is_empty() {
            return Err(SourceError::Decode {
                url,
                reason: "empty txid in broadcast response".into(),
            });
        }
        Ok(txid.to_string())
    }

    async fn address_transactions(
        &self,
        network: BtcNetwork,
        address: &str,
    ) -> Result<Vec<ChainTransaction>, SourceError> {
        let url = self.url(network, &format!("/address/{address}/txs"));
        self.get_json(&url).await
    }

    async fn transaction(
        &self,
        network: BtcNetwork,
        txid: &str,
    ) -> Result<ChainTransaction, SourceError> {
        let url = self.url(network, &format!("/tx/{txid}"));
        self.get_json(&url).await
    }

    fn explorer_tx_url(&self, network: BtcNetwork, txid: &str) -> String {
        format!("{}/tx/{}", self.config.explorer_url(network), txid)
    }
}
