//! HTTP backend client.
//!
//! Talks to the wheel backend over its two JSON endpoints:
//! `POST /wheel/spin` for the weighted draw and `GET /admin/wheel-config`
//! for the sector configuration. Response decoding is split into pure
//! helpers so it can be tested without a server.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::net::resolver::{OutcomeResolver, ResolveError};
use crate::wheel::engine::SessionId;
use crate::wheel::sectors::WheelConfigItem;

/// `POST /wheel/spin` response body
#[derive(Debug, Deserialize)]
struct SpinResponse {
    result: String,
}

/// `GET /admin/wheel-config` response body
#[derive(Debug, Deserialize)]
struct WheelConfigResponse {
    items: Vec<WheelConfigItem>,
}

/// Client for both backend endpoints.
#[derive(Debug, Clone)]
pub struct WheelApiClient {
    client: Client,
    base_url: String,
}

impl WheelApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Request one weighted draw from the backend.
    pub async fn spin(&self) -> Result<String, ResolveError> {
        let url = format!("{}/wheel/spin", self.base_url);
        debug!(%url, "requesting spin outcome");

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| ResolveError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "spin request rejected");
            return Err(ResolveError::Network(format!("status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::Network(e.to_string()))?;
        parse_spin_response(&body)
    }

    /// Fetch the ordered sector configuration.
    pub async fn fetch_wheel_config(&self) -> Result<Vec<WheelConfigItem>, ResolveError> {
        let url = format!("{}/admin/wheel-config", self.base_url);
        debug!(%url, "fetching wheel config");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolveError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "wheel config request rejected");
            return Err(ResolveError::Network(format!("status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::Network(e.to_string()))?;
        parse_wheel_config_response(&body)
    }
}

impl OutcomeResolver for WheelApiClient {
    async fn request_outcome(&self, session_id: SessionId) -> Result<String, ResolveError> {
        let label = self.spin().await?;
        debug!(%session_id, %label, "outcome resolved");
        Ok(label)
    }
}

fn parse_spin_response(body: &str) -> Result<String, ResolveError> {
    let decoded: SpinResponse =
        serde_json::from_str(body).map_err(|e| ResolveError::Malformed(e.to_string()))?;
    if decoded.result.is_empty() {
        return Err(ResolveError::Malformed("empty result label".to_string()));
    }
    Ok(decoded.result)
}

fn parse_wheel_config_response(body: &str) -> Result<Vec<WheelConfigItem>, ResolveError> {
    let decoded: WheelConfigResponse =
        serde_json::from_str(body).map_err(|e| ResolveError::Malformed(e.to_string()))?;
    Ok(decoded.items)
}
