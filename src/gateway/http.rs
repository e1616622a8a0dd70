//! HTTP adapter for the hosted mobile-money collection API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{CollectRequest, GatewayError, GatewayResult, PaymentGateway};
use crate::config::GatewayConfig;

/// Shape of the provider's collection response. Fields default rather than
/// fail so a partially filled body still reaches the audit log.
#[derive(Debug, Deserialize)]
struct CollectResponseBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    transaction: Option<TransactionBody>,
}

#[derive(Debug, Deserialize)]
struct TransactionBody {
    #[serde(default)]
    success: bool,
    #[serde(default, alias = "transaction_id", alias = "pay_token")]
    id: Option<String>,
}

pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpPaymentGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn classify(err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self, request), fields(service = %request.service, amount = %request.amount))]
    async fn collect(&self, request: &CollectRequest) -> Result<GatewayResult, GatewayError> {
        let url = format!("{}/collect", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(Self::classify)?;

        let status = response.status();

        // Auth misconfiguration is a transport fault, not a decline.
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Transport(format!(
                "gateway rejected credentials ({})",
                status
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let body: CollectResponseBody = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let operation_success = status.is_success() && body.success;
        let (transaction_success, transaction_id) = match body.transaction {
            Some(tx) => (tx.success, tx.id),
            None => (false, None),
        };

        let result = GatewayResult {
            operation_success,
            transaction_success,
            transaction_id,
            message: body.message,
            raw: Some(raw),
        };

        if result.is_success() {
            info!(transaction_id = ?result.transaction_id, "collection approved");
        } else {
            warn!(message = ?result.message, "collection not approved");
        }

        Ok(result)
    }
}
