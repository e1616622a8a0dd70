//! Mobile-money collection gateway.
//!
//! The settlement coordinator only sees the [`PaymentGateway`] trait and the
//! two independent success booleans on [`GatewayResult`]: whether the call
//! itself completed, and whether the provider approved the charge. A decline
//! is a value, not an error; only transport-level faults surface as
//! [`GatewayError`].

pub mod http;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::http::HttpPaymentGateway;

/// Buyer identity forwarded to the provider for its own records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: String,
}

/// What the charge is for; providers display this on the payer's handset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductLine {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub amount: Decimal,
}

/// One collection request against a payer's mobile-money wallet.
#[derive(Debug, Clone, Serialize)]
pub struct CollectRequest {
    /// Provider service code, e.g. "MTN" or "ORANGE".
    pub service: String,
    /// Payer wallet number, already normalized (no whitespace).
    pub payer_phone: String,
    pub amount: Decimal,
    pub currency: String,
    pub country: String,
    pub customer: CustomerInfo,
    pub products: Vec<ProductLine>,
}

/// Outcome of a collection call.
///
/// `operation_success` covers the call itself; `transaction_success` covers
/// the charge. Both must be true for the payment to count as collected; any
/// other combination is a decline whose `message` is surfaced to the payer
/// when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResult {
    pub operation_success: bool,
    pub transaction_success: bool,
    pub transaction_id: Option<String>,
    pub message: Option<String>,
    /// Raw provider response, persisted verbatim for audit.
    pub raw: Option<serde_json::Value>,
}

impl GatewayResult {
    pub fn is_success(&self) -> bool {
        self.operation_success && self.transaction_success
    }
}

/// Transport-level faults talking to the provider. Business declines never
/// take this path.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request timed out")]
    Timeout,
    #[error("gateway transport failure: {0}")]
    Transport(String),
    #[error("gateway returned an unreadable response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempts to collect `request.amount` from the payer's wallet. The
    /// call is synchronous from the coordinator's point of view and must be
    /// bounded by the adapter's configured timeout.
    async fn collect(&self, request: &CollectRequest) -> Result<GatewayResult, GatewayError>;
}
