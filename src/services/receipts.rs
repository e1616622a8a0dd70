//! Receipt numbering and rendering.
//!
//! Two distinct identifier schemes are in circulation and must stay stable:
//!
//! * **References** (`PAY-<yyyymmddHHMMSS>-<6 hex>`) identify every attempt,
//!   including pending and failed ones, and are assigned when the row is
//!   created: a time-ordered prefix plus a random suffix.
//! * **Receipt numbers** (`RCPT-<yyyymmdd>-<id padded to 8>`) exist only for
//!   successful payments and are assigned inside the same update that makes
//!   the payment successful, never pre-allocated. The zero-padded row id
//!   makes them globally unique without a separate sequence.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::ReceiptConfig;
use crate::db::DbPool;
use crate::entities::{offering, payment};
use crate::errors::ServiceError;
use crate::models::PaymentStatus;

/// Builds the unique reference for a new payment attempt.
pub fn payment_reference(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("PAY-{}-{}", at.format("%Y%m%d%H%M%S"), suffix)
}

/// Builds the receipt number for a payment transitioning to successful.
pub fn receipt_number(payment_id: i64, at: DateTime<Utc>) -> String {
    format!("RCPT-{}-{:08}", at.format("%Y%m%d"), payment_id)
}

/// Rendered receipt: human-readable lines plus a machine-checkable
/// verification reference, embedded in the scannable code on the printed
/// document.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReceiptDocument {
    pub receipt_number: String,
    pub reference: String,
    pub offering_name: String,
    pub payer_user_id: Uuid,
    pub payer_phone: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub payment_type: String,
    pub installment_number: i32,
    pub total_installments: i32,
    pub channel: String,
    pub provider: String,
    pub paid_at: DateTime<Utc>,
    pub organization_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    /// Resolvable URL that re-displays this canonical receipt
    pub verification_url: String,
    /// Payload encoded into the scannable code on the document
    pub qr_payload: String,
}

/// Renders verifiable receipts for successful payments.
pub struct ReceiptService {
    db: Arc<DbPool>,
    config: ReceiptConfig,
}

impl ReceiptService {
    pub fn new(db: Arc<DbPool>, config: ReceiptConfig) -> Self {
        Self { db, config }
    }

    /// Renders the receipt for a payment. Only successful payments carry a
    /// receipt; anything else is reported as absent rather than invalid.
    #[instrument(skip(self))]
    pub async fn receipt_document(&self, payment_id: i64) -> Result<ReceiptDocument, ServiceError> {
        let record = payment::Entity::find_by_id(payment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", payment_id)))?;

        self.render(record).await
    }

    /// Resolves a circulating verification reference back to the canonical
    /// receipt.
    #[instrument(skip(self))]
    pub async fn verify(&self, receipt_number: &str) -> Result<ReceiptDocument, ServiceError> {
        let record = payment::Entity::find()
            .filter(payment::Column::ReceiptNumber.eq(receipt_number))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No receipt issued under {}", receipt_number))
            })?;

        self.render(record).await
    }

    async fn render(&self, record: payment::Model) -> Result<ReceiptDocument, ServiceError> {
        let status = PaymentStatus::from_str(&record.status)
            .map_err(|_| ServiceError::InternalError(format!("bad status: {}", record.status)))?;

        if status != PaymentStatus::Successful {
            return Err(ServiceError::NotFound(format!(
                "Payment {} has no receipt",
                record.id
            )));
        }

        let (receipt_number, paid_at) = match (&record.receipt_number, record.paid_at) {
            (Some(number), Some(at)) => (number.clone(), at),
            _ => {
                // Violates the successful-implies-receipt invariant; surface
                // loudly instead of rendering a half receipt.
                return Err(ServiceError::InternalError(format!(
                    "successful payment {} is missing receipt fields",
                    record.id
                )));
            }
        };

        let offering_entry = offering::Entity::find_by_id(record.offering_id)
            .one(&*self.db)
            .await?;
        let offering_name = offering_entry
            .map(|o| o.name)
            .unwrap_or_else(|| "Unknown offering".to_string());

        let verification_url = format!(
            "{}/api/v1/receipts/verify/{}",
            self.config.verify_base_url.trim_end_matches('/'),
            receipt_number
        );

        Ok(ReceiptDocument {
            receipt_number,
            reference: record.reference,
            offering_name,
            payer_user_id: record.user_id,
            payer_phone: record.payer_phone,
            amount: record.amount,
            currency: record.currency,
            payment_type: record.payment_type,
            installment_number: record.installment_number,
            total_installments: record.total_installments,
            channel: record.channel,
            provider: record.provider,
            paid_at,
            organization_name: self.config.organization_name.clone(),
            contact_email: self.config.contact_email.clone(),
            contact_phone: self.config.contact_phone.clone(),
            qr_payload: verification_url.clone(),
            verification_url,
        })
    }
}
