//! Settlement coordination: online collection, manual entries, edits, and
//! ledger reads.
//!
//! Every write path follows the same discipline: open a transaction, take an
//! exclusive row lock on the enrollment, recompute the ledger from the
//! successful payment set, write, commit. The gateway call in the online
//! flow happens strictly *outside* the lock so a slow provider never
//! serializes unrelated enrollments, at the documented cost that a crash
//! between provider approval and the local terminal update strands the row
//! in `pending` (resolved manually through [`SettlementService::edit_payment`]).

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{enrollment, offering, payment};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateway::{CollectRequest, CustomerInfo, PaymentGateway, ProductLine};
use crate::ledger::{self, LedgerSnapshot};
use crate::models::{
    EnrollmentStatus, MobileMoneyProvider, PaymentChannel, PaymentStatus, PaymentType,
};
use crate::services::receipts;

/// The caller on whose behalf a settlement operation runs.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InitiateOnlinePaymentRequest {
    pub enrollment_id: Uuid,
    /// Payer wallet number; falls back to the enrollment's contact
    pub payer_phone: Option<String>,
    pub provider: MobileMoneyProvider,
    /// `full` settles the remaining balance, `installment` one plan slice
    pub mode: PaymentType,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordManualPaymentRequest {
    pub enrollment_id: Uuid,
    pub amount: Decimal,
    /// Collection source, e.g. "cash desk" or a bank name
    #[validate(length(min = 1, message = "Provider is required"))]
    pub provider: String,
    pub channel: PaymentChannel,
    pub payer_phone: Option<String>,
    /// Terminal status of the out-of-band collection
    pub status: PaymentStatus,
    pub mode: PaymentType,
    pub paid_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EditPaymentRequest {
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub channel: PaymentChannel,
    pub provider: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i64,
    pub reference: String,
    pub receipt_number: Option<String>,
    pub enrollment_id: Uuid,
    pub offering_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payment_type: String,
    pub installment_number: i32,
    pub total_installments: i32,
    pub provider: String,
    pub channel: String,
    pub payer_phone: Option<String>,
    pub status: String,
    pub manual_entry: bool,
    pub failure_reason: Option<String>,
    pub provider_transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Enrollment, offering and snapshot read under the enrollment row lock.
struct LockedLedger {
    enrollment: enrollment::Model,
    offering: offering::Model,
    snapshot: LedgerSnapshot,
}

/// Orchestrates payment attempts against enrollments.
pub struct SettlementService {
    db: Arc<DbPool>,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: Arc<EventSender>,
    gateway_country: String,
}

impl SettlementService {
    pub fn new(
        db: Arc<DbPool>,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: Arc<EventSender>,
        gateway_country: String,
    ) -> Self {
        Self {
            db,
            gateway,
            event_sender,
            gateway_country,
        }
    }

    /// Runs one online collection attempt end to end.
    ///
    /// The pending row is committed (and the enrollment lock released)
    /// before the gateway call; the terminal update happens afterwards, so
    /// every return path leaves the row in a terminal state except a crash
    /// mid-call.
    #[instrument(skip(self, request), fields(enrollment_id = %request.enrollment_id))]
    pub async fn initiate_online_payment(
        &self,
        actor: &Actor,
        request: InitiateOnlinePaymentRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        request.validate()?;

        let now = Utc::now();

        // Phase 1: ledger recompute and pending insert, under the row lock.
        let txn = self.db.begin().await?;
        let ledger = self.locked_ledger(&txn, request.enrollment_id).await?;

        if ledger.enrollment.user_id != actor.user_id && !actor.is_admin {
            return Err(ServiceError::Forbidden(
                "You do not own this enrollment".to_string(),
            ));
        }
        self.require_accepted(&ledger.enrollment)?;

        if !ledger.snapshot.can_pay {
            return Err(ServiceError::AlreadySettled(
                "No remaining balance for this enrollment".to_string(),
            ));
        }

        let phone = normalize_phone(
            request
                .payer_phone
                .as_deref()
                .or(ledger.enrollment.payer_phone.as_deref()),
        )?;

        let installment = request.mode == PaymentType::Installment;
        let amount = ledger::amount_for_mode(&ledger.snapshot, installment);

        let pending = payment::ActiveModel {
            id: NotSet,
            reference: Set(receipts::payment_reference(now)),
            receipt_number: Set(None),
            enrollment_id: Set(ledger.enrollment.id),
            offering_id: Set(ledger.offering.id),
            user_id: Set(ledger.enrollment.user_id),
            recorded_by: Set(None),
            updated_by: Set(None),
            amount: Set(amount),
            currency: Set(ledger.offering.currency.clone()),
            payment_type: Set(request.mode.to_string()),
            installment_number: Set(ledger.snapshot.next_installment_number),
            total_installments: Set(ledger.snapshot.total_installments),
            provider: Set(request.provider.to_string()),
            channel: Set(PaymentChannel::Online.to_string()),
            payer_phone: Set(Some(phone.clone())),
            status: Set(PaymentStatus::Pending.to_string()),
            manual_entry: Set(false),
            failure_reason: Set(None),
            provider_transaction_id: Set(None),
            gateway_response: Set(None),
            paid_at: Set(None),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let record = pending.insert(&txn).await?;
        txn.commit().await?;

        info!(
            payment_id = record.id,
            reference = %record.reference,
            %amount,
            "pending payment created; calling gateway"
        );

        // Phase 2: provider call, outside any lock.
        let collect = CollectRequest {
            service: request.provider.service_code().to_string(),
            payer_phone: phone,
            amount,
            currency: ledger.offering.currency.clone(),
            country: self.gateway_country.clone(),
            customer: CustomerInfo {
                email: None,
                first_name: None,
                last_name: None,
                country: self.gateway_country.clone(),
            },
            products: vec![ProductLine {
                id: ledger.offering.id.to_string(),
                name: ledger.offering.name.clone(),
                category: "enrollment".to_string(),
                quantity: 1,
                amount,
            }],
        };

        let result = match self.gateway.collect(&collect).await {
            Ok(result) => result,
            Err(err) => {
                let reason = err.to_string();
                let failed = self.mark_failed(record.id, &reason, None).await?;
                self.emit_failed(&failed, &reason).await;
                return Err(ServiceError::GatewayTransport(reason));
            }
        };

        // Phase 3: reconcile to a terminal state.
        if result.is_success() {
            let paid_at = Utc::now();
            let receipt = receipts::receipt_number(record.id, paid_at);
            let updated = payment::ActiveModel {
                id: Set(record.id),
                status: Set(PaymentStatus::Successful.to_string()),
                receipt_number: Set(Some(receipt)),
                provider_transaction_id: Set(result.transaction_id.clone()),
                gateway_response: Set(result.raw.clone()),
                failure_reason: Set(None),
                paid_at: Set(Some(paid_at)),
                updated_at: Set(Some(paid_at)),
                ..Default::default()
            }
            .update(&*self.db)
            .await?;

            info!(
                payment_id = updated.id,
                receipt_number = ?updated.receipt_number,
                "payment collected successfully"
            );
            self.emit_succeeded(&updated).await;
            Ok(model_to_response(updated))
        } else {
            let reason = result
                .message
                .clone()
                .unwrap_or_else(|| "Payment was not approved by the provider".to_string());
            let failed = self
                .mark_failed(record.id, &reason, result.raw.clone())
                .await?;
            self.emit_failed(&failed, &reason).await;
            Err(ServiceError::GatewayDecline(reason))
        }
    }

    /// Records an out-of-band collection (cash, bank transfer, on-site)
    /// directly in a caller-supplied terminal status.
    #[instrument(skip(self, request), fields(enrollment_id = %request.enrollment_id))]
    pub async fn record_manual_payment(
        &self,
        actor: &Actor,
        request: RecordManualPaymentRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        request.validate()?;

        if !request.status.is_terminal() {
            return Err(ServiceError::ValidationError(
                "Manual entries must carry a terminal status".to_string(),
            ));
        }
        if request.channel == PaymentChannel::Online {
            return Err(ServiceError::ValidationError(
                "Online collections must go through the gateway flow".to_string(),
            ));
        }
        let amount = validate_amount(request.amount)?;

        let now = Utc::now();
        let txn = self.db.begin().await?;
        let ledger = self.locked_ledger(&txn, request.enrollment_id).await?;
        self.require_accepted(&ledger.enrollment)?;

        // Manual successes obey the same accounting invariant as online
        // collections.
        let payment_type = if request.status == PaymentStatus::Successful {
            if !ledger.snapshot.can_pay {
                return Err(ServiceError::AlreadySettled(
                    "No remaining balance for this enrollment".to_string(),
                ));
            }
            if amount > ledger.snapshot.remaining_amount {
                return Err(ServiceError::Overpayment {
                    requested: amount,
                    remaining: ledger.snapshot.remaining_amount,
                });
            }
            // A partial collection is an installment no matter what the
            // caller labelled it.
            if amount < ledger.snapshot.remaining_amount {
                PaymentType::Installment
            } else {
                PaymentType::Full
            }
        } else {
            request.mode
        };

        let paid_at = match request.status {
            PaymentStatus::Successful => Some(request.paid_at.unwrap_or(now)),
            _ => None,
        };
        let failure_reason = match request.status {
            PaymentStatus::Failed => Some(
                request
                    .failure_reason
                    .clone()
                    .unwrap_or_else(|| "Recorded as failed by administrator".to_string()),
            ),
            _ => None,
        };
        let phone = match request.payer_phone.as_deref() {
            Some(raw) => Some(normalize_phone(Some(raw))?),
            None => None,
        };

        let entry = payment::ActiveModel {
            id: NotSet,
            reference: Set(receipts::payment_reference(now)),
            receipt_number: Set(None),
            enrollment_id: Set(ledger.enrollment.id),
            offering_id: Set(ledger.offering.id),
            user_id: Set(ledger.enrollment.user_id),
            recorded_by: Set(Some(actor.user_id)),
            updated_by: Set(None),
            amount: Set(amount),
            currency: Set(ledger.offering.currency.clone()),
            payment_type: Set(payment_type.to_string()),
            installment_number: Set(ledger.snapshot.next_installment_number),
            total_installments: Set(ledger.snapshot.total_installments),
            provider: Set(request.provider.clone()),
            channel: Set(request.channel.to_string()),
            payer_phone: Set(phone),
            status: Set(request.status.to_string()),
            manual_entry: Set(true),
            failure_reason: Set(failure_reason.clone()),
            provider_transaction_id: Set(None),
            gateway_response: Set(None),
            paid_at: Set(paid_at),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let mut record = entry.insert(&txn).await?;

        // The receipt number needs the row id, so it is stamped in the same
        // transaction as the successful insert.
        if request.status == PaymentStatus::Successful {
            let issued_at = paid_at.unwrap_or(now);
            record = payment::ActiveModel {
                id: Set(record.id),
                receipt_number: Set(Some(receipts::receipt_number(record.id, issued_at))),
                ..Default::default()
            }
            .update(&txn)
            .await?;
        }

        txn.commit().await?;

        info!(
            payment_id = record.id,
            status = %record.status,
            manual_entry = true,
            "manual payment recorded"
        );

        match request.status {
            PaymentStatus::Successful => self.emit_succeeded(&record).await,
            PaymentStatus::Failed => {
                let reason = failure_reason.unwrap_or_default();
                self.emit_failed(&record, &reason).await;
            }
            PaymentStatus::Pending => unreachable!("terminal status enforced above"),
        }

        Ok(model_to_response(record))
    }

    /// Replaces the terminal fields of an existing payment.
    ///
    /// Also serves as the manual resolution path for rows stranded in
    /// `pending` by a crash between provider approval and the local update;
    /// there is deliberately no automatic reconciliation against the
    /// provider's transaction log.
    #[instrument(skip(self, request))]
    pub async fn edit_payment(
        &self,
        actor: &Actor,
        payment_id: i64,
        request: EditPaymentRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        request.validate()?;

        if !request.status.is_terminal() {
            return Err(ServiceError::ValidationError(
                "Payments cannot be edited back to pending".to_string(),
            ));
        }
        let amount = validate_amount(request.amount)?;

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let existing = payment::Entity::find_by_id(payment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", payment_id)))?;

        // Lock the enrollment so the accounting check below cannot race a
        // concurrent settlement attempt.
        let ledger = self.locked_ledger(&txn, existing.enrollment_id).await?;

        if request.status == PaymentStatus::Successful {
            // Remaining balance excluding this row, since its amount is
            // being replaced.
            let others: Vec<Decimal> = payment::Entity::find()
                .filter(payment::Column::EnrollmentId.eq(existing.enrollment_id))
                .filter(payment::Column::Status.eq(PaymentStatus::Successful.to_string()))
                .filter(payment::Column::Id.ne(existing.id))
                .all(&txn)
                .await?
                .into_iter()
                .map(|p| p.amount)
                .collect();
            let accepted = self.enrollment_status(&ledger.enrollment)? == EnrollmentStatus::Accepted;
            let snapshot = ledger::snapshot(
                ledger.offering.price,
                ledger.offering.max_installments,
                accepted,
                &others,
            );
            if amount > snapshot.remaining_amount {
                return Err(ServiceError::Overpayment {
                    requested: amount,
                    remaining: snapshot.remaining_amount,
                });
            }
        }

        let was_successful = existing.status == PaymentStatus::Successful.to_string();
        let becomes_successful = request.status == PaymentStatus::Successful;

        let mut model = payment::ActiveModel {
            id: Set(existing.id),
            status: Set(request.status.to_string()),
            amount: Set(amount),
            channel: Set(request.channel.to_string()),
            updated_by: Set(Some(actor.user_id)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };
        if let Some(provider) = request.provider.clone() {
            model.provider = Set(provider);
        }
        if let Some(notes) = request.notes.clone() {
            model.notes = Set(Some(notes));
        }

        match request.status {
            PaymentStatus::Successful => {
                if existing.receipt_number.is_none() {
                    model.receipt_number = Set(Some(receipts::receipt_number(existing.id, now)));
                }
                if existing.paid_at.is_none() {
                    model.paid_at = Set(Some(request.paid_at.unwrap_or(now)));
                }
                model.failure_reason = Set(None);
            }
            PaymentStatus::Failed => {
                model.paid_at = Set(None);
                model.receipt_number = Set(None);
                if let Some(reason) = request.failure_reason.clone() {
                    model.failure_reason = Set(Some(reason));
                }
            }
            PaymentStatus::Pending => unreachable!("terminal status enforced above"),
        }

        let updated = model.update(&txn).await?;
        txn.commit().await?;

        info!(
            payment_id = updated.id,
            status = %updated.status,
            "payment edited"
        );

        if becomes_successful && !was_successful {
            self.emit_succeeded(&updated).await;
        }

        Ok(model_to_response(updated))
    }

    /// Fetches a single payment.
    pub async fn get_payment(&self, payment_id: i64) -> Result<PaymentResponse, ServiceError> {
        let record = payment::Entity::find_by_id(payment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", payment_id)))?;
        Ok(model_to_response(record))
    }

    /// Lists payments, newest first, optionally filtered by status.
    pub async fn list_payments(
        &self,
        page: u64,
        per_page: u64,
        status: Option<PaymentStatus>,
    ) -> Result<(Vec<PaymentResponse>, u64), ServiceError> {
        let mut query = payment::Entity::find().order_by_desc(payment::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(payment::Column::Status.eq(status.to_string()));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page.max(1) - 1).await?;

        Ok((records.into_iter().map(model_to_response).collect(), total))
    }

    /// Payment history for one enrollment, oldest first.
    pub async fn payments_for_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> Result<Vec<PaymentResponse>, ServiceError> {
        let records = payment::Entity::find()
            .filter(payment::Column::EnrollmentId.eq(enrollment_id))
            .order_by_asc(payment::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(records.into_iter().map(model_to_response).collect())
    }

    /// Current snapshot for display. Takes no lock.
    pub async fn ledger(&self, enrollment_id: Uuid) -> Result<LedgerSnapshot, ServiceError> {
        let enrollment = enrollment::Entity::find_by_id(enrollment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Enrollment {} not found", enrollment_id))
            })?;
        let offering = offering::Entity::find_by_id(enrollment.offering_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Offering {} not found", enrollment.offering_id))
            })?;
        let amounts = self.successful_amounts(&*self.db, enrollment_id).await?;
        let accepted = self.enrollment_status(&enrollment)? == EnrollmentStatus::Accepted;
        Ok(ledger::snapshot(
            offering.price,
            offering.max_installments,
            accepted,
            &amounts,
        ))
    }

    /// Emits a balance reminder for an enrollment that still owes money.
    #[instrument(skip(self))]
    pub async fn request_payment_reminder(
        &self,
        enrollment_id: Uuid,
    ) -> Result<LedgerSnapshot, ServiceError> {
        let enrollment = enrollment::Entity::find_by_id(enrollment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Enrollment {} not found", enrollment_id))
            })?;
        let snapshot = self.ledger(enrollment_id).await?;

        if !snapshot.can_pay {
            return Err(ServiceError::AlreadySettled(
                "Nothing is owed on this enrollment".to_string(),
            ));
        }

        let currency = offering::Entity::find_by_id(enrollment.offering_id)
            .one(&*self.db)
            .await?
            .map(|o| o.currency)
            .unwrap_or_default();

        let event = Event::PaymentReminderRequested {
            enrollment_id,
            user_id: enrollment.user_id,
            remaining_amount: snapshot.remaining_amount,
            installment_amount: snapshot.installment_amount,
            next_installment_number: snapshot.next_installment_number,
            total_installments: snapshot.total_installments,
            currency,
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, %enrollment_id, "failed to send reminder event");
        }

        Ok(snapshot)
    }

    // Internal helpers

    /// Locks the enrollment row and recomputes its ledger inside `txn`.
    async fn locked_ledger(
        &self,
        txn: &DatabaseTransaction,
        enrollment_id: Uuid,
    ) -> Result<LockedLedger, ServiceError> {
        let enrollment = enrollment::Entity::find_by_id(enrollment_id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Enrollment {} not found", enrollment_id))
            })?;

        let offering = offering::Entity::find_by_id(enrollment.offering_id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Offering {} not found", enrollment.offering_id))
            })?;

        let amounts = self.successful_amounts(txn, enrollment_id).await?;
        let accepted = self.enrollment_status(&enrollment)? == EnrollmentStatus::Accepted;
        let snapshot = ledger::snapshot(
            offering.price,
            offering.max_installments,
            accepted,
            &amounts,
        );

        Ok(LockedLedger {
            enrollment,
            offering,
            snapshot,
        })
    }

    async fn successful_amounts<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        enrollment_id: Uuid,
    ) -> Result<Vec<Decimal>, ServiceError> {
        Ok(payment::Entity::find()
            .filter(payment::Column::EnrollmentId.eq(enrollment_id))
            .filter(payment::Column::Status.eq(PaymentStatus::Successful.to_string()))
            .all(conn)
            .await?
            .into_iter()
            .map(|p| p.amount)
            .collect())
    }

    fn enrollment_status(
        &self,
        enrollment: &enrollment::Model,
    ) -> Result<EnrollmentStatus, ServiceError> {
        EnrollmentStatus::from_str(&enrollment.status).map_err(|_| {
            ServiceError::InternalError(format!(
                "enrollment {} has unknown status {}",
                enrollment.id, enrollment.status
            ))
        })
    }

    fn require_accepted(&self, enrollment: &enrollment::Model) -> Result<(), ServiceError> {
        if self.enrollment_status(enrollment)? != EnrollmentStatus::Accepted {
            return Err(ServiceError::Forbidden(
                "Enrollment has not been accepted".to_string(),
            ));
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        payment_id: i64,
        reason: &str,
        raw: Option<serde_json::Value>,
    ) -> Result<payment::Model, ServiceError> {
        let now = Utc::now();
        let mut model = payment::ActiveModel {
            id: Set(payment_id),
            status: Set(PaymentStatus::Failed.to_string()),
            failure_reason: Set(Some(reason.to_string())),
            updated_at: Set(Some(now)),
            ..Default::default()
        };
        if raw.is_some() {
            model.gateway_response = Set(raw);
        }
        Ok(model.update(&*self.db).await?)
    }

    async fn emit_succeeded(&self, record: &payment::Model) {
        let event = Event::PaymentSucceeded {
            payment_id: record.id,
            enrollment_id: record.enrollment_id,
            user_id: record.user_id,
            receipt_number: record.receipt_number.clone().unwrap_or_default(),
            amount: record.amount,
            currency: record.currency.clone(),
            manual_entry: record.manual_entry,
            paid_at: record.paid_at.unwrap_or_else(Utc::now),
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, payment_id = record.id, "failed to send success event");
        }
    }

    async fn emit_failed(&self, record: &payment::Model, reason: &str) {
        let event = Event::PaymentFailed {
            payment_id: record.id,
            enrollment_id: record.enrollment_id,
            user_id: record.user_id,
            reason: reason.to_string(),
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, payment_id = record.id, "failed to send failure event");
        }
    }
}

/// Strips whitespace and checks the wallet number is plausible.
fn normalize_phone(raw: Option<&str>) -> Result<String, ServiceError> {
    let normalized: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if normalized.is_empty() {
        return Err(ServiceError::ValidationError(
            "A payer phone number is required".to_string(),
        ));
    }
    if !normalized
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || (i == 0 && c == '+'))
    {
        return Err(ServiceError::ValidationError(format!(
            "Invalid payer phone number: {}",
            normalized
        )));
    }

    Ok(normalized)
}

fn validate_amount(amount: Decimal) -> Result<Decimal, ServiceError> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Amount must be greater than 0".to_string(),
        ));
    }
    Ok(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

fn model_to_response(model: payment::Model) -> PaymentResponse {
    PaymentResponse {
        id: model.id,
        reference: model.reference,
        receipt_number: model.receipt_number,
        enrollment_id: model.enrollment_id,
        offering_id: model.offering_id,
        user_id: model.user_id,
        amount: model.amount,
        currency: model.currency,
        payment_type: model.payment_type,
        installment_number: model.installment_number,
        total_installments: model.total_installments,
        provider: model.provider,
        channel: model.channel,
        payer_phone: model.payer_phone,
        status: model.status,
        manual_entry: model.manual_entry,
        failure_reason: model.failure_reason,
        provider_transaction_id: model.provider_transaction_id,
        paid_at: model.paid_at,
        notes: model.notes,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
