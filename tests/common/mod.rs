//! Shared harness for settlement integration tests.
//!
//! Runs the real services against in-memory SQLite (single pooled
//! connection, migrations applied) with a scriptable gateway standing in
//! for the mobile-money provider.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, NotSet, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use enrollpay_api::config::ReceiptConfig;
use enrollpay_api::db::DbPool;
use enrollpay_api::entities::{enrollment, offering};
use enrollpay_api::events::{Event, EventSender};
use enrollpay_api::gateway::{CollectRequest, GatewayError, GatewayResult, PaymentGateway};
use enrollpay_api::migrator::Migrator;
use enrollpay_api::services::receipts::ReceiptService;
use enrollpay_api::services::settlements::{Actor, SettlementService};

/// What the scripted gateway should do on the next collect call.
#[derive(Debug, Clone)]
pub enum GatewayBehavior {
    Approve,
    Decline { message: String },
    TransportFailure,
}

pub struct ScriptedGateway {
    behavior: Mutex<GatewayBehavior>,
    calls: Mutex<u32>,
}

impl ScriptedGateway {
    pub fn new(behavior: GatewayBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: Mutex::new(0),
        }
    }

    pub fn set_behavior(&self, behavior: GatewayBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn collect(&self, request: &CollectRequest) -> Result<GatewayResult, GatewayError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        let behavior = self.behavior.lock().unwrap().clone();

        match behavior {
            GatewayBehavior::Approve => Ok(GatewayResult {
                operation_success: true,
                transaction_success: true,
                transaction_id: Some(format!("tx-{:04}", call)),
                message: Some("Transaction approved".to_string()),
                raw: Some(json!({
                    "success": true,
                    "transaction": {"success": true, "id": format!("tx-{:04}", call)},
                    "service": request.service,
                })),
            }),
            GatewayBehavior::Decline { message } => Ok(GatewayResult {
                operation_success: true,
                transaction_success: false,
                transaction_id: None,
                message: Some(message.clone()),
                raw: Some(json!({"success": true, "message": message})),
            }),
            GatewayBehavior::TransportFailure => {
                Err(GatewayError::Transport("connection reset by peer".to_string()))
            }
        }
    }
}

pub struct TestApp {
    pub db: Arc<DbPool>,
    pub settlements: SettlementService,
    pub receipts: ReceiptService,
    pub gateway: Arc<ScriptedGateway>,
    events: Mutex<mpsc::Receiver<Event>>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_gateway(GatewayBehavior::Approve).await
    }

    pub async fn with_gateway(behavior: GatewayBehavior) -> Self {
        // A single pooled connection so every session sees the same
        // in-memory database.
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.expect("sqlite connects");
        Migrator::up(&db, None).await.expect("migrations apply");
        let db = Arc::new(db);

        let (tx, rx) = mpsc::channel(64);
        let event_sender = Arc::new(EventSender::new(tx));
        let gateway = Arc::new(ScriptedGateway::new(behavior));

        let settlements = SettlementService::new(
            db.clone(),
            gateway.clone(),
            event_sender,
            "CM".to_string(),
        );
        let receipts = ReceiptService::new(db.clone(), ReceiptConfig::default());

        Self {
            db,
            settlements,
            receipts,
            gateway,
            events: Mutex::new(rx),
        }
    }

    /// Next event already emitted, if any. Events are sent before service
    /// calls return, so no waiting is involved.
    pub fn next_event(&self) -> Option<Event> {
        self.events.lock().unwrap().try_recv().ok()
    }

    pub fn drain_events(&self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event() {
            events.push(event);
        }
        events
    }

    pub async fn seed_offering(&self, price: Decimal, max_installments: i32) -> offering::Model {
        offering::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Fullstack Engineering Program".to_string()),
            price: Set(price),
            currency: Set("XAF".to_string()),
            max_installments: Set(max_installments),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await
        .expect("offering inserts")
    }

    pub async fn seed_enrollment(
        &self,
        offering: &offering::Model,
        user_id: Uuid,
        status: &str,
    ) -> enrollment::Model {
        enrollment::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            offering_id: Set(offering.id),
            status: Set(status.to_string()),
            payer_phone: Set(Some("+237 670 000 001".to_string())),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await
        .expect("enrollment inserts")
    }

    /// Inserts a raw pending payment row, as a crash between provider
    /// approval and the local terminal update would leave behind.
    pub async fn seed_stranded_pending(
        &self,
        enrollment: &enrollment::Model,
        offering: &offering::Model,
        amount: Decimal,
    ) -> enrollpay_api::entities::payment::Model {
        enrollpay_api::entities::payment::ActiveModel {
            id: NotSet,
            reference: Set(enrollpay_api::services::receipts::payment_reference(
                Utc::now(),
            )),
            receipt_number: Set(None),
            enrollment_id: Set(enrollment.id),
            offering_id: Set(offering.id),
            user_id: Set(enrollment.user_id),
            recorded_by: Set(None),
            updated_by: Set(None),
            amount: Set(amount),
            currency: Set(offering.currency.clone()),
            payment_type: Set("full".to_string()),
            installment_number: Set(1),
            total_installments: Set(offering.max_installments.max(1)),
            provider: Set("mtn".to_string()),
            channel: Set("online".to_string()),
            payer_phone: Set(Some("+237670000001".to_string())),
            status: Set("pending".to_string()),
            manual_entry: Set(false),
            failure_reason: Set(None),
            provider_transaction_id: Set(None),
            gateway_response: Set(None),
            paid_at: Set(None),
            notes: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await
        .expect("pending payment inserts")
    }
}

pub fn owner(user_id: Uuid) -> Actor {
    Actor {
        user_id,
        is_admin: false,
    }
}

pub fn admin() -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        is_admin: true,
    }
}
