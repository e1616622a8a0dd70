pub mod common;
pub mod payments;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::gateway::PaymentGateway;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub settlements: Arc<crate::services::settlements::SettlementService>,
    pub receipts: Arc<crate::services::receipts::ReceiptService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
    ) -> Self {
        let settlements = Arc::new(crate::services::settlements::SettlementService::new(
            db_pool.clone(),
            gateway,
            event_sender,
            config.gateway.country.clone(),
        ));
        let receipts = Arc::new(crate::services::receipts::ReceiptService::new(
            db_pool,
            config.receipts.clone(),
        ));

        Self {
            settlements,
            receipts,
        }
    }
}
