//! Notification events emitted by the settlement engine.
//!
//! Events are sent on an in-process channel only after the owning database
//! transaction has committed, and never from inside the enrollment lock. The
//! worker spawned by [`process_events`] is the boundary to the notification
//! dispatcher (mail delivery lives outside this crate); settlement responses
//! never block on it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Money landed: a payment reached `successful` and a receipt was issued.
    PaymentSucceeded {
        payment_id: i64,
        enrollment_id: Uuid,
        user_id: Uuid,
        receipt_number: String,
        amount: Decimal,
        currency: String,
        manual_entry: bool,
        paid_at: DateTime<Utc>,
    },
    /// An attempt reached `failed` (decline, transport fault, or manual
    /// record of a failed out-of-band collection).
    PaymentFailed {
        payment_id: i64,
        enrollment_id: Uuid,
        user_id: Uuid,
        reason: String,
    },
    /// An administrator asked for a balance reminder to be delivered.
    PaymentReminderRequested {
        enrollment_id: Uuid,
        user_id: Uuid,
        remaining_amount: Decimal,
        installment_amount: Decimal,
        next_installment_number: i32,
        total_installments: i32,
        currency: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes events and hands them to the notification dispatcher.
///
/// Delivery here is logging only; the real dispatcher subscribes in its own
/// process. Dropping an event is logged, never surfaced to the payer.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::PaymentSucceeded {
                payment_id,
                enrollment_id,
                receipt_number,
                amount,
                currency,
                ..
            } => {
                info!(
                    payment_id,
                    %enrollment_id,
                    receipt_number,
                    %amount,
                    currency,
                    "payment succeeded; queueing receipt notification"
                );
            }
            Event::PaymentFailed {
                payment_id,
                enrollment_id,
                reason,
                ..
            } => {
                warn!(
                    payment_id,
                    %enrollment_id,
                    reason,
                    "payment failed; queueing failure notification"
                );
            }
            Event::PaymentReminderRequested {
                enrollment_id,
                remaining_amount,
                next_installment_number,
                ..
            } => {
                info!(
                    %enrollment_id,
                    %remaining_amount,
                    next_installment_number,
                    "queueing payment reminder"
                );
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn events_round_trip_through_the_channel() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        sender
            .send(Event::PaymentFailed {
                payment_id: 7,
                enrollment_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                reason: "insufficient funds".to_string(),
            })
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::PaymentFailed {
                payment_id, reason, ..
            }) => {
                assert_eq!(payment_id, 7);
                assert_eq!(reason, "insufficient funds");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender
            .send(Event::PaymentReminderRequested {
                enrollment_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                remaining_amount: dec!(500),
                installment_amount: dec!(250),
                next_installment_number: 1,
                total_installments: 2,
                currency: "XAF".to_string(),
            })
            .await;
        assert!(result.is_err());
    }
}
