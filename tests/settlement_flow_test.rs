//! Integration tests for the online settlement flow.
//!
//! Tests cover:
//! - Full and installment collection against a scripted gateway
//! - Gateway decline and transport failure accounting
//! - Already-settled and permission rejections
//! - Serialized re-entrancy: N installment attempts settle a plan of N

mod common;

use common::{admin, owner, GatewayBehavior, TestApp};
use enrollpay_api::errors::ServiceError;
use enrollpay_api::events::Event;
use enrollpay_api::models::{MobileMoneyProvider, PaymentType};
use enrollpay_api::services::settlements::InitiateOnlinePaymentRequest;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn initiate(
    enrollment_id: Uuid,
    provider: MobileMoneyProvider,
    mode: PaymentType,
) -> InitiateOnlinePaymentRequest {
    InitiateOnlinePaymentRequest {
        enrollment_id,
        payer_phone: None,
        provider,
        mode,
    }
}

// ==================== Full payment ====================

#[tokio::test]
async fn full_online_payment_settles_and_issues_receipt() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(100000), 1).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    let payment = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            initiate(enrollment.id, MobileMoneyProvider::Mtn, PaymentType::Full),
        )
        .await
        .expect("payment should succeed");

    assert_eq!(payment.amount, dec!(100000));
    assert_eq!(payment.payment_type, "full");
    assert_eq!(payment.installment_number, 1);
    assert_eq!(payment.total_installments, 1);
    assert_eq!(payment.status, "successful");
    assert!(payment.receipt_number.is_some());
    assert!(payment.paid_at.is_some());
    assert!(payment.provider_transaction_id.is_some());
    assert!(payment.failure_reason.is_none());
    assert!(!payment.manual_entry);
    // Whitespace stripped from the enrollment's contact number.
    assert_eq!(payment.payer_phone.as_deref(), Some("+237670000001"));

    let snapshot = app.settlements.ledger(enrollment.id).await.unwrap();
    assert_eq!(snapshot.paid_amount, dec!(100000));
    assert_eq!(snapshot.remaining_amount, dec!(0));
    assert!(!snapshot.can_pay);

    match app.next_event() {
        Some(Event::PaymentSucceeded {
            payment_id,
            receipt_number,
            ..
        }) => {
            assert_eq!(payment_id, payment.id);
            assert_eq!(Some(receipt_number), payment.receipt_number);
        }
        other => panic!("expected PaymentSucceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn installment_payment_collects_one_slice() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(100000), 4).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    let payment = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            initiate(
                enrollment.id,
                MobileMoneyProvider::Orange,
                PaymentType::Installment,
            ),
        )
        .await
        .expect("installment should succeed");

    assert_eq!(payment.amount, dec!(25000));
    assert_eq!(payment.payment_type, "installment");
    assert_eq!(payment.installment_number, 1);
    assert_eq!(payment.total_installments, 4);

    let snapshot = app.settlements.ledger(enrollment.id).await.unwrap();
    assert_eq!(snapshot.remaining_amount, dec!(75000));
    assert_eq!(snapshot.next_installment_number, 2);
}

// ==================== Gateway failure accounting ====================

#[tokio::test]
async fn gateway_decline_persists_failed_payment() {
    let app = TestApp::with_gateway(GatewayBehavior::Decline {
        message: "insufficient funds".to_string(),
    })
    .await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(50000), 1).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    let err = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            initiate(enrollment.id, MobileMoneyProvider::Mtn, PaymentType::Full),
        )
        .await
        .expect_err("decline should surface");

    match err {
        ServiceError::GatewayDecline(message) => assert_eq!(message, "insufficient funds"),
        other => panic!("expected GatewayDecline, got {:?}", other),
    }

    // The attempt is persisted for audit, terminal and receipt-less.
    let history = app
        .settlements
        .payments_for_enrollment(enrollment.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, "failed");
    assert_eq!(history[0].failure_reason.as_deref(), Some("insufficient funds"));
    assert!(history[0].receipt_number.is_none());
    assert!(history[0].paid_at.is_none());

    let snapshot = app.settlements.ledger(enrollment.id).await.unwrap();
    assert_eq!(snapshot.remaining_amount, dec!(50000));
}

#[tokio::test]
async fn gateway_transport_failure_persists_failed_payment() {
    let app = TestApp::with_gateway(GatewayBehavior::TransportFailure).await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(50000), 1).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    let err = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            initiate(enrollment.id, MobileMoneyProvider::Mtn, PaymentType::Full),
        )
        .await
        .expect_err("transport failure should surface");
    assert!(matches!(err, ServiceError::GatewayTransport(_)));

    let history = app
        .settlements
        .payments_for_enrollment(enrollment.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, "failed");
    assert!(history[0].failure_reason.is_some());
    assert!(history[0].receipt_number.is_none());

    // No automatic retry: a resubmission is a brand-new row.
    app.gateway.set_behavior(GatewayBehavior::Approve);
    let retry = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            initiate(enrollment.id, MobileMoneyProvider::Mtn, PaymentType::Full),
        )
        .await
        .expect("retry should succeed");

    let history = app
        .settlements
        .payments_for_enrollment(enrollment.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_ne!(history[0].reference, history[1].reference);
    assert_eq!(retry.status, "successful");
}

// ==================== Business-rule rejections ====================

#[tokio::test]
async fn settled_enrollment_rejects_new_attempts_before_any_write() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(80000), 1).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    app.settlements
        .initiate_online_payment(
            &owner(user),
            initiate(enrollment.id, MobileMoneyProvider::Mtn, PaymentType::Full),
        )
        .await
        .expect("first payment succeeds");

    let err = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            initiate(enrollment.id, MobileMoneyProvider::Mtn, PaymentType::Full),
        )
        .await
        .expect_err("second attempt must be rejected");
    assert!(matches!(err, ServiceError::AlreadySettled(_)));

    // Rejected before any row was written and before the gateway was called.
    let history = app
        .settlements
        .payments_for_enrollment(enrollment.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(app.gateway.call_count(), 1);
}

#[tokio::test]
async fn free_offering_is_not_payable() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(0), 1).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    let err = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            initiate(enrollment.id, MobileMoneyProvider::Mtn, PaymentType::Full),
        )
        .await
        .expect_err("free offering is not payable");
    assert!(matches!(err, ServiceError::AlreadySettled(_)));
}

#[tokio::test]
async fn non_owner_cannot_pay_but_admin_can() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(60000), 2).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    let err = app
        .settlements
        .initiate_online_payment(
            &owner(Uuid::new_v4()),
            initiate(enrollment.id, MobileMoneyProvider::Mtn, PaymentType::Full),
        )
        .await
        .expect_err("stranger must be rejected");
    assert!(matches!(err, ServiceError::Forbidden(_)));

    app.settlements
        .initiate_online_payment(
            &admin(),
            initiate(
                enrollment.id,
                MobileMoneyProvider::Mtn,
                PaymentType::Installment,
            ),
        )
        .await
        .expect("admin may settle on the payer's behalf");
}

#[tokio::test]
async fn unaccepted_enrollment_is_rejected() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(60000), 2).await;

    for status in ["pending", "rejected"] {
        let enrollment = app.seed_enrollment(&offering, user, status).await;
        let err = app
            .settlements
            .initiate_online_payment(
                &owner(user),
                initiate(enrollment.id, MobileMoneyProvider::Mtn, PaymentType::Full),
            )
            .await
            .expect_err("unaccepted enrollment must be rejected");
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }
}

// ==================== Plan completion ====================

#[tokio::test]
async fn repeated_installments_settle_the_plan_exactly() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(100000), 4).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    // Each attempt recomputes the ledger under the enrollment lock, so the
    // attempts observe strictly increasing installment numbers.
    for expected in 1..=4 {
        let payment = app
            .settlements
            .initiate_online_payment(
                &owner(user),
                initiate(
                    enrollment.id,
                    MobileMoneyProvider::Mtn,
                    PaymentType::Installment,
                ),
            )
            .await
            .expect("installment should succeed");
        assert_eq!(payment.installment_number, expected);
        assert_eq!(payment.amount, dec!(25000));
    }

    // The plan is complete: no fifth row, no over-collection.
    let err = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            initiate(
                enrollment.id,
                MobileMoneyProvider::Mtn,
                PaymentType::Installment,
            ),
        )
        .await
        .expect_err("plan is settled");
    assert!(matches!(err, ServiceError::AlreadySettled(_)));

    let history = app
        .settlements
        .payments_for_enrollment(enrollment.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 4);
    let mut numbers: Vec<i32> = history.iter().map(|p| p.installment_number).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2, 3, 4]);

    let snapshot = app.settlements.ledger(enrollment.id).await.unwrap();
    assert_eq!(snapshot.paid_amount, dec!(100000));
    assert_eq!(snapshot.remaining_amount, dec!(0));
}

#[tokio::test]
async fn final_installment_collects_only_the_residue() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(100000), 3).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    let request =
        |mode| initiate(enrollment.id, MobileMoneyProvider::Mtn, mode);

    let first = app
        .settlements
        .initiate_online_payment(&owner(user), request(PaymentType::Installment))
        .await
        .unwrap();
    let second = app
        .settlements
        .initiate_online_payment(&owner(user), request(PaymentType::Installment))
        .await
        .unwrap();
    let last = app
        .settlements
        .initiate_online_payment(&owner(user), request(PaymentType::Installment))
        .await
        .unwrap();

    assert_eq!(first.amount, dec!(33333.33));
    assert_eq!(second.amount, dec!(33333.33));
    // The last slice is capped at the remaining balance.
    assert_eq!(last.amount, dec!(33333.34));

    let snapshot = app.settlements.ledger(enrollment.id).await.unwrap();
    assert_eq!(snapshot.remaining_amount, dec!(0));
}

// ==================== Terminal-state exclusivity ====================

#[tokio::test]
async fn no_payment_ever_pairs_receipt_with_non_successful_status() {
    let app = TestApp::with_gateway(GatewayBehavior::Decline {
        message: "wallet locked".to_string(),
    })
    .await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(40000), 2).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    let _ = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            initiate(
                enrollment.id,
                MobileMoneyProvider::Mtn,
                PaymentType::Installment,
            ),
        )
        .await;
    app.gateway.set_behavior(GatewayBehavior::Approve);
    let _ = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            initiate(
                enrollment.id,
                MobileMoneyProvider::Mtn,
                PaymentType::Installment,
            ),
        )
        .await;

    for payment in app
        .settlements
        .payments_for_enrollment(enrollment.id)
        .await
        .unwrap()
    {
        match payment.status.as_str() {
            "successful" => {
                assert!(payment.receipt_number.is_some());
                assert!(payment.paid_at.is_some());
            }
            _ => {
                assert!(payment.receipt_number.is_none());
                assert!(payment.paid_at.is_none());
            }
        }
    }
}
