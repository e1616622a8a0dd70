//! Integration tests for receipt rendering and verification.

mod common;

use common::{owner, GatewayBehavior, TestApp};
use enrollpay_api::errors::ServiceError;
use enrollpay_api::events::Event;
use enrollpay_api::models::{MobileMoneyProvider, PaymentType};
use enrollpay_api::services::settlements::InitiateOnlinePaymentRequest;
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn receipt_document_renders_with_verification_reference() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(100000), 1).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    let payment = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            InitiateOnlinePaymentRequest {
                enrollment_id: enrollment.id,
                payer_phone: None,
                provider: MobileMoneyProvider::Mtn,
                mode: PaymentType::Full,
            },
        )
        .await
        .unwrap();

    let receipt_number = payment.receipt_number.clone().unwrap();
    let document = app
        .receipts
        .receipt_document(payment.id)
        .await
        .expect("receipt should render");

    assert_eq!(document.receipt_number, receipt_number);
    assert_eq!(document.reference, payment.reference);
    assert_eq!(document.offering_name, "Fullstack Engineering Program");
    assert_eq!(document.amount, dec!(100000));
    assert_eq!(document.currency, "XAF");
    assert_eq!(document.payer_user_id, user);
    // The scannable code carries the resolvable verification URL.
    assert!(document.verification_url.ends_with(&format!(
        "/api/v1/receipts/verify/{}",
        receipt_number
    )));
    assert_eq!(document.qr_payload, document.verification_url);

    // A circulating reference resolves back to the same canonical receipt.
    let verified = app
        .receipts
        .verify(&receipt_number)
        .await
        .expect("verification should resolve");
    assert_eq!(verified.receipt_number, document.receipt_number);
    assert_eq!(verified.reference, document.reference);
    assert_eq!(verified.amount, document.amount);
}

#[tokio::test]
async fn failed_payment_has_no_receipt_to_render() {
    let app = TestApp::with_gateway(GatewayBehavior::Decline {
        message: "insufficient funds".to_string(),
    })
    .await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(50000), 1).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    let _ = app
        .settlements
        .initiate_online_payment(
            &owner(user),
            InitiateOnlinePaymentRequest {
                enrollment_id: enrollment.id,
                payer_phone: None,
                provider: MobileMoneyProvider::Mtn,
                mode: PaymentType::Full,
            },
        )
        .await;

    let failed = &app
        .settlements
        .payments_for_enrollment(enrollment.id)
        .await
        .unwrap()[0];

    let err = app
        .receipts
        .receipt_document(failed.id)
        .await
        .expect_err("failed payment has no receipt");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn unknown_receipt_number_does_not_verify() {
    let app = TestApp::new().await;
    let err = app
        .receipts
        .verify("RCPT-20260808-00009999")
        .await
        .expect_err("unknown receipt must not verify");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn reminder_emits_snapshot_for_outstanding_balance() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(100000), 4).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    app.settlements
        .initiate_online_payment(
            &owner(user),
            InitiateOnlinePaymentRequest {
                enrollment_id: enrollment.id,
                payer_phone: None,
                provider: MobileMoneyProvider::Mtn,
                mode: PaymentType::Installment,
            },
        )
        .await
        .unwrap();
    app.drain_events();

    let snapshot = app
        .settlements
        .request_payment_reminder(enrollment.id)
        .await
        .expect("reminder should queue");
    assert_eq!(snapshot.remaining_amount, dec!(75000));

    match app.next_event() {
        Some(Event::PaymentReminderRequested {
            enrollment_id,
            remaining_amount,
            next_installment_number,
            currency,
            ..
        }) => {
            assert_eq!(enrollment_id, enrollment.id);
            assert_eq!(remaining_amount, dec!(75000));
            assert_eq!(next_installment_number, 2);
            assert_eq!(currency, "XAF");
        }
        other => panic!("expected PaymentReminderRequested, got {:?}", other),
    }
}

#[tokio::test]
async fn reminder_is_rejected_when_nothing_is_owed() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let offering = app.seed_offering(dec!(100000), 1).await;
    let enrollment = app.seed_enrollment(&offering, user, "accepted").await;

    app.settlements
        .initiate_online_payment(
            &owner(user),
            InitiateOnlinePaymentRequest {
                enrollment_id: enrollment.id,
                payer_phone: None,
                provider: MobileMoneyProvider::Mtn,
                mode: PaymentType::Full,
            },
        )
        .await
        .unwrap();
    app.drain_events();

    let err = app
        .settlements
        .request_payment_reminder(enrollment.id)
        .await
        .expect_err("settled enrollments get no reminders");
    assert!(matches!(err, ServiceError::AlreadySettled(_)));
    assert!(app.next_event().is_none());
}
