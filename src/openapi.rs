use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EnrollPay API",
        version = "0.3.0",
        description = r#"
# EnrollPay Settlement API

Turns an accepted enrollment into correctly-accounted monetary transactions:
online mobile-money collection, administrator-recorded out-of-band payments,
installment tracking, and verifiable receipts.

## Authentication

All payment endpoints require a JWT bearer token:

```
Authorization: Bearer <your-jwt-token>
```

The receipt verification endpoint is public; the receipt number printed on
the document is the capability.

## Error Handling

Errors use a consistent JSON shape with appropriate status codes. Business
rejections (already settled, overpayment) return 422; a provider decline
returns 402; a gateway transport fault returns 502.
        "#,
        contact(name = "EnrollPay Support", email = "support@enrollpay.dev"),
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    paths(
        crate::handlers::payments::initiate_payment,
        crate::handlers::payments::record_manual_payment,
        crate::handlers::payments::edit_payment,
        crate::handlers::payments::get_payment,
        crate::handlers::payments::list_payments,
        crate::handlers::payments::get_enrollment_payments,
        crate::handlers::payments::get_enrollment_ledger,
        crate::handlers::payments::request_payment_reminder,
        crate::handlers::payments::get_receipt,
        crate::handlers::payments::verify_receipt,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::ledger::LedgerSnapshot,
        crate::models::PaymentStatus,
        crate::models::PaymentType,
        crate::models::PaymentChannel,
        crate::models::MobileMoneyProvider,
        crate::services::settlements::InitiateOnlinePaymentRequest,
        crate::services::settlements::RecordManualPaymentRequest,
        crate::services::settlements::EditPaymentRequest,
        crate::services::settlements::PaymentResponse,
        crate::services::receipts::ReceiptDocument,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Payments", description = "Settlement and manual-entry endpoints"),
        (name = "Receipts", description = "Receipt rendering and verification")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI router serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
