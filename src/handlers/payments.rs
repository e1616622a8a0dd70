use super::common::PaginationParams;
use crate::auth::{consts as perm, AuthenticatedUser};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::ledger::LedgerSnapshot;
use crate::models::PaymentStatus;
use crate::services::receipts::ReceiptDocument;
use crate::services::settlements::{
    Actor, EditPaymentRequest, InitiateOnlinePaymentRequest, PaymentResponse,
    RecordManualPaymentRequest,
};
use crate::ApiResponse;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct PaymentStatusFilter {
    /// Filter by payment status (pending, successful, failed)
    #[schema(example = "successful")]
    pub status: Option<String>,
}

fn actor_for(user: &AuthenticatedUser) -> Actor {
    Actor {
        user_id: user.user_id,
        is_admin: user.has_permission(perm::PAYMENTS_ADMIN),
    }
}

// Handler functions

/// Initiate an online mobile-money payment for an enrollment
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = InitiateOnlinePaymentRequest,
    responses(
        (status = 201, description = "Payment collected", body = crate::ApiResponse<PaymentResponse>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse),
        (status = 402, description = "Provider declined the charge", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 422, description = "Nothing left to collect", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway unreachable", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn initiate_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<InitiateOnlinePaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), ServiceError> {
    if !user.has_permission(perm::PAYMENTS_WRITE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }

    let payment = state
        .services
        .settlements
        .initiate_online_payment(&actor_for(&user), request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(payment))))
}

/// Record an out-of-band collection (cash, bank transfer, on-site)
#[utoipa::path(
    post,
    path = "/api/v1/payments/manual",
    request_body = RecordManualPaymentRequest,
    responses(
        (status = 201, description = "Manual payment recorded", body = crate::ApiResponse<PaymentResponse>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 422, description = "Overpayment or already settled", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn record_manual_payment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<RecordManualPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), ServiceError> {
    if !user.has_permission(perm::PAYMENTS_ADMIN) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }

    let payment = state
        .services
        .settlements
        .record_manual_payment(&actor_for(&user), request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(payment))))
}

/// Edit the terminal fields of an existing payment
#[utoipa::path(
    put,
    path = "/api/v1/payments/:payment_id",
    params(("payment_id" = i64, Path, description = "Payment ID")),
    request_body = EditPaymentRequest,
    responses(
        (status = 200, description = "Payment updated", body = crate::ApiResponse<PaymentResponse>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Overpayment", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn edit_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
    user: AuthenticatedUser,
    Json(request): Json<EditPaymentRequest>,
) -> Result<Json<ApiResponse<PaymentResponse>>, ServiceError> {
    if !user.has_permission(perm::PAYMENTS_ADMIN) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }

    let payment = state
        .services
        .settlements
        .edit_payment(&actor_for(&user), payment_id, request)
        .await?;
    Ok(Json(ApiResponse::success(payment)))
}

/// Get payment by ID
#[utoipa::path(
    get,
    path = "/api/v1/payments/:payment_id",
    params(("payment_id" = i64, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment details", body = crate::ApiResponse<PaymentResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<PaymentResponse>>, ServiceError> {
    if !user.has_permission(perm::PAYMENTS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }

    let payment = state.services.settlements.get_payment(payment_id).await?;
    Ok(Json(ApiResponse::success(payment)))
}

/// List payments with pagination and status filtering
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    params(PaginationParams, PaymentStatusFilter),
    responses(
        (status = 200, description = "List payments", body = crate::ApiResponse<crate::PaginatedResponse<PaymentResponse>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<PaymentStatusFilter>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<crate::PaginatedResponse<PaymentResponse>>>, ServiceError> {
    if !user.has_permission(perm::PAYMENTS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }

    let status_filter = match filter.status {
        Some(value) => Some(parse_status_filter(&value)?),
        None => None,
    };

    let page = params.page;
    let limit = params.per_page;
    let (payments, total) = state
        .services
        .settlements
        .list_payments(page, limit, status_filter)
        .await?;

    let response = crate::PaginatedResponse {
        items: payments,
        total,
        page,
        limit,
        total_pages: (total + limit - 1) / limit.max(1),
    };

    Ok(Json(ApiResponse::success(response)))
}

/// Payment history for an enrollment
#[utoipa::path(
    get,
    path = "/api/v1/payments/enrollment/:enrollment_id",
    params(("enrollment_id" = Uuid, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Payments for enrollment", body = crate::ApiResponse<Vec<PaymentResponse>>)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn get_enrollment_payments(
    State(state): State<AppState>,
    Path(enrollment_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<PaymentResponse>>>, ServiceError> {
    if !user.has_permission(perm::PAYMENTS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }

    let payments = state
        .services
        .settlements
        .payments_for_enrollment(enrollment_id)
        .await?;
    Ok(Json(ApiResponse::success(payments)))
}

/// Current balance snapshot for an enrollment
#[utoipa::path(
    get,
    path = "/api/v1/payments/enrollment/:enrollment_id/ledger",
    params(("enrollment_id" = Uuid, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Ledger snapshot", body = crate::ApiResponse<LedgerSnapshot>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn get_enrollment_ledger(
    State(state): State<AppState>,
    Path(enrollment_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<LedgerSnapshot>>, ServiceError> {
    if !user.has_permission(perm::PAYMENTS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }

    let snapshot = state.services.settlements.ledger(enrollment_id).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// Queue a balance reminder notification for an enrollment
#[utoipa::path(
    post,
    path = "/api/v1/payments/enrollment/:enrollment_id/remind",
    params(("enrollment_id" = Uuid, Path, description = "Enrollment ID")),
    responses(
        (status = 202, description = "Reminder queued", body = crate::ApiResponse<LedgerSnapshot>),
        (status = 422, description = "Nothing owed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn request_payment_reminder(
    State(state): State<AppState>,
    Path(enrollment_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<(StatusCode, Json<ApiResponse<LedgerSnapshot>>), ServiceError> {
    if !user.has_permission(perm::PAYMENTS_ADMIN) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }

    let snapshot = state
        .services
        .settlements
        .request_payment_reminder(enrollment_id)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(snapshot))))
}

/// Rendered receipt for a successful payment
#[utoipa::path(
    get,
    path = "/api/v1/payments/:payment_id/receipt",
    params(("payment_id" = i64, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Receipt document", body = crate::ApiResponse<ReceiptDocument>),
        (status = 404, description = "No receipt for this payment", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Receipts"
)]
pub async fn get_receipt(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<ReceiptDocument>>, ServiceError> {
    if !user.has_permission(perm::PAYMENTS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }

    let receipt = state.services.receipts.receipt_document(payment_id).await?;
    Ok(Json(ApiResponse::success(receipt)))
}

/// Resolve a circulating receipt verification reference
///
/// This endpoint is public: the receipt number itself is the capability, and
/// printed receipts embed it in their scannable code.
#[utoipa::path(
    get,
    path = "/api/v1/receipts/verify/:receipt_number",
    params(("receipt_number" = String, Path, description = "Receipt number")),
    responses(
        (status = 200, description = "Canonical receipt", body = crate::ApiResponse<ReceiptDocument>),
        (status = 404, description = "Unknown receipt number", body = crate::errors::ErrorResponse)
    ),
    tag = "Receipts"
)]
pub async fn verify_receipt(
    State(state): State<AppState>,
    Path(receipt_number): Path<String>,
) -> Result<Json<ApiResponse<ReceiptDocument>>, ServiceError> {
    let receipt = state.services.receipts.verify(&receipt_number).await?;
    Ok(Json(ApiResponse::success(receipt)))
}

/// Payment routes
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(initiate_payment))
        .route("/", get(list_payments))
        .route("/manual", post(record_manual_payment))
        .route("/:payment_id", get(get_payment))
        .route("/:payment_id", put(edit_payment))
        .route("/:payment_id/receipt", get(get_receipt))
        .route("/enrollment/:enrollment_id", get(get_enrollment_payments))
        .route(
            "/enrollment/:enrollment_id/ledger",
            get(get_enrollment_ledger),
        )
        .route(
            "/enrollment/:enrollment_id/remind",
            post(request_payment_reminder),
        )
}

/// Receipt verification routes (unauthenticated)
pub fn receipt_routes() -> Router<AppState> {
    Router::new().route("/verify/:receipt_number", get(verify_receipt))
}

fn parse_status_filter(value: &str) -> Result<PaymentStatus, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(
            "status filter cannot be empty".to_string(),
        ));
    }

    trimmed
        .to_ascii_lowercase()
        .parse::<PaymentStatus>()
        .map_err(|_| {
            ServiceError::ValidationError(format!("invalid payment status filter: {}", trimmed))
        })
}
