//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use ledger_types::{
    AppError, BalanceCheckQuery, CreateProfileRequest, CreateWalletRequest, ErrorCode, GroupId,
    LedgerRepository, ListTransfersQuery, OwnerId, PaymentRequest, ProductStatusRequest,
    RegisterAccountRequest, RemainingLimitsQuery, ServiceType, SetLimitsRequest,
    ThresholdProfileId, TransferId, TransferRejection, TransferRequest, TransferResponse,
    ValidateThresholdRequest, ViolationView, WalletAdjustmentRequest, WalletQuery,
};

use crate::LedgerService;

/// Application state shared across handlers.
pub struct AppState<R: LedgerRepository> {
    pub service: LedgerService<R>,
}

/// Wrapper to implement IntoResponse for rejections (orphan rule workaround).
pub struct ApiError(pub TransferRejection);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err.into())
    }
}

impl From<TransferRejection> for ApiError {
    fn from(rejection: TransferRejection) -> Self {
        ApiError(rejection)
    }
}

/// HTTP status for a stable error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::BadRequest | ErrorCode::InvalidAmount => StatusCode::BAD_REQUEST,
        ErrorCode::InvalidCredential => StatusCode::UNAUTHORIZED,
        ErrorCode::AccountInactive => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ConcurrencyConflict => StatusCode::CONFLICT,
        ErrorCode::InsufficientBalance
        | ErrorCode::ThresholdViolation
        | ErrorCode::ProductUnavailable => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let TransferRejection { transfer_id, error } = self.0;
        let code = error.code();
        let status = status_for(code);
        if status.is_server_error() {
            tracing::error!(error = %error, "Request failed");
        }

        let mut body = serde_json::json!({
            "error": error.to_string(),
            "code": status.as_u16(),
            "error_code": code,
        });
        if let Some(id) = transfer_id {
            body["transfer_id"] = serde_json::json!(id);
        }
        if let AppError::ThresholdViolation(violations) = &error {
            let views: Vec<ViolationView> = violations.iter().map(ViolationView::from).collect();
            body["violations"] = serde_json::json!(views);
        }

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Transfers
// ─────────────────────────────────────────────────────────────────────────────

// New transfers are 201, replays 200.
fn transfer_reply(response: TransferResponse) -> Response {
    let status = if response.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    (status, Json(response)).into_response()
}

/// Runs a transfer on its own task. A dropped connection cancels the
/// handler, never a transfer that already started.
async fn run_transfer<R: LedgerRepository>(
    state: Arc<AppState<R>>,
    req: TransferRequest,
) -> Result<Response, ApiError> {
    let outcome = tokio::spawn(async move { state.service.process_transfer(req).await })
        .await
        .map_err(|e| AppError::Internal(format!("Transfer task failed: {}", e)))?;
    Ok(transfer_reply(outcome?))
}

async fn run_payment<R: LedgerRepository>(
    state: Arc<AppState<R>>,
    req: PaymentRequest,
) -> Result<Response, ApiError> {
    let outcome = tokio::spawn(async move { state.service.process_payment(req).await })
        .await
        .map_err(|e| AppError::Internal(format!("Payment task failed: {}", e)))?;
    Ok(transfer_reply(outcome?))
}

/// Peer transfer between MAIN wallets.
#[tracing::instrument(skip(state, req), fields(payer = %req.payer_id, payee = %req.payee_id))]
pub async fn create_transfer<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<TransferRequest>,
) -> Result<Response, ApiError> {
    run_transfer(state, req).await
}

/// Merchant-to-subscriber recharge.
#[tracing::instrument(skip(state, req), fields(payer = %req.transfer.payer_id, product = %req.product_id))]
pub async fn recharge<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(mut req): Json<PaymentRequest>,
) -> Result<Response, ApiError> {
    req.transfer.service_type = ServiceType::Recharge;
    run_payment(state, req).await
}

#[tracing::instrument(skip(state, req), fields(payer = %req.transfer.payer_id, product = %req.product_id))]
pub async fn bill_payment<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(mut req): Json<PaymentRequest>,
) -> Result<Response, ApiError> {
    req.transfer.service_type = ServiceType::BillPayment;
    run_payment(state, req).await
}

/// Get a transfer with its line items.
#[tracing::instrument(skip(state))]
pub async fn get_transfer<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<TransferId>,
) -> Result<impl IntoResponse, ApiError> {
    let transfer = state.service.get_transfer(&id).await?;
    Ok(Json(transfer))
}

#[tracing::instrument(skip(state, query))]
pub async fn list_transfers<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(owner): Path<OwnerId>,
    Query(query): Query<ListTransfersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.service.list_transfers(&owner, query).await?;
    Ok(Json(page))
}

// ─────────────────────────────────────────────────────────────────────────────
// Thresholds
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, req), fields(owner = %req.owner_id))]
pub async fn validate_thresholds<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<ValidateThresholdRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let check = state.service.validate_thresholds(req).await?;
    Ok(Json(check))
}

#[tracing::instrument(skip(state, query))]
pub async fn remaining_limits<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(owner): Path<OwnerId>,
    Query(query): Query<RemainingLimitsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limits = state.service.remaining_limits(&owner, query).await?;
    Ok(Json(limits))
}

#[tracing::instrument(skip(state, req), fields(name = %req.name))]
pub async fn create_profile<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.service.create_profile(req).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Insert or replace the daily caps of one group.
#[tracing::instrument(skip(state, req))]
pub async fn set_limits<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path((profile_id, group_id)): Path<(ThresholdProfileId, GroupId)>,
    Json(req): Json<SetLimitsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let limits = state.service.set_limits(profile_id, group_id, req).await?;
    Ok(Json(limits))
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallets
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, req), fields(owner = %req.owner_id, kind = %req.kind))]
pub async fn create_wallet<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<CreateWalletRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet = state.service.create_wallet(req).await?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

#[tracing::instrument(skip(state, query))]
pub async fn get_wallet<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(owner): Path<OwnerId>,
    Query(query): Query<WalletQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet = state.service.wallet(&owner, query).await?;
    Ok(Json(wallet))
}

#[tracing::instrument(skip(state, query))]
pub async fn check_balance<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(owner): Path<OwnerId>,
    Query(query): Query<BalanceCheckQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let check = state.service.check_balance(&owner, query).await?;
    Ok(Json(check))
}

#[tracing::instrument(skip(state, req), fields(amount = %req.amount))]
pub async fn credit_wallet<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(owner): Path<OwnerId>,
    Json(req): Json<WalletAdjustmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet = state.service.credit_wallet(&owner, req).await?;
    Ok(Json(wallet))
}

#[tracing::instrument(skip(state, req), fields(amount = %req.amount))]
pub async fn debit_wallet<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(owner): Path<OwnerId>,
    Json(req): Json<WalletAdjustmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet = state.service.debit_wallet(&owner, req).await?;
    Ok(Json(wallet))
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory and catalog
// ─────────────────────────────────────────────────────────────────────────────

pub async fn register_account<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<RegisterAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.service.register_account(req).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[tracing::instrument(skip(state))]
pub async fn get_account<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(owner): Path<OwnerId>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.service.get_account(&owner).await?;
    Ok(Json(account))
}

#[tracing::instrument(skip(state, req), fields(active = req.active))]
pub async fn set_product_status<R: LedgerRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(product_id): Path<String>,
    Json(req): Json<ProductStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.set_product_status(&product_id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}
