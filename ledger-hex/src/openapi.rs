//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use ledger_types::domain::{
    AccountStatus, AccountType, Direction, ErrorCode, GroupId, OwnerId, ProductType, Role,
    ServiceType, ThresholdProfileId, TransferId, TransferStatus, ViolationKind, WalletId,
    WalletKind, WalletStatus, Window,
};
use ledger_types::dto::{
    AccountView, BalanceCheckResponse, CreateProfileRequest, CreateWalletRequest, LimitsView,
    LineItemView, PaymentRequest, ProductStatusRequest, ProfileView, RegisterAccountRequest,
    RemainingLimitsResponse, SetLimitsRequest, ThresholdCheckResponse, TransferPage,
    TransferRequest, TransferResponse, TransferView, ValidateThresholdRequest, ViolationView,
    WalletAdjustmentRequest, WalletView, WindowAllowanceView,
};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Move money between two MAIN wallets
#[utoipa::path(
    post,
    path = "/api/transfers",
    tag = "transfers",
    request_body = TransferRequest,
    responses(
        (status = 201, description = "Transfer succeeded", body = TransferResponse),
        (status = 200, description = "Replayed from an earlier attempt with the same idempotency key", body = TransferResponse),
        (status = 400, description = "Invalid request or reused idempotency key"),
        (status = 404, description = "Wallet, account or limits not found"),
        (status = 409, description = "Concurrency conflict, safe to retry"),
        (status = 422, description = "Insufficient balance or threshold violation")
    )
)]
async fn create_transfer() {}

/// Merchant-to-subscriber recharge
#[utoipa::path(
    post,
    path = "/api/transfers/recharge",
    tag = "transfers",
    request_body = PaymentRequest,
    responses(
        (status = 201, description = "Recharge succeeded", body = TransferResponse),
        (status = 401, description = "Invalid PIN"),
        (status = 403, description = "Actor account inactive"),
        (status = 422, description = "Product unavailable, insufficient balance or threshold violation")
    )
)]
async fn recharge() {}

/// Bill payment
#[utoipa::path(
    post,
    path = "/api/transfers/bill-payment",
    tag = "transfers",
    request_body = PaymentRequest,
    responses(
        (status = 201, description = "Bill paid", body = TransferResponse),
        (status = 401, description = "Invalid PIN"),
        (status = 403, description = "Actor account inactive"),
        (status = 422, description = "Product unavailable, insufficient balance or threshold violation")
    )
)]
async fn bill_payment() {}

/// Get a transfer with its line items
#[utoipa::path(
    get,
    path = "/api/transfers/{id}",
    tag = "transfers",
    params(("id" = String, Path, description = "Transfer ID")),
    responses(
        (status = 200, description = "Transfer details", body = TransferView),
        (status = 404, description = "Transfer not found")
    )
)]
async fn get_transfer() {}

/// List a party's transfers, newest first
#[utoipa::path(
    get,
    path = "/api/parties/{owner}/transfers",
    tag = "transfers",
    params(
        ("owner" = String, Path, description = "Owner ID"),
        ("status" = Option<String>, Query, description = "SUCCESS, FAILED, PENDING or ALL"),
        ("from" = Option<String>, Query, description = "Inclusive lower bound (RFC 3339)"),
        ("to" = Option<String>, Query, description = "Exclusive upper bound (RFC 3339)"),
        ("page" = Option<u32>, Query, description = "One-based page"),
        ("limit" = Option<u32>, Query, description = "Page size, at most 100")
    ),
    responses(
        (status = 200, description = "One page of transfers", body = TransferPage),
        (status = 400, description = "Invalid filter")
    )
)]
async fn list_transfers() {}

/// Check an amount against a party's limits
#[utoipa::path(
    post,
    path = "/api/thresholds/validate",
    tag = "thresholds",
    request_body = ValidateThresholdRequest,
    responses(
        (status = 200, description = "Every violated window and check", body = ThresholdCheckResponse),
        (status = 404, description = "Account, profile or limits not found")
    )
)]
async fn validate_thresholds() {}

/// Used and remaining allowance per window
#[utoipa::path(
    get,
    path = "/api/parties/{owner}/limits",
    tag = "thresholds",
    params(
        ("owner" = String, Path, description = "Owner ID"),
        ("role" = Option<String>, Query, description = "PAYER (default) or PAYEE"),
        ("group_id" = Option<String>, Query, description = "Threshold group, DEFAULT when absent")
    ),
    responses(
        (status = 200, description = "Remaining limits", body = RemainingLimitsResponse),
        (status = 404, description = "Account, profile or limits not found")
    )
)]
async fn remaining_limits() {}

/// Create a threshold profile
#[utoipa::path(
    post,
    path = "/api/thresholds/profiles",
    tag = "thresholds",
    request_body = CreateProfileRequest,
    responses(
        (status = 201, description = "Profile created", body = ProfileView),
        (status = 400, description = "Invalid request")
    )
)]
async fn create_profile() {}

/// Set the daily caps of one group
#[utoipa::path(
    put,
    path = "/api/thresholds/profiles/{id}/limits/{group}",
    tag = "thresholds",
    request_body = SetLimitsRequest,
    params(
        ("id" = String, Path, description = "Threshold profile ID"),
        ("group" = String, Path, description = "Threshold group")
    ),
    responses(
        (status = 200, description = "Limits stored", body = LimitsView),
        (status = 404, description = "Profile not found")
    )
)]
async fn set_limits() {}

/// Open a wallet for a registered account
#[utoipa::path(
    post,
    path = "/api/wallets",
    tag = "wallets",
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Wallet opened", body = WalletView),
        (status = 400, description = "Wallet of this kind already exists"),
        (status = 404, description = "Account not found")
    )
)]
async fn create_wallet() {}

/// Get a party's wallet
#[utoipa::path(
    get,
    path = "/api/parties/{owner}/wallet",
    tag = "wallets",
    params(
        ("owner" = String, Path, description = "Owner ID"),
        ("kind" = Option<String>, Query, description = "MAIN (default) or COMMISSION")
    ),
    responses(
        (status = 200, description = "Wallet details", body = WalletView),
        (status = 404, description = "Wallet not found")
    )
)]
async fn get_wallet() {}

/// Check whether a wallet covers an amount
#[utoipa::path(
    get,
    path = "/api/parties/{owner}/wallet/balance-check",
    tag = "wallets",
    params(
        ("owner" = String, Path, description = "Owner ID"),
        ("amount" = String, Query, description = "Amount in major units"),
        ("kind" = Option<String>, Query, description = "MAIN (default) or COMMISSION")
    ),
    responses(
        (status = 200, description = "Balance check", body = BalanceCheckResponse),
        (status = 404, description = "Wallet not found")
    )
)]
async fn check_balance() {}

/// Credit a wallet outside any transfer
#[utoipa::path(
    post,
    path = "/api/parties/{owner}/wallet/credit",
    tag = "wallets",
    request_body = WalletAdjustmentRequest,
    params(("owner" = String, Path, description = "Owner ID")),
    responses(
        (status = 200, description = "Wallet after the credit", body = WalletView),
        (status = 404, description = "Wallet not found or inactive")
    )
)]
async fn credit_wallet() {}

/// Debit a wallet outside any transfer
#[utoipa::path(
    post,
    path = "/api/parties/{owner}/wallet/debit",
    tag = "wallets",
    request_body = WalletAdjustmentRequest,
    params(("owner" = String, Path, description = "Owner ID")),
    responses(
        (status = 200, description = "Wallet after the debit", body = WalletView),
        (status = 404, description = "Wallet not found or inactive"),
        (status = 422, description = "Insufficient balance")
    )
)]
async fn debit_wallet() {}

/// Register or replace an account
#[utoipa::path(
    post,
    path = "/api/accounts",
    tag = "accounts",
    request_body = RegisterAccountRequest,
    responses(
        (status = 201, description = "Account registered", body = AccountView),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Threshold profile not found")
    )
)]
async fn register_account() {}

/// Get an account
#[utoipa::path(
    get,
    path = "/api/accounts/{owner}",
    tag = "accounts",
    params(("owner" = String, Path, description = "Owner ID")),
    responses(
        (status = 200, description = "Account details", body = AccountView),
        (status = 404, description = "Account not found")
    )
)]
async fn get_account() {}

/// Enable or disable a product
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "accounts",
    request_body = ProductStatusRequest,
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product status changed")
    )
)]
async fn set_product_status() {}

/// OpenAPI documentation for the Ledger API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wallet Ledger API",
        version = "1.0.0",
        description = "Wallet ledger with all-or-nothing transfers, multi-window limits and idempotent resubmission.\n\nAmounts are decimal strings in major units with at most two decimal places. Requests are rate limited per caller; send an `X-Caller-Id` header to get your own quota.",
        license(name = "MIT"),
    ),
    paths(
        health,
        create_transfer,
        recharge,
        bill_payment,
        get_transfer,
        list_transfers,
        validate_thresholds,
        remaining_limits,
        create_profile,
        set_limits,
        create_wallet,
        get_wallet,
        check_balance,
        credit_wallet,
        debit_wallet,
        register_account,
        get_account,
        set_product_status,
    ),
    components(
        schemas(
            TransferRequest,
            PaymentRequest,
            TransferResponse,
            TransferView,
            LineItemView,
            TransferPage,
            ValidateThresholdRequest,
            ThresholdCheckResponse,
            ViolationView,
            RemainingLimitsResponse,
            WindowAllowanceView,
            CreateProfileRequest,
            ProfileView,
            SetLimitsRequest,
            LimitsView,
            CreateWalletRequest,
            WalletView,
            WalletAdjustmentRequest,
            BalanceCheckResponse,
            RegisterAccountRequest,
            AccountView,
            ProductStatusRequest,
            OwnerId,
            TransferId,
            WalletId,
            GroupId,
            ThresholdProfileId,
            AccountType,
            AccountStatus,
            WalletKind,
            WalletStatus,
            TransferStatus,
            Direction,
            ErrorCode,
            ServiceType,
            ProductType,
            Role,
            Window,
            ViolationKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "transfers", description = "Transfers, recharges, bill payments and history"),
        (name = "thresholds", description = "Limit profiles and validation"),
        (name = "wallets", description = "Wallet lifecycle, reads and adjustments"),
        (name = "accounts", description = "Account directory and product catalog"),
    )
)]
pub struct ApiDoc;
