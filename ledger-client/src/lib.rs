//! # Ledger Client SDK
//!
//! A typed Rust client for the wallet ledger API.

use ledger_types::{
    AccountView, BalanceCheckQuery, BalanceCheckResponse, CreateProfileRequest,
    CreateWalletRequest, GroupId, LimitsView, ListTransfersQuery, OwnerId, PaymentRequest,
    ProductStatusRequest, ProfileView, RegisterAccountRequest, RemainingLimitsQuery,
    RemainingLimitsResponse, SetLimitsRequest, ThresholdCheckResponse, ThresholdProfileId,
    TransferId, TransferPage, TransferRequest, TransferResponse, TransferView,
    ValidateThresholdRequest, WalletAdjustmentRequest, WalletQuery, WalletView,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Header the server keys its rate limit on.
const CALLER_HEADER: &str = "X-Caller-Id";

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        /// Stable code such as `INSUFFICIENT_BALANCE`
        error_code: Option<String>,
        /// Set when the server recorded the rejected transfer
        transfer_id: Option<String>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ledger API client.
pub struct LedgerClient {
    base_url: String,
    caller_id: Option<String>,
    http: Client,
}

impl LedgerClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            caller_id: None,
            http: Client::new(),
        }
    }

    /// Identifies the caller; the server rate limits per caller.
    pub fn with_caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transfers
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn transfer(&self, req: &TransferRequest) -> Result<TransferResponse, ClientError> {
        self.send(self.http.post(self.url("/api/transfers")).json(req))
            .await
    }

    pub async fn recharge(&self, req: &PaymentRequest) -> Result<TransferResponse, ClientError> {
        self.send(self.http.post(self.url("/api/transfers/recharge")).json(req))
            .await
    }

    pub async fn bill_payment(
        &self,
        req: &PaymentRequest,
    ) -> Result<TransferResponse, ClientError> {
        self.send(
            self.http
                .post(self.url("/api/transfers/bill-payment"))
                .json(req),
        )
        .await
    }

    /// Gets a transfer with its line items.
    pub async fn get_transfer(&self, id: &TransferId) -> Result<TransferView, ClientError> {
        self.send(self.http.get(self.url(&format!("/api/transfers/{}", id))))
            .await
    }

    pub async fn list_transfers(
        &self,
        owner: &OwnerId,
        query: &ListTransfersQuery,
    ) -> Result<TransferPage, ClientError> {
        self.send(
            self.http
                .get(self.url(&format!("/api/parties/{}/transfers", owner)))
                .query(query),
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Thresholds
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn validate_thresholds(
        &self,
        req: &ValidateThresholdRequest,
    ) -> Result<ThresholdCheckResponse, ClientError> {
        self.send(
            self.http
                .post(self.url("/api/thresholds/validate"))
                .json(req),
        )
        .await
    }

    pub async fn remaining_limits(
        &self,
        owner: &OwnerId,
        query: &RemainingLimitsQuery,
    ) -> Result<RemainingLimitsResponse, ClientError> {
        self.send(
            self.http
                .get(self.url(&format!("/api/parties/{}/limits", owner)))
                .query(query),
        )
        .await
    }

    pub async fn create_profile(
        &self,
        req: &CreateProfileRequest,
    ) -> Result<ProfileView, ClientError> {
        self.send(
            self.http
                .post(self.url("/api/thresholds/profiles"))
                .json(req),
        )
        .await
    }

    pub async fn set_limits(
        &self,
        profile_id: &ThresholdProfileId,
        group_id: &GroupId,
        req: &SetLimitsRequest,
    ) -> Result<LimitsView, ClientError> {
        let path = format!("/api/thresholds/profiles/{}/limits/{}", profile_id, group_id);
        self.send(self.http.put(self.url(&path)).json(req)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Wallets
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_wallet(&self, req: &CreateWalletRequest) -> Result<WalletView, ClientError> {
        self.send(self.http.post(self.url("/api/wallets")).json(req))
            .await
    }

    pub async fn wallet(
        &self,
        owner: &OwnerId,
        query: &WalletQuery,
    ) -> Result<WalletView, ClientError> {
        self.send(
            self.http
                .get(self.url(&format!("/api/parties/{}/wallet", owner)))
                .query(query),
        )
        .await
    }

    pub async fn check_balance(
        &self,
        owner: &OwnerId,
        query: &BalanceCheckQuery,
    ) -> Result<BalanceCheckResponse, ClientError> {
        self.send(
            self.http
                .get(self.url(&format!("/api/parties/{}/wallet/balance-check", owner)))
                .query(query),
        )
        .await
    }

    pub async fn credit(
        &self,
        owner: &OwnerId,
        req: &WalletAdjustmentRequest,
    ) -> Result<WalletView, ClientError> {
        self.send(
            self.http
                .post(self.url(&format!("/api/parties/{}/wallet/credit", owner)))
                .json(req),
        )
        .await
    }

    pub async fn debit(
        &self,
        owner: &OwnerId,
        req: &WalletAdjustmentRequest,
    ) -> Result<WalletView, ClientError> {
        self.send(
            self.http
                .post(self.url(&format!("/api/parties/{}/wallet/debit", owner)))
                .json(req),
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Directory and catalog
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn register_account(
        &self,
        req: &RegisterAccountRequest,
    ) -> Result<AccountView, ClientError> {
        self.send(self.http.post(self.url("/api/accounts")).json(req))
            .await
    }

    pub async fn get_account(&self, owner: &OwnerId) -> Result<AccountView, ClientError> {
        self.send(self.http.get(self.url(&format!("/api/accounts/{}", owner))))
            .await
    }

    pub async fn set_product_status(
        &self,
        product_id: &str,
        active: bool,
    ) -> Result<(), ClientError> {
        let req = self
            .http
            .put(self.url(&format!("/api/products/{}", product_id)))
            .json(&ProductStatusRequest { active });
        let resp = self.with_caller(req).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(api_error(resp).await)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_caller(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.caller_id {
            Some(caller) => req.header(CALLER_HEADER, caller),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = self.with_caller(req).send().await?;
        if resp.status().is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(api_error(resp).await)
        }
    }
}

async fn api_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let json = serde_json::from_str::<serde_json::Value>(&body).ok();
    let field = |name: &str| {
        json.as_ref()
            .and_then(|v| v.get(name))
            .and_then(|e| e.as_str())
            .map(String::from)
    };

    ClientError::Api {
        status,
        message: field("error").unwrap_or_else(|| body.clone()),
        error_code: field("error_code"),
        transfer_id: field("transfer_id"),
    }
}
