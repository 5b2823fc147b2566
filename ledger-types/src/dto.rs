//! Data Transfer Objects (DTOs) for requests and responses.
//!
//! Every amount crossing this boundary is a decimal in major units with two
//! decimal places. Conversion to and from minor units happens here and
//! nowhere else.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Account, AccountStatus, AccountType, Direction, ErrorCode, GroupId, OwnerId, ProductType, Role,
    ServiceType, ThresholdLimits, ThresholdProfile, ThresholdProfileId, TransferId,
    TransferLineItem, TransferRecord, TransferStatus, Violation, ViolationKind, Wallet, WalletId,
    WalletKind, WalletStatus, Window, WindowAllowance,
};

// ─────────────────────────────────────────────────────────────────────────────
// Transfer DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to move money from the payer's MAIN wallet to the payee's.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub payer_id: OwnerId,
    pub payee_id: OwnerId,
    /// Amount in major units, at most two decimal places
    #[schema(value_type = String, example = "50.00")]
    pub amount: Decimal,
    #[serde(default)]
    pub service_type: ServiceType,
    #[serde(default)]
    pub product_type: ProductType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Resubmissions with the same key replay the first outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// Threshold group; `DEFAULT` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    /// Actor recorded on the transfer; the payer when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<OwnerId>,
}

/// Recharge or bill payment: a transfer behind account, PIN and product gates.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentRequest {
    #[serde(flatten)]
    pub transfer: TransferRequest,
    pub product_id: String,
    /// Transaction PIN of the payer
    pub pin: String,
}

/// Outcome of a successful (or replayed) transfer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferResponse {
    pub transfer_id: TransferId,
    pub status: TransferStatus,
    #[schema(value_type = String, example = "50.00")]
    pub payer_balance: Decimal,
    #[schema(value_type = String, example = "50.00")]
    pub payee_balance: Decimal,
    /// True when served from an earlier attempt with the same idempotency key
    #[serde(default)]
    pub replayed: bool,
}

/// Query parameters of the per-party transfer listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTransfersQuery {
    /// `SUCCESS`, `FAILED`, `PENDING` or `ALL`
    pub status: Option<String>,
    /// Inclusive lower bound on creation time
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on creation time
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LineItemView {
    pub party_id: OwnerId,
    pub counterparty_id: OwnerId,
    pub wallet_id: WalletId,
    pub direction: Direction,
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[schema(value_type = String)]
    pub previous_balance: Decimal,
    #[schema(value_type = String)]
    pub post_balance: Decimal,
    pub party_type: AccountType,
    pub created_at: DateTime<Utc>,
}

impl From<&TransferLineItem> for LineItemView {
    fn from(item: &TransferLineItem) -> Self {
        Self {
            party_id: item.party_id.clone(),
            counterparty_id: item.counterparty_id.clone(),
            wallet_id: item.wallet_id.clone(),
            direction: item.direction,
            amount: item.amount.to_major(),
            previous_balance: item.previous_balance.to_major(),
            post_balance: item.post_balance.to_major(),
            party_type: item.party_type,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferView {
    pub transfer_id: TransferId,
    pub payer_id: OwnerId,
    pub payee_id: OwnerId,
    #[schema(value_type = String, example = "50.00")]
    pub amount: Decimal,
    pub status: TransferStatus,
    pub service_type: ServiceType,
    pub product_type: ProductType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub created_by: OwnerId,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineItemView>,
}

impl TransferView {
    pub fn with_items(record: &TransferRecord, items: &[TransferLineItem]) -> Self {
        let mut view = Self::from(record);
        view.line_items = items.iter().map(LineItemView::from).collect();
        view
    }
}

impl From<&TransferRecord> for TransferView {
    fn from(record: &TransferRecord) -> Self {
        Self {
            transfer_id: record.id.clone(),
            payer_id: record.payer_id.clone(),
            payee_id: record.payee_id.clone(),
            amount: record.amount.to_major(),
            status: record.status,
            service_type: record.service_type,
            product_type: record.product_type,
            product_id: record.product_id.clone(),
            error_code: record.error_code,
            remarks: record.remarks.clone(),
            created_by: record.created_by.clone(),
            created_at: record.created_at,
            modified_at: record.modified_at,
            line_items: Vec::new(),
        }
    }
}

/// One page of a party's transfers, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferPage {
    pub items: Vec<TransferView>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Threshold DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateThresholdRequest {
    pub owner_id: OwnerId,
    #[schema(value_type = String, example = "500.00")]
    pub amount: Decimal,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

/// A violated limit. `limit` and `current` are counts for COUNT violations
/// and major-unit amounts otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ViolationView {
    pub window: Window,
    pub kind: ViolationKind,
    #[schema(value_type = String)]
    pub limit: Decimal,
    #[schema(value_type = String)]
    pub current: Decimal,
    pub message: String,
}

impl From<&Violation> for ViolationView {
    fn from(v: &Violation) -> Self {
        let scale = match v.kind {
            ViolationKind::Count => 0,
            ViolationKind::Amount | ViolationKind::Cumulative => 2,
        };
        Self {
            window: v.window,
            kind: v.kind,
            limit: Decimal::new(v.limit, scale),
            current: Decimal::new(v.current, scale),
            message: v.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThresholdCheckResponse {
    pub valid: bool,
    pub violations: Vec<ViolationView>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemainingLimitsQuery {
    pub role: Option<String>,
    pub group_id: Option<GroupId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WindowAllowanceView {
    pub window: Window,
    pub count_limit: i64,
    pub count_used: i64,
    pub count_remaining: i64,
    #[schema(value_type = String)]
    pub amount_limit: Decimal,
    #[schema(value_type = String)]
    pub amount_used: Decimal,
    #[schema(value_type = String)]
    pub amount_remaining: Decimal,
}

impl From<&WindowAllowance> for WindowAllowanceView {
    fn from(a: &WindowAllowance) -> Self {
        Self {
            window: a.window,
            count_limit: a.caps.count,
            count_used: a.used.count,
            count_remaining: a.remaining_count,
            amount_limit: a.caps.amount.to_major(),
            amount_used: a.used.amount.to_major(),
            amount_remaining: a.remaining_amount.to_major(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RemainingLimitsResponse {
    pub owner_id: OwnerId,
    pub role: Role,
    pub group_id: GroupId,
    pub windows: Vec<WindowAllowanceView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateProfileRequest {
    #[schema(example = "Retail users")]
    pub name: String,
    pub owner_type: AccountType,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileView {
    pub id: ThresholdProfileId,
    pub name: String,
    pub owner_type: AccountType,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&ThresholdProfile> for ProfileView {
    fn from(p: &ThresholdProfile) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            owner_type: p.owner_type,
            status: p.status,
            created_at: p.created_at,
        }
    }
}

/// Daily caps for one (profile, group). Weekly and monthly caps derive from
/// these.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetLimitsRequest {
    pub payer_count: i64,
    #[schema(value_type = String, example = "500.00")]
    pub payer_amount: Decimal,
    pub payee_count: i64,
    #[schema(value_type = String, example = "500.00")]
    pub payee_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LimitsView {
    pub profile_id: ThresholdProfileId,
    pub group_id: GroupId,
    pub payer_count: i64,
    #[schema(value_type = String)]
    pub payer_amount: Decimal,
    pub payee_count: i64,
    #[schema(value_type = String)]
    pub payee_amount: Decimal,
}

impl From<&ThresholdLimits> for LimitsView {
    fn from(l: &ThresholdLimits) -> Self {
        Self {
            profile_id: l.profile_id.clone(),
            group_id: l.group_id.clone(),
            payer_count: l.payer_count,
            payer_amount: l.payer_amount.to_major(),
            payee_count: l.payee_count,
            payee_amount: l.payee_amount.to_major(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallet DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWalletRequest {
    pub owner_id: OwnerId,
    #[serde(default)]
    pub kind: WalletKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletQuery {
    pub kind: Option<WalletKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletView {
    pub id: WalletId,
    pub owner_id: OwnerId,
    pub owner_type: AccountType,
    pub kind: WalletKind,
    #[schema(value_type = String, example = "100.00")]
    pub balance: Decimal,
    #[schema(value_type = String)]
    pub previous_balance: Decimal,
    #[schema(value_type = String)]
    pub net_credit: Decimal,
    #[schema(value_type = String)]
    pub net_debit: Decimal,
    pub status: WalletStatus,
    #[schema(value_type = String)]
    pub ceiling: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transfer_id: Option<TransferId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transfer_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Wallet> for WalletView {
    fn from(w: &Wallet) -> Self {
        Self {
            id: w.id.clone(),
            owner_id: w.owner_id.clone(),
            owner_type: w.owner_type,
            kind: w.kind,
            balance: w.balance.to_major(),
            previous_balance: w.previous_balance.to_major(),
            net_credit: w.net_credit.to_major(),
            net_debit: w.net_debit.to_major(),
            status: w.status,
            ceiling: w.ceiling.to_major(),
            last_transfer_id: w.last_transfer_id.clone(),
            last_direction: w.last_direction,
            last_transfer_at: w.last_transfer_at,
            created_at: w.created_at,
        }
    }
}

/// Direct credit or debit of one wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletAdjustmentRequest {
    #[schema(value_type = String, example = "100.00")]
    pub amount: Decimal,
    #[serde(default)]
    pub kind: WalletKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceCheckQuery {
    pub amount: Decimal,
    pub kind: Option<WalletKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceCheckResponse {
    pub owner_id: OwnerId,
    pub kind: WalletKind,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub sufficient: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory and catalog DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Registers (or replaces) an account directory entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterAccountRequest {
    #[schema(example = "USR_alice")]
    pub id: OwnerId,
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
    /// Transaction PIN; stored hashed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_profile_id: Option<ThresholdProfileId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountView {
    pub id: OwnerId,
    pub account_type: AccountType,
    pub status: AccountStatus,
    pub has_pin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_profile_id: Option<ThresholdProfileId>,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id.clone(),
            account_type: a.account_type,
            status: a.status,
            has_pin: a.credential_hash.is_some(),
            threshold_profile_id: a.threshold_profile_id.clone(),
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductStatusRequest {
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transfer_request_defaults() {
        let json = r#"{"payer_id":"USR_A","payee_id":"USR_B","amount":"50.25"}"#;
        let req: TransferRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.amount, dec!(50.25));
        assert_eq!(req.service_type, ServiceType::Transfer);
        assert_eq!(req.product_type, ProductType::P2p);
        assert!(req.idempotency_key.is_none());
    }

    #[test]
    fn test_payment_request_flattens_transfer_fields() {
        let json = r#"{
            "payer_id": "USR_A",
            "payee_id": "MER_B",
            "amount": "199.00",
            "service_type": "RECHARGE",
            "product_type": "MOBILE",
            "product_id": "PRD_1",
            "pin": "1234"
        }"#;
        let req: PaymentRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.transfer.service_type, ServiceType::Recharge);
        assert_eq!(req.product_id, "PRD_1");
        assert_eq!(req.pin, "1234");
    }

    #[test]
    fn test_violation_view_scales_amounts() {
        let view = ViolationView::from(&Violation {
            window: Window::Daily,
            kind: ViolationKind::Cumulative,
            limit: 50_000,
            current: 55_000,
            message: "over".into(),
        });
        assert_eq!(view.limit, dec!(500.00));
        assert_eq!(view.current, dec!(550.00));

        let view = ViolationView::from(&Violation {
            window: Window::Weekly,
            kind: ViolationKind::Count,
            limit: 7,
            current: 7,
            message: "count".into(),
        });
        assert_eq!(view.limit, dec!(7));
    }
}
