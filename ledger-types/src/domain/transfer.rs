//! Transfer records and line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::account::AccountType;
use super::id::{OwnerId, TransferId, WalletId};
use super::money::Money;
use super::wallet::BalanceChange;
use crate::error::DomainError;

/// Enums stored and transmitted as SCREAMING_SNAKE_CASE codes.
macro_rules! coded_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(#[serde(rename = $code)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok($name::$variant),)+
                    other => Err(DomainError::ValidationError(format!(
                        "invalid {}: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

coded_enum!(
    /// Lifecycle state of a transfer. Moves out of PENDING exactly once.
    TransferStatus {
        Pending => "PENDING",
        Success => "SUCCESS",
        Failed => "FAILED",
    }
);

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }
}

coded_enum!(
    /// Which way money moved for one party.
    Direction {
        Debit => "DEBIT",
        Credit => "CREDIT",
    }
);

coded_enum!(
    /// Stable error codes persisted on FAILED records and returned to callers.
    ErrorCode {
        BadRequest => "BAD_REQUEST",
        NotFound => "NOT_FOUND",
        InvalidAmount => "INVALID_AMOUNT",
        InsufficientBalance => "INSUFFICIENT_BALANCE",
        ThresholdViolation => "THRESHOLD_VIOLATION",
        AccountInactive => "ACCOUNT_INACTIVE",
        InvalidCredential => "INVALID_CREDENTIAL",
        ProductUnavailable => "PRODUCT_UNAVAILABLE",
        ConcurrencyConflict => "CONCURRENCY_CONFLICT",
        Internal => "INTERNAL",
    }
);

coded_enum!(
    ServiceType {
        Transfer => "TRANSFER",
        Recharge => "RECHARGE",
        BillPayment => "BILL_PAYMENT",
        Dmt => "DMT",
        Aeps => "AEPS",
        PanCard => "PAN_CARD",
        Insurance => "INSURANCE",
    }
);

impl Default for ServiceType {
    fn default() -> Self {
        ServiceType::Transfer
    }
}

coded_enum!(
    ProductType {
        P2p => "P2P",
        Mobile => "MOBILE",
        Dth => "DTH",
        Electricity => "ELECTRICITY",
        Gas => "GAS",
        Water => "WATER",
        Broadband => "BROADBAND",
        Insurance => "INSURANCE",
        LoanRepayment => "LOAN_REPAYMENT",
    }
);

impl Default for ProductType {
    fn default() -> Self {
        ProductType::P2p
    }
}

/// Fields of a transfer known before it is persisted.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub payer_id: OwnerId,
    pub payee_id: OwnerId,
    pub amount: Money,
    pub service_type: ServiceType,
    pub product_type: ProductType,
    pub product_id: Option<String>,
    pub remarks: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_by: OwnerId,
}

/// Terminal outcome written onto a PENDING record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalization {
    pub status: TransferStatus,
    pub error_code: Option<ErrorCode>,
    pub remarks: Option<String>,
}

impl Finalization {
    pub fn success(remarks: Option<String>) -> Self {
        Self {
            status: TransferStatus::Success,
            error_code: None,
            remarks,
        }
    }

    pub fn failed(code: ErrorCode, remarks: impl Into<String>) -> Self {
        Self {
            status: TransferStatus::Failed,
            error_code: Some(code),
            remarks: Some(remarks.into()),
        }
    }
}

/// Header of one transfer.
///
/// Only `status`, `error_code`, `remarks` and `modified_at` ever change, and
/// only once, through [`TransferRecord::finalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: TransferId,
    pub payer_id: OwnerId,
    pub payee_id: OwnerId,
    pub amount: Money,
    pub status: TransferStatus,
    pub service_type: ServiceType,
    pub product_type: ProductType,
    pub product_id: Option<String>,
    pub error_code: Option<ErrorCode>,
    pub remarks: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_by: OwnerId,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl TransferRecord {
    pub fn pending(id: TransferId, new: NewTransfer, at: DateTime<Utc>) -> Self {
        Self {
            id,
            payer_id: new.payer_id,
            payee_id: new.payee_id,
            amount: new.amount,
            status: TransferStatus::Pending,
            service_type: new.service_type,
            product_type: new.product_type,
            product_id: new.product_id,
            error_code: None,
            remarks: new.remarks,
            idempotency_key: new.idempotency_key,
            created_by: new.created_by,
            created_at: at,
            modified_at: at,
        }
    }

    /// Moves a PENDING record to its terminal state.
    pub fn finalize(&mut self, fin: Finalization, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::AlreadyFinalized(self.id.clone()));
        }
        if !fin.status.is_terminal() {
            return Err(DomainError::ValidationError(
                "Finalization status must be SUCCESS or FAILED".into(),
            ));
        }

        self.status = fin.status;
        self.error_code = fin.error_code;
        if fin.remarks.is_some() {
            self.remarks = fin.remarks;
        }
        self.modified_at = at;
        Ok(())
    }

    /// True when `owner` is the payer or the payee.
    pub fn involves(&self, owner: &OwnerId) -> bool {
        &self.payer_id == owner || &self.payee_id == owner
    }
}

/// One party's side of a transfer. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLineItem {
    pub transfer_id: TransferId,
    pub party_id: OwnerId,
    pub counterparty_id: OwnerId,
    pub wallet_id: WalletId,
    pub direction: Direction,
    pub amount: Money,
    pub previous_balance: Money,
    pub post_balance: Money,
    pub party_type: AccountType,
    pub service_type: ServiceType,
    pub product_type: ProductType,
    pub created_at: DateTime<Utc>,
}

impl TransferLineItem {
    /// Builds the line item for one side of `record` from the wallet mutation
    /// that produced it.
    pub fn from_change(
        record: &TransferRecord,
        direction: Direction,
        change: &BalanceChange,
        party_type: AccountType,
        at: DateTime<Utc>,
    ) -> Self {
        let (party_id, counterparty_id) = match direction {
            Direction::Debit => (record.payer_id.clone(), record.payee_id.clone()),
            Direction::Credit => (record.payee_id.clone(), record.payer_id.clone()),
        };

        Self {
            transfer_id: record.id.clone(),
            party_id,
            counterparty_id,
            wallet_id: change.wallet_id.clone(),
            direction,
            amount: record.amount,
            previous_balance: change.previous,
            post_balance: change.post,
            party_type,
            service_type: record.service_type,
            product_type: record.product_type,
            created_at: at,
        }
    }

    /// Amount with sign: negative for debits.
    pub fn signed_amount(&self) -> i64 {
        match self.direction {
            Direction::Debit => -self.amount.minor(),
            Direction::Credit => self.amount.minor(),
        }
    }
}

/// Filters for listing a party's transfers. The date range is `[from, to)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferFilter {
    pub status: Option<TransferStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TransferFilter {
    pub fn matches(&self, record: &TransferRecord) -> bool {
        self.status.is_none_or(|s| s == record.status)
            && self.from.is_none_or(|from| record.created_at >= from)
            && self.to.is_none_or(|to| record.created_at < to)
    }
}

/// One-based page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 50;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, DomainError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT);

        if page < 1 {
            return Err(DomainError::ValidationError("Minimum page is 1".into()));
        }
        if !(1..=Self::MAX_LIMIT).contains(&limit) {
            return Err(DomainError::ValidationError(format!(
                "Limit must be between 1 and {}",
                Self::MAX_LIMIT
            )));
        }

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TransferRecord {
        TransferRecord::pending(
            TransferId::new("TXN_1"),
            NewTransfer {
                payer_id: OwnerId::new("USR_A"),
                payee_id: OwnerId::new("USR_B"),
                amount: Money::from_minor(5_000).unwrap(),
                service_type: ServiceType::Transfer,
                product_type: ProductType::P2p,
                product_id: None,
                remarks: Some("rent".into()),
                idempotency_key: None,
                created_by: OwnerId::new("USR_A"),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_finalize_once() {
        let mut record = record();
        record
            .finalize(Finalization::success(None), Utc::now())
            .unwrap();
        assert_eq!(record.status, TransferStatus::Success);
        assert_eq!(record.remarks.as_deref(), Some("rent"));

        let again = record.finalize(
            Finalization::failed(ErrorCode::Internal, "late failure"),
            Utc::now(),
        );
        assert!(matches!(again, Err(DomainError::AlreadyFinalized(_))));
        assert_eq!(record.status, TransferStatus::Success);
    }

    #[test]
    fn test_failed_finalization_records_code() {
        let mut record = record();
        record
            .finalize(
                Finalization::failed(ErrorCode::InsufficientBalance, "Insufficient balance"),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(record.error_code, Some(ErrorCode::InsufficientBalance));
        assert_eq!(record.remarks.as_deref(), Some("Insufficient balance"));
    }

    #[test]
    fn test_line_items_sum_to_zero() {
        let record = record();
        let now = Utc::now();
        let debit = TransferLineItem::from_change(
            &record,
            Direction::Debit,
            &BalanceChange {
                wallet_id: WalletId::new("WLT_A"),
                previous: Money::from_minor(10_000).unwrap(),
                post: Money::from_minor(5_000).unwrap(),
            },
            AccountType::User,
            now,
        );
        let credit = TransferLineItem::from_change(
            &record,
            Direction::Credit,
            &BalanceChange {
                wallet_id: WalletId::new("WLT_B"),
                previous: Money::ZERO,
                post: Money::from_minor(5_000).unwrap(),
            },
            AccountType::User,
            now,
        );

        assert_eq!(debit.signed_amount() + credit.signed_amount(), 0);
        assert_eq!(debit.party_id, OwnerId::new("USR_A"));
        assert_eq!(credit.party_id, OwnerId::new("USR_B"));
        assert_eq!(credit.counterparty_id, OwnerId::new("USR_A"));
    }

    #[test]
    fn test_codes_round_trip_through_str() {
        assert_eq!("BILL_PAYMENT".parse::<ServiceType>().unwrap(), ServiceType::BillPayment);
        assert_eq!(ProductType::LoanRepayment.as_str(), "LOAN_REPAYMENT");
        assert_eq!(
            serde_json::to_string(&ErrorCode::ConcurrencyConflict).unwrap(),
            "\"CONCURRENCY_CONFLICT\""
        );
        assert!("SOMETHING".parse::<ServiceType>().is_err());
    }

    #[test]
    fn test_page_request_bounds() {
        assert_eq!(PageRequest::new(None, None).unwrap().limit, 50);
        assert!(PageRequest::new(Some(0), None).is_err());
        assert!(PageRequest::new(None, Some(0)).is_err());
        assert!(PageRequest::new(None, Some(101)).is_err());
        assert_eq!(PageRequest::new(Some(3), Some(20)).unwrap().offset(), 40);
    }

    #[test]
    fn test_filter_date_range_is_half_open() {
        let record = record();
        let filter = TransferFilter {
            status: None,
            from: Some(record.created_at),
            to: Some(record.created_at),
        };
        assert!(!filter.matches(&record));

        let filter = TransferFilter {
            from: Some(record.created_at),
            ..Default::default()
        };
        assert!(filter.matches(&record));
    }
}
