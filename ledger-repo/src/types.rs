//! Database row types and their conversion into domain types.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;
use std::str::FromStr;

use ledger_types::{
    Account, AccountStatus, AccountType, DomainError, GroupId, Money, OwnerId, RepoError,
    ThresholdLimits, ThresholdProfile, ThresholdProfileId, TransferId, TransferLineItem,
    TransferRecord, Wallet, WalletId, WindowUsage,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(FromRow)]
pub struct DbAccount {
    pub id: String,
    pub account_type: String,
    pub status: String,
    pub credential_hash: Option<String>,
    pub threshold_profile_id: Option<String>,
    pub created_at: String,
}

#[derive(FromRow)]
pub struct DbWallet {
    pub id: String,
    pub owner_id: String,
    pub owner_type: String,
    pub kind: String,
    pub balance: i64,
    pub previous_balance: i64,
    pub net_credit: i64,
    pub net_debit: i64,
    pub status: String,
    pub ceiling: i64,
    pub last_transfer_id: Option<String>,
    pub last_direction: Option<String>,
    pub last_transfer_at: Option<String>,
    pub version: i64,
    pub created_at: String,
}

#[derive(FromRow)]
pub struct DbTransfer {
    pub id: String,
    pub payer_id: String,
    pub payee_id: String,
    pub amount: i64,
    pub status: String,
    pub service_type: String,
    pub product_type: String,
    pub product_id: Option<String>,
    pub error_code: Option<String>,
    pub remarks: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub modified_at: String,
}

#[derive(FromRow)]
pub struct DbLineItem {
    pub transfer_id: String,
    pub party_id: String,
    pub counterparty_id: String,
    pub wallet_id: String,
    pub direction: String,
    pub amount: i64,
    pub previous_balance: i64,
    pub post_balance: i64,
    pub party_type: String,
    pub service_type: String,
    pub product_type: String,
    pub created_at: String,
}

#[derive(FromRow)]
pub struct DbProfile {
    pub id: String,
    pub name: String,
    pub owner_type: String,
    pub status: String,
    pub created_at: String,
}

#[derive(FromRow)]
pub struct DbLimits {
    pub profile_id: String,
    pub group_id: String,
    pub payer_count: i64,
    pub payer_amount: i64,
    pub payee_count: i64,
    pub payee_amount: i64,
}

/// Aggregate row for window usage queries.
#[derive(FromRow)]
pub struct DbUsage {
    pub count: i64,
    pub amount: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Column lists
// ─────────────────────────────────────────────────────────────────────────────

pub const WALLET_COLUMNS: &str = "id, owner_id, owner_type, kind, balance, previous_balance, \
     net_credit, net_debit, status, ceiling, last_transfer_id, last_direction, \
     last_transfer_at, version, created_at";

pub const TRANSFER_COLUMNS: &str = "id, payer_id, payee_id, amount, status, service_type, \
     product_type, product_id, error_code, remarks, idempotency_key, created_by, created_at, \
     modified_at";

pub const LINE_ITEM_COLUMNS: &str = "transfer_id, party_id, counterparty_id, wallet_id, \
     direction, amount, previous_balance, post_balance, party_type, service_type, \
     product_type, created_at";

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Formats a timestamp as fixed-width RFC 3339 UTC.
pub fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_ts(s: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::Database(format!("Bad timestamp {}: {}", s, e)))
}

fn parse_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>, RepoError> {
    s.as_deref().map(parse_ts).transpose()
}

/// Parses a stored code column into its enum.
pub fn parse_code<T>(s: &str) -> Result<T, RepoError>
where
    T: FromStr<Err = DomainError>,
{
    T::from_str(s).map_err(|e| RepoError::Database(e.to_string()))
}

fn money(minor: i64) -> Result<Money, RepoError> {
    Money::from_minor(minor).map_err(RepoError::Domain)
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion
// ─────────────────────────────────────────────────────────────────────────────

impl DbAccount {
    pub fn into_domain(self) -> Result<Account, RepoError> {
        Ok(Account {
            id: OwnerId::new(self.id),
            account_type: parse_code::<AccountType>(&self.account_type)?,
            status: parse_code::<AccountStatus>(&self.status)?,
            credential_hash: self.credential_hash,
            threshold_profile_id: self.threshold_profile_id.map(ThresholdProfileId::new),
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

impl DbWallet {
    pub fn into_domain(self) -> Result<Wallet, RepoError> {
        Ok(Wallet {
            id: WalletId::new(self.id),
            owner_id: OwnerId::new(self.owner_id),
            owner_type: parse_code(&self.owner_type)?,
            kind: parse_code(&self.kind)?,
            balance: money(self.balance)?,
            previous_balance: money(self.previous_balance)?,
            net_credit: money(self.net_credit)?,
            net_debit: money(self.net_debit)?,
            status: parse_code(&self.status)?,
            ceiling: money(self.ceiling)?,
            last_transfer_id: self.last_transfer_id.map(TransferId::new),
            last_direction: self.last_direction.as_deref().map(parse_code).transpose()?,
            last_transfer_at: parse_opt_ts(self.last_transfer_at)?,
            version: self.version,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

impl DbTransfer {
    pub fn into_domain(self) -> Result<TransferRecord, RepoError> {
        Ok(TransferRecord {
            id: TransferId::new(self.id),
            payer_id: OwnerId::new(self.payer_id),
            payee_id: OwnerId::new(self.payee_id),
            amount: money(self.amount)?,
            status: parse_code(&self.status)?,
            service_type: parse_code(&self.service_type)?,
            product_type: parse_code(&self.product_type)?,
            product_id: self.product_id,
            error_code: self.error_code.as_deref().map(parse_code).transpose()?,
            remarks: self.remarks,
            idempotency_key: self.idempotency_key,
            created_by: OwnerId::new(self.created_by),
            created_at: parse_ts(&self.created_at)?,
            modified_at: parse_ts(&self.modified_at)?,
        })
    }
}

impl DbLineItem {
    pub fn into_domain(self) -> Result<TransferLineItem, RepoError> {
        Ok(TransferLineItem {
            transfer_id: TransferId::new(self.transfer_id),
            party_id: OwnerId::new(self.party_id),
            counterparty_id: OwnerId::new(self.counterparty_id),
            wallet_id: WalletId::new(self.wallet_id),
            direction: parse_code(&self.direction)?,
            amount: money(self.amount)?,
            previous_balance: money(self.previous_balance)?,
            post_balance: money(self.post_balance)?,
            party_type: parse_code(&self.party_type)?,
            service_type: parse_code(&self.service_type)?,
            product_type: parse_code(&self.product_type)?,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

impl DbProfile {
    pub fn into_domain(self) -> Result<ThresholdProfile, RepoError> {
        Ok(ThresholdProfile {
            id: ThresholdProfileId::new(self.id),
            name: self.name,
            owner_type: parse_code(&self.owner_type)?,
            status: parse_code(&self.status)?,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

impl DbLimits {
    pub fn into_domain(self) -> Result<ThresholdLimits, RepoError> {
        ThresholdLimits::new(
            ThresholdProfileId::new(self.profile_id),
            GroupId::new(self.group_id),
            self.payer_count,
            money(self.payer_amount)?,
            self.payee_count,
            money(self.payee_amount)?,
        )
        .map_err(RepoError::Domain)
    }
}

impl DbUsage {
    pub fn into_domain(self) -> Result<WindowUsage, RepoError> {
        Ok(WindowUsage {
            count: self.count,
            amount: money(self.amount)?,
        })
    }
}
