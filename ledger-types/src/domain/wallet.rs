//! Wallet domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::account::AccountType;
use super::id::{OwnerId, TransferId, WalletId};
use super::money::Money;
use super::transfer::Direction;
use crate::error::DomainError;

/// Ceiling assigned to new wallets.
pub const DEFAULT_CEILING: Money = Money::from_const(1_000_000);

/// Purpose of a wallet. Transfers always move between MAIN wallets.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletKind {
    #[default]
    Main,
    Commission,
}

impl WalletKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::Main => "MAIN",
            WalletKind::Commission => "COMMISSION",
        }
    }
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WalletKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MAIN" => Ok(WalletKind::Main),
            "COMMISSION" => Ok(WalletKind::Commission),
            other => Err(DomainError::ValidationError(format!(
                "unknown wallet kind: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletStatus {
    Active,
    Inactive,
}

impl WalletStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletStatus::Active => "ACTIVE",
            WalletStatus::Inactive => "INACTIVE",
        }
    }
}

impl std::str::FromStr for WalletStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(WalletStatus::Active),
            "INACTIVE" => Ok(WalletStatus::Inactive),
            other => Err(DomainError::ValidationError(format!(
                "unknown wallet status: {}",
                other
            ))),
        }
    }
}

/// Balance of one wallet just before and just after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub wallet_id: WalletId,
    pub previous: Money,
    pub post: Money,
}

/// A balance-holding wallet.
///
/// # Invariants
/// - `balance` is never negative (guaranteed by [`Money`]).
/// - Every mutation goes through [`Wallet::credit`] or [`Wallet::debit`],
///   which bump `version` by exactly one. Stores use the version for
///   compare-and-swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub owner_id: OwnerId,
    pub owner_type: AccountType,
    pub kind: WalletKind,
    pub balance: Money,
    pub previous_balance: Money,
    pub net_credit: Money,
    pub net_debit: Money,
    pub status: WalletStatus,
    pub ceiling: Money,
    pub last_transfer_id: Option<TransferId>,
    pub last_direction: Option<Direction>,
    pub last_transfer_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// Opens an empty, active wallet.
    pub fn open(id: WalletId, owner_id: OwnerId, owner_type: AccountType, kind: WalletKind) -> Self {
        Self {
            id,
            owner_id,
            owner_type,
            kind,
            balance: Money::ZERO,
            previous_balance: Money::ZERO,
            net_credit: Money::ZERO,
            net_debit: Money::ZERO,
            status: WalletStatus::Active,
            ceiling: DEFAULT_CEILING,
            last_transfer_id: None,
            last_direction: None,
            last_transfer_at: None,
            version: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }

    pub fn has_sufficient_balance(&self, amount: Money) -> bool {
        self.balance >= amount
    }

    /// Adds `amount` to the balance and the net-credit total.
    pub fn credit(
        &mut self,
        amount: Money,
        reference: &TransferId,
        at: DateTime<Utc>,
    ) -> Result<BalanceChange, DomainError> {
        self.ensure_mutable(amount)?;

        let previous = self.balance;
        let post = previous.checked_add(amount)?;
        self.net_credit = self.net_credit.checked_add(amount)?;
        self.apply(previous, post, Direction::Credit, reference, at);

        Ok(BalanceChange {
            wallet_id: self.id.clone(),
            previous,
            post,
        })
    }

    /// Subtracts `amount` from the balance and adds it to the net-debit total.
    pub fn debit(
        &mut self,
        amount: Money,
        reference: &TransferId,
        at: DateTime<Utc>,
    ) -> Result<BalanceChange, DomainError> {
        self.ensure_mutable(amount)?;

        let previous = self.balance;
        let post = previous.checked_sub(amount)?;
        self.net_debit = self.net_debit.checked_add(amount)?;
        self.apply(previous, post, Direction::Debit, reference, at);

        Ok(BalanceChange {
            wallet_id: self.id.clone(),
            previous,
            post,
        })
    }

    fn ensure_mutable(&self, amount: Money) -> Result<(), DomainError> {
        if amount.is_zero() {
            return Err(DomainError::InvalidAmount("amount must be positive".into()));
        }
        if !self.is_active() {
            return Err(DomainError::WalletInactive(self.id.clone()));
        }
        Ok(())
    }

    fn apply(
        &mut self,
        previous: Money,
        post: Money,
        direction: Direction,
        reference: &TransferId,
        at: DateTime<Utc>,
    ) {
        self.previous_balance = previous;
        self.balance = post;
        self.last_transfer_id = Some(reference.clone());
        self.last_direction = Some(direction);
        self.last_transfer_at = Some(at);
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet_with(balance: i64) -> Wallet {
        let mut wallet = Wallet::open(
            WalletId::new("WLT_1"),
            OwnerId::new("USR_1"),
            AccountType::User,
            WalletKind::Main,
        );
        wallet.balance = Money::from_minor(balance).unwrap();
        wallet
    }

    fn money(minor: i64) -> Money {
        Money::from_minor(minor).unwrap()
    }

    #[test]
    fn test_credit_updates_totals_and_version() {
        let mut wallet = wallet_with(1000);
        let reference = TransferId::new("TXN_1");

        let change = wallet.credit(money(250), &reference, Utc::now()).unwrap();

        assert_eq!(change.previous, money(1000));
        assert_eq!(change.post, money(1250));
        assert_eq!(wallet.balance, money(1250));
        assert_eq!(wallet.previous_balance, money(1000));
        assert_eq!(wallet.net_credit, money(250));
        assert_eq!(wallet.last_direction, Some(Direction::Credit));
        assert_eq!(wallet.last_transfer_id, Some(reference));
        assert_eq!(wallet.version, 1);
    }

    #[test]
    fn test_debit_exact_balance_reaches_zero() {
        let mut wallet = wallet_with(10_000);
        let change = wallet
            .debit(money(10_000), &TransferId::new("TXN_1"), Utc::now())
            .unwrap();

        assert_eq!(change.post, Money::ZERO);
        assert_eq!(wallet.net_debit, money(10_000));
    }

    #[test]
    fn test_debit_one_over_balance_fails_untouched() {
        let mut wallet = wallet_with(10_000);
        let result = wallet.debit(money(10_001), &TransferId::new("TXN_1"), Utc::now());

        assert!(matches!(
            result,
            Err(DomainError::InsufficientBalance { .. })
        ));
        assert_eq!(wallet.balance, money(10_000));
        assert_eq!(wallet.version, 0);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut wallet = wallet_with(100);
        let result = wallet.credit(Money::ZERO, &TransferId::new("TXN_1"), Utc::now());
        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
    }

    #[test]
    fn test_inactive_wallet_rejected() {
        let mut wallet = wallet_with(100);
        wallet.status = WalletStatus::Inactive;
        let result = wallet.debit(money(10), &TransferId::new("TXN_1"), Utc::now());
        assert!(matches!(result, Err(DomainError::WalletInactive(_))));
    }
}
