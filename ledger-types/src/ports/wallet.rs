//! Wallet store port.

use crate::domain::{BalanceChange, Money, OwnerId, TransferId, Wallet, WalletId, WalletKind};
use crate::error::RepoError;

use super::store::AtomicStore;

/// Owns wallet rows. Balances change only through a [`super::TransferScope`].
#[async_trait::async_trait]
pub trait WalletStore: AtomicStore {
    /// Persists a new wallet. A second wallet of the same kind for the same
    /// owner is [`RepoError::Duplicate`].
    async fn insert_wallet(&self, wallet: &Wallet) -> Result<(), RepoError>;

    async fn get_wallet(
        &self,
        owner: &OwnerId,
        kind: WalletKind,
    ) -> Result<Option<Wallet>, RepoError>;

    async fn get_wallet_by_id(&self, id: &WalletId) -> Result<Option<Wallet>, RepoError>;

    /// Credits a single wallet in its own unit of work.
    async fn credit(
        &self,
        wallet: &WalletId,
        amount: Money,
        reference: &TransferId,
    ) -> Result<BalanceChange, RepoError> {
        let mut scope = self.begin().await?;
        match scope.credit(wallet, amount, reference).await {
            Ok(change) => {
                scope.commit().await?;
                Ok(change)
            }
            Err(e) => {
                scope.rollback().await?;
                Err(e)
            }
        }
    }

    /// Debits a single wallet in its own unit of work.
    async fn debit(
        &self,
        wallet: &WalletId,
        amount: Money,
        reference: &TransferId,
    ) -> Result<BalanceChange, RepoError> {
        let mut scope = self.begin().await?;
        match scope.debit(wallet, amount, reference).await {
            Ok(change) => {
                scope.commit().await?;
                Ok(change)
            }
            Err(e) => {
                scope.rollback().await?;
                Err(e)
            }
        }
    }
}
