//! Atomic unit of work.

use crate::domain::{
    BalanceChange, Finalization, Money, TransferId, TransferLineItem, TransferRecord, WalletId,
};
use crate::error::RepoError;

/// Opens units of work over wallets and the transfer ledger.
#[async_trait::async_trait]
pub trait AtomicStore: Send + Sync + 'static {
    async fn begin(&self) -> Result<Box<dyn TransferScope>, RepoError>;
}

/// Staged wallet mutations and ledger writes.
///
/// Nothing staged in a scope is visible to other readers until
/// [`TransferScope::commit`] succeeds. Dropping a scope without committing
/// discards it.
///
/// Wallet writes are compare-and-swap on the row version: if another writer
/// changed the wallet since it was read, the scope fails with
/// [`RepoError::Conflict`].
#[async_trait::async_trait]
pub trait TransferScope: Send {
    async fn debit(
        &mut self,
        wallet: &WalletId,
        amount: Money,
        reference: &TransferId,
    ) -> Result<BalanceChange, RepoError>;

    async fn credit(
        &mut self,
        wallet: &WalletId,
        amount: Money,
        reference: &TransferId,
    ) -> Result<BalanceChange, RepoError>;

    /// Appends the two sides of a transfer together.
    async fn append_items(
        &mut self,
        debit: &TransferLineItem,
        credit: &TransferLineItem,
    ) -> Result<(), RepoError>;

    /// Moves a PENDING header to its terminal state.
    async fn finalize(
        &mut self,
        id: &TransferId,
        fin: &Finalization,
    ) -> Result<TransferRecord, RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepoError>;
}
