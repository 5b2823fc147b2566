//! Wallet service: opening wallets, reads and direct adjustments.

use std::sync::Arc;

use ledger_types::{
    AccountDirectory, AppError, BalanceChange, IdGenerator, LedgerRepository, Money, OwnerId,
    TransferId, Wallet, WalletId, WalletKind, prefix,
};

use crate::locks::KeyedLocks;

/// Owns wallet lifecycle and the single-wallet mutation path.
///
/// Direct credits and debits take the owner's lock from the shared
/// [`KeyedLocks`] table, the same lock transfers hold, so every mutation of a
/// wallet follows one policy.
pub struct WalletService<R: LedgerRepository> {
    repo: Arc<R>,
    directory: Arc<dyn AccountDirectory>,
    ids: Arc<dyn IdGenerator>,
    locks: Arc<KeyedLocks>,
}

impl<R: LedgerRepository> WalletService<R> {
    pub fn new(
        repo: Arc<R>,
        directory: Arc<dyn AccountDirectory>,
        ids: Arc<dyn IdGenerator>,
        locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            repo,
            directory,
            ids,
            locks,
        }
    }

    /// Opens an empty wallet of `kind` for a registered owner.
    #[tracing::instrument(skip(self), fields(owner = %owner))]
    pub async fn create_wallet(&self, owner: &OwnerId, kind: WalletKind) -> Result<Wallet, AppError> {
        let account = self
            .directory
            .get_account(owner)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {}", owner)))?;

        let wallet = Wallet::open(
            WalletId::new(self.ids.new_id(prefix::WALLET)),
            owner.clone(),
            account.account_type,
            kind,
        );
        self.repo.insert_wallet(&wallet).await?;

        tracing::info!(wallet_id = %wallet.id, "Wallet opened");
        Ok(wallet)
    }

    /// The owner's wallet of `kind`, active or not.
    pub async fn wallet(&self, owner: &OwnerId, kind: WalletKind) -> Result<Wallet, AppError> {
        self.repo
            .get_wallet(owner, kind)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} wallet of {}", kind, owner)))
    }

    /// The owner's wallet of `kind`. Inactive wallets are reported as missing.
    pub async fn active_wallet(
        &self,
        owner: &OwnerId,
        kind: WalletKind,
    ) -> Result<Wallet, AppError> {
        let wallet = self.wallet(owner, kind).await?;
        if !wallet.is_active() {
            return Err(AppError::NotFound(format!(
                "{} wallet of {} is inactive",
                kind, owner
            )));
        }
        Ok(wallet)
    }

    pub async fn balance(&self, owner: &OwnerId, kind: WalletKind) -> Result<Money, AppError> {
        Ok(self.wallet(owner, kind).await?.balance)
    }

    pub async fn has_sufficient_balance(
        &self,
        owner: &OwnerId,
        amount: Money,
        kind: WalletKind,
    ) -> Result<bool, AppError> {
        Ok(self.wallet(owner, kind).await?.has_sufficient_balance(amount))
    }

    /// Credits one wallet outside any transfer.
    #[tracing::instrument(skip(self), fields(owner = %owner, amount = amount.minor()))]
    pub async fn credit(
        &self,
        owner: &OwnerId,
        amount: Money,
        kind: WalletKind,
    ) -> Result<BalanceChange, AppError> {
        let _lock = self.locks.acquire([owner.as_str()]).await?;
        let wallet = self.active_wallet(owner, kind).await?;
        let reference = TransferId::new(self.ids.new_id(prefix::ADJUSTMENT));

        let change = self.repo.credit(&wallet.id, amount, &reference).await?;
        tracing::info!(reference = %reference, balance = change.post.minor(), "Wallet credited");
        Ok(change)
    }

    /// Debits one wallet outside any transfer.
    #[tracing::instrument(skip(self), fields(owner = %owner, amount = amount.minor()))]
    pub async fn debit(
        &self,
        owner: &OwnerId,
        amount: Money,
        kind: WalletKind,
    ) -> Result<BalanceChange, AppError> {
        let _lock = self.locks.acquire([owner.as_str()]).await?;
        let wallet = self.active_wallet(owner, kind).await?;
        let reference = TransferId::new(self.ids.new_id(prefix::ADJUSTMENT));

        let change = self.repo.debit(&wallet.id, amount, &reference).await?;
        tracing::info!(reference = %reference, balance = change.post.minor(), "Wallet debited");
        Ok(change)
    }
}
