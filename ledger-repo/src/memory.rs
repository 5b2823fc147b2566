//! In-memory storage adapter.
//!
//! Backs tests and single-process deployments that do not need durability.
//! All state sits behind one `RwLock`; a [`TransferScope`] stages its writes
//! privately and publishes them under a single write-lock acquisition, so
//! readers never observe a partially applied transfer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ledger_types::{
    Account, AccountDirectory, AtomicStore, BalanceChange, DomainError, Finalization, GroupId,
    Money, OwnerId, PageRequest, ProductCatalog, RepoError, Role, ServiceType, ThresholdLimits,
    ThresholdProfile, ThresholdProfileId, ThresholdRepository, TransferFilter, TransferId,
    TransferLedger, TransferLineItem, TransferRecord, TransferScope, TransferStatus, Wallet,
    WalletId, WalletKind, WalletStore, WindowUsage,
};

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<OwnerId, Account>,
    wallets: HashMap<WalletId, Wallet>,
    wallet_index: HashMap<(OwnerId, WalletKind), WalletId>,
    transfers: HashMap<TransferId, TransferRecord>,
    idempotency: HashMap<String, TransferId>,
    items: HashMap<TransferId, Vec<TransferLineItem>>,
    profiles: HashMap<ThresholdProfileId, ThresholdProfile>,
    limits: HashMap<(ThresholdProfileId, GroupId), ThresholdLimits>,
    products: HashMap<String, bool>,
    services: HashMap<ServiceType, bool>,
}

/// In-memory ledger store. Cloning shares the underlying state.
#[derive(Clone)]
pub struct MemoryRepo {
    state: Arc<RwLock<LedgerState>>,
}

impl Default for MemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> RepoError {
    RepoError::Database("ledger state lock poisoned".into())
}

impl MemoryRepo {
    /// Creates an empty store with every service type active.
    pub fn new() -> Self {
        let mut state = LedgerState::default();
        for service in [
            ServiceType::Transfer,
            ServiceType::Recharge,
            ServiceType::BillPayment,
            ServiceType::Dmt,
            ServiceType::Aeps,
            ServiceType::PanCard,
            ServiceType::Insurance,
        ] {
            state.services.insert(service, true);
        }

        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, RepoError> {
        self.state.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, RepoError> {
        self.state.write().map_err(poisoned)
    }

    /// Snapshot of every wallet.
    pub fn wallets(&self) -> Result<Vec<Wallet>, RepoError> {
        Ok(self.read()?.wallets.values().cloned().collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Atomic scope
// ─────────────────────────────────────────────────────────────────────────────

struct StagedWallet {
    read_version: i64,
    wallet: Wallet,
}

/// Private copy of everything a scope touched.
struct MemoryScope {
    state: Arc<RwLock<LedgerState>>,
    wallets: HashMap<WalletId, StagedWallet>,
    items: Vec<TransferLineItem>,
    finalized: HashMap<TransferId, TransferRecord>,
}

impl MemoryScope {
    fn staged_wallet(&mut self, id: &WalletId) -> Result<&mut Wallet, RepoError> {
        if !self.wallets.contains_key(id) {
            let wallet = self
                .state
                .read()
                .map_err(poisoned)?
                .wallets
                .get(id)
                .cloned()
                .ok_or(RepoError::NotFound)?;
            self.wallets.insert(
                id.clone(),
                StagedWallet {
                    read_version: wallet.version,
                    wallet,
                },
            );
        }

        self.wallets
            .get_mut(id)
            .map(|staged| &mut staged.wallet)
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl TransferScope for MemoryScope {
    async fn debit(
        &mut self,
        wallet: &WalletId,
        amount: Money,
        reference: &TransferId,
    ) -> Result<BalanceChange, RepoError> {
        let wallet = self.staged_wallet(wallet)?;
        Ok(wallet.debit(amount, reference, Utc::now())?)
    }

    async fn credit(
        &mut self,
        wallet: &WalletId,
        amount: Money,
        reference: &TransferId,
    ) -> Result<BalanceChange, RepoError> {
        let wallet = self.staged_wallet(wallet)?;
        Ok(wallet.credit(amount, reference, Utc::now())?)
    }

    async fn append_items(
        &mut self,
        debit: &TransferLineItem,
        credit: &TransferLineItem,
    ) -> Result<(), RepoError> {
        let state = self.state.read().map_err(poisoned)?;
        for item in [debit, credit] {
            if !state.transfers.contains_key(&item.transfer_id) {
                return Err(RepoError::NotFound);
            }
        }
        drop(state);

        self.items.push(debit.clone());
        self.items.push(credit.clone());
        Ok(())
    }

    async fn finalize(
        &mut self,
        id: &TransferId,
        fin: &Finalization,
    ) -> Result<TransferRecord, RepoError> {
        let mut record = match self.finalized.get(id) {
            Some(record) => record.clone(),
            None => self
                .state
                .read()
                .map_err(poisoned)?
                .transfers
                .get(id)
                .cloned()
                .ok_or(RepoError::NotFound)?,
        };

        record.finalize(fin.clone(), Utc::now())?;
        self.finalized.insert(id.clone(), record.clone());
        Ok(record)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let scope = *self;
        let mut state = scope.state.write().map_err(poisoned)?;

        for (id, staged) in &scope.wallets {
            let current = state.wallets.get(id).ok_or(RepoError::NotFound)?;
            if current.version != staged.read_version {
                return Err(RepoError::Conflict(format!(
                    "wallet {} changed concurrently",
                    id
                )));
            }
        }
        for id in scope.finalized.keys() {
            let current = state.transfers.get(id).ok_or(RepoError::NotFound)?;
            if current.status != TransferStatus::Pending {
                return Err(RepoError::Domain(DomainError::AlreadyFinalized(id.clone())));
            }
        }

        for (id, staged) in scope.wallets {
            state.wallets.insert(id, staged.wallet);
        }
        for item in scope.items {
            state
                .items
                .entry(item.transfer_id.clone())
                .or_default()
                .push(item);
        }
        for (id, record) in scope.finalized {
            state.transfers.insert(id, record);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        Ok(())
    }
}

#[async_trait]
impl AtomicStore for MemoryRepo {
    async fn begin(&self) -> Result<Box<dyn TransferScope>, RepoError> {
        Ok(Box::new(MemoryScope {
            state: Arc::clone(&self.state),
            wallets: HashMap::new(),
            items: Vec::new(),
            finalized: HashMap::new(),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallets
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl WalletStore for MemoryRepo {
    async fn insert_wallet(&self, wallet: &Wallet) -> Result<(), RepoError> {
        let mut state = self.write()?;
        let key = (wallet.owner_id.clone(), wallet.kind);
        if state.wallet_index.contains_key(&key) || state.wallets.contains_key(&wallet.id) {
            return Err(RepoError::Duplicate(format!(
                "{} wallet already exists for {}",
                wallet.kind, wallet.owner_id
            )));
        }

        state.wallet_index.insert(key, wallet.id.clone());
        state.wallets.insert(wallet.id.clone(), wallet.clone());
        Ok(())
    }

    async fn get_wallet(
        &self,
        owner: &OwnerId,
        kind: WalletKind,
    ) -> Result<Option<Wallet>, RepoError> {
        let state = self.read()?;
        Ok(state
            .wallet_index
            .get(&(owner.clone(), kind))
            .and_then(|id| state.wallets.get(id))
            .cloned())
    }

    async fn get_wallet_by_id(&self, id: &WalletId) -> Result<Option<Wallet>, RepoError> {
        Ok(self.read()?.wallets.get(id).cloned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transfer ledger
// ─────────────────────────────────────────────────────────────────────────────

fn in_range(ts: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    ts >= start && ts < end
}

#[async_trait]
impl TransferLedger for MemoryRepo {
    async fn append_header(&self, record: &TransferRecord) -> Result<(), RepoError> {
        let mut state = self.write()?;
        if state.transfers.contains_key(&record.id) {
            return Err(RepoError::Duplicate(format!("transfer {}", record.id)));
        }
        if let Some(key) = &record.idempotency_key {
            if state.idempotency.contains_key(key) {
                return Err(RepoError::Duplicate(format!("idempotency key {}", key)));
            }
            state.idempotency.insert(key.clone(), record.id.clone());
        }

        state.transfers.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn finalize(
        &self,
        id: &TransferId,
        fin: &Finalization,
    ) -> Result<TransferRecord, RepoError> {
        let mut state = self.write()?;
        let record = state.transfers.get_mut(id).ok_or(RepoError::NotFound)?;
        record.finalize(fin.clone(), Utc::now())?;
        Ok(record.clone())
    }

    async fn get_transfer(&self, id: &TransferId) -> Result<Option<TransferRecord>, RepoError> {
        Ok(self.read()?.transfers.get(id).cloned())
    }

    async fn transfer_items(&self, id: &TransferId) -> Result<Vec<TransferLineItem>, RepoError> {
        Ok(self.read()?.items.get(id).cloned().unwrap_or_default())
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<TransferRecord>, RepoError> {
        let state = self.read()?;
        Ok(state
            .idempotency
            .get(key)
            .and_then(|id| state.transfers.get(id))
            .cloned())
    }

    async fn list_by_party(
        &self,
        owner: &OwnerId,
        filter: &TransferFilter,
        page: PageRequest,
    ) -> Result<(Vec<TransferRecord>, u64), RepoError> {
        let state = self.read()?;
        let mut matching: Vec<&TransferRecord> = state
            .transfers
            .values()
            .filter(|r| r.involves(owner) && filter.matches(r))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn usage(
        &self,
        owner: &OwnerId,
        role: Role,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WindowUsage, RepoError> {
        let state = self.read()?;
        let mut usage = WindowUsage::default();

        for record in state.transfers.values() {
            let party = match role {
                Role::Payer => &record.payer_id,
                Role::Payee => &record.payee_id,
            };
            if party == owner
                && record.status == TransferStatus::Success
                && in_range(record.created_at, start, end)
            {
                usage.count += 1;
                usage.amount = usage.amount.checked_add(record.amount)?;
            }
        }
        Ok(usage)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Thresholds
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ThresholdRepository for MemoryRepo {
    async fn insert_profile(&self, profile: &ThresholdProfile) -> Result<(), RepoError> {
        let mut state = self.write()?;
        if state.profiles.contains_key(&profile.id) {
            return Err(RepoError::Duplicate(format!("profile {}", profile.id)));
        }
        state.profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn get_profile(
        &self,
        id: &ThresholdProfileId,
    ) -> Result<Option<ThresholdProfile>, RepoError> {
        Ok(self.read()?.profiles.get(id).cloned())
    }

    async fn upsert_limits(&self, limits: &ThresholdLimits) -> Result<(), RepoError> {
        let mut state = self.write()?;
        if !state.profiles.contains_key(&limits.profile_id) {
            return Err(RepoError::NotFound);
        }
        state.limits.insert(
            (limits.profile_id.clone(), limits.group_id.clone()),
            limits.clone(),
        );
        Ok(())
    }

    async fn get_limits(
        &self,
        profile: &ThresholdProfileId,
        group: &GroupId,
    ) -> Result<Option<ThresholdLimits>, RepoError> {
        Ok(self
            .read()?
            .limits
            .get(&(profile.clone(), group.clone()))
            .cloned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory and catalog
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl AccountDirectory for MemoryRepo {
    async fn get_account(&self, owner: &OwnerId) -> Result<Option<Account>, RepoError> {
        Ok(self.read()?.accounts.get(owner).cloned())
    }

    async fn register_account(&self, account: &Account) -> Result<(), RepoError> {
        self.write()?
            .accounts
            .insert(account.id.clone(), account.clone());
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for MemoryRepo {
    async fn is_active(&self, product_id: &str) -> Result<bool, RepoError> {
        Ok(self
            .read()?
            .products
            .get(product_id)
            .copied()
            .unwrap_or(false))
    }

    async fn is_active_service(&self, service: ServiceType) -> Result<bool, RepoError> {
        Ok(self
            .read()?
            .services
            .get(&service)
            .copied()
            .unwrap_or(false))
    }

    async fn set_product_active(&self, product_id: &str, active: bool) -> Result<(), RepoError> {
        self.write()?.products.insert(product_id.to_string(), active);
        Ok(())
    }

    async fn set_service_active(
        &self,
        service: ServiceType,
        active: bool,
    ) -> Result<(), RepoError> {
        self.write()?.services.insert(service, active);
        Ok(())
    }
}
