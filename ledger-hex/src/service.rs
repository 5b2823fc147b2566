//! Ledger Application Service
//!
//! Facade over the wallet service, threshold guard and transfer
//! orchestrator. Speaks DTOs at its edge and domain types inside; contains
//! no infrastructure logic.

use std::sync::Arc;

use ledger_types::{
    Account, AccountDirectory, AccountStatus, AccountView, AppError, BalanceCheckQuery,
    BalanceCheckResponse, CreateProfileRequest, CreateWalletRequest, GroupId, IdGenerator,
    LedgerRepository, LimitsView, ListTransfersQuery, Money, OwnerId, PageRequest,
    PaymentRequest, ProductCatalog, ProductStatusRequest, ProfileView, RegisterAccountRequest,
    RemainingLimitsQuery, RemainingLimitsResponse, Role, SetLimitsRequest,
    ThresholdCheckResponse, ThresholdLimits, ThresholdProfileId, TransferFilter, TransferId,
    TransferPage, TransferRejection, TransferRequest, TransferResponse, TransferStatus,
    TransferView, ValidateThresholdRequest, ViolationView, WalletAdjustmentRequest, WalletKind,
    WalletQuery, WalletView, WindowAllowanceView,
};
use ledger_repo::PrefixedIdGenerator;
use ledger_repo::security::hash_pin;

use crate::locks::KeyedLocks;
use crate::orchestrator::{OrchestratorConfig, TransferOrchestrator};
use crate::thresholds::ThresholdGuard;
use crate::wallets::WalletService;

/// Collaborators the ledger consumes but does not own.
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn AccountDirectory>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub ids: Arc<dyn IdGenerator>,
}

impl Collaborators {
    /// Directory and catalog served by the same store as the ledger, with the
    /// default id generator.
    pub fn backed_by<S>(store: S) -> Self
    where
        S: AccountDirectory + ProductCatalog + Clone,
    {
        Self {
            directory: Arc::new(store.clone()),
            catalog: Arc::new(store),
            ids: Arc::new(PrefixedIdGenerator::new()),
        }
    }
}

/// Application service for ledger operations.
///
/// Generic over `R: LedgerRepository` - the adapter is injected at compile time.
/// Components are built here with explicit dependencies and share one lock
/// table.
pub struct LedgerService<R: LedgerRepository> {
    repo: Arc<R>,
    wallets: Arc<WalletService<R>>,
    guard: Arc<ThresholdGuard<R>>,
    orchestrator: TransferOrchestrator<R>,
    directory: Arc<dyn AccountDirectory>,
    catalog: Arc<dyn ProductCatalog>,
    locks: Arc<KeyedLocks>,
}

impl<R: LedgerRepository> LedgerService<R> {
    /// Creates a ledger service with default orchestration settings.
    pub fn new(repo: R, collaborators: Collaborators) -> Self {
        Self::with_config(repo, collaborators, OrchestratorConfig::default())
    }

    pub fn with_config(repo: R, collaborators: Collaborators, config: OrchestratorConfig) -> Self {
        let Collaborators {
            directory,
            catalog,
            ids,
        } = collaborators;
        let repo = Arc::new(repo);
        let locks = Arc::new(KeyedLocks::new(config.lock_wait));

        let wallets = Arc::new(WalletService::new(
            Arc::clone(&repo),
            Arc::clone(&directory),
            Arc::clone(&ids),
            Arc::clone(&locks),
        ));
        let guard = Arc::new(ThresholdGuard::new(
            Arc::clone(&repo),
            Arc::clone(&directory),
            Arc::clone(&ids),
        ));
        let orchestrator = TransferOrchestrator::new(
            Arc::clone(&repo),
            Arc::clone(&wallets),
            Arc::clone(&guard),
            Arc::clone(&directory),
            Arc::clone(&catalog),
            ids,
            Arc::clone(&locks),
            config,
        );

        Self {
            repo,
            wallets,
            guard,
            orchestrator,
            directory,
            catalog,
            locks,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Per-owner lock table shared by every mutation path.
    pub(crate) fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transfers
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn process_transfer(
        &self,
        req: TransferRequest,
    ) -> Result<TransferResponse, TransferRejection> {
        self.orchestrator.process_transfer(req).await
    }

    pub async fn process_payment(
        &self,
        req: PaymentRequest,
    ) -> Result<TransferResponse, TransferRejection> {
        self.orchestrator.process_payment(req).await
    }

    /// Gets a transfer with its line items.
    pub async fn get_transfer(&self, id: &TransferId) -> Result<TransferView, AppError> {
        let record = self
            .repo
            .get_transfer(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transfer {}", id)))?;
        let items = self.repo.transfer_items(id).await?;
        Ok(TransferView::with_items(&record, &items))
    }

    /// Lists transfers where the owner is payer or payee, newest first.
    #[tracing::instrument(skip(self, query), fields(owner = %owner))]
    pub async fn list_transfers(
        &self,
        owner: &OwnerId,
        query: ListTransfersQuery,
    ) -> Result<TransferPage, AppError> {
        let status = query
            .status
            .as_deref()
            .filter(|s| !s.eq_ignore_ascii_case("ALL"))
            .map(str::parse::<TransferStatus>)
            .transpose()?;
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from >= to {
                return Err(AppError::BadRequest("`from` must be before `to`".into()));
            }
        }
        let page = PageRequest::new(query.page, query.limit)?;
        let filter = TransferFilter {
            status,
            from: query.from,
            to: query.to,
        };

        let (records, total) = self.repo.list_by_party(owner, &filter, page).await?;
        Ok(TransferPage {
            items: records.iter().map(TransferView::from).collect(),
            page: page.page,
            limit: page.limit,
            total,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Thresholds
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn validate_thresholds(
        &self,
        req: ValidateThresholdRequest,
    ) -> Result<ThresholdCheckResponse, AppError> {
        let amount = Money::from_major(req.amount)?;
        let group = req.group_id.unwrap_or_default();
        let check = self
            .guard
            .validate(&req.owner_id, amount, req.role, &group)
            .await?;

        Ok(ThresholdCheckResponse {
            valid: check.valid,
            violations: check.violations.iter().map(ViolationView::from).collect(),
        })
    }

    pub async fn remaining_limits(
        &self,
        owner: &OwnerId,
        query: RemainingLimitsQuery,
    ) -> Result<RemainingLimitsResponse, AppError> {
        let role = query
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()?
            .unwrap_or(Role::Payer);
        let group = query.group_id.unwrap_or_default();
        let allowances = self.guard.remaining(owner, role, &group).await?;

        Ok(RemainingLimitsResponse {
            owner_id: owner.clone(),
            role,
            group_id: group,
            windows: allowances.iter().map(WindowAllowanceView::from).collect(),
        })
    }

    pub async fn create_profile(&self, req: CreateProfileRequest) -> Result<ProfileView, AppError> {
        let profile = self.guard.create_profile(req.name, req.owner_type).await?;
        Ok(ProfileView::from(&profile))
    }

    pub async fn set_limits(
        &self,
        profile_id: ThresholdProfileId,
        group_id: GroupId,
        req: SetLimitsRequest,
    ) -> Result<LimitsView, AppError> {
        let limits = ThresholdLimits::new(
            profile_id,
            group_id,
            req.payer_count,
            Money::from_major_or_zero(req.payer_amount)?,
            req.payee_count,
            Money::from_major_or_zero(req.payee_amount)?,
        )?;
        let limits = self.guard.set_limits(limits).await?;
        Ok(LimitsView::from(&limits))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Wallets
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn create_wallet(&self, req: CreateWalletRequest) -> Result<WalletView, AppError> {
        let wallet = self.wallets.create_wallet(&req.owner_id, req.kind).await?;
        Ok(WalletView::from(&wallet))
    }

    pub async fn wallet(&self, owner: &OwnerId, query: WalletQuery) -> Result<WalletView, AppError> {
        let wallet = self
            .wallets
            .wallet(owner, query.kind.unwrap_or_default())
            .await?;
        Ok(WalletView::from(&wallet))
    }

    pub async fn check_balance(
        &self,
        owner: &OwnerId,
        query: BalanceCheckQuery,
    ) -> Result<BalanceCheckResponse, AppError> {
        let kind = query.kind.unwrap_or_default();
        let amount = Money::from_major(query.amount)?;
        let sufficient = self
            .wallets
            .has_sufficient_balance(owner, amount, kind)
            .await?;

        Ok(BalanceCheckResponse {
            owner_id: owner.clone(),
            kind,
            amount: amount.to_major(),
            sufficient,
        })
    }

    pub async fn credit_wallet(
        &self,
        owner: &OwnerId,
        req: WalletAdjustmentRequest,
    ) -> Result<WalletView, AppError> {
        let amount = Money::from_major(req.amount)?;
        self.wallets.credit(owner, amount, req.kind).await?;
        self.wallet_view(owner, req.kind).await
    }

    pub async fn debit_wallet(
        &self,
        owner: &OwnerId,
        req: WalletAdjustmentRequest,
    ) -> Result<WalletView, AppError> {
        let amount = Money::from_major(req.amount)?;
        self.wallets.debit(owner, amount, req.kind).await?;
        self.wallet_view(owner, req.kind).await
    }

    async fn wallet_view(&self, owner: &OwnerId, kind: WalletKind) -> Result<WalletView, AppError> {
        let wallet = self.wallets.wallet(owner, kind).await?;
        Ok(WalletView::from(&wallet))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directory and catalog
    // ─────────────────────────────────────────────────────────────────────────────

    /// Registers or replaces an account directory entry.
    #[tracing::instrument(skip(self, req), fields(owner = %req.id))]
    pub async fn register_account(
        &self,
        req: RegisterAccountRequest,
    ) -> Result<AccountView, AppError> {
        if req.id.as_str().trim().is_empty() {
            return Err(AppError::BadRequest("Account id cannot be empty".into()));
        }

        let mut account = Account::new(req.id, req.account_type)
            .with_status(req.status.unwrap_or(AccountStatus::Active));
        if let Some(pin) = req.pin {
            if pin.len() < 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
                return Err(AppError::BadRequest(
                    "PIN must be at least 4 digits".into(),
                ));
            }
            account = account.with_credential_hash(hash_pin(&pin));
        }
        if let Some(profile_id) = req.threshold_profile_id {
            self.repo
                .get_profile(&profile_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Threshold profile {}", profile_id)))?;
            account = account.with_profile(profile_id);
        }

        self.directory.register_account(&account).await?;
        tracing::info!("Account registered");
        Ok(AccountView::from(&account))
    }

    pub async fn get_account(&self, owner: &OwnerId) -> Result<AccountView, AppError> {
        self.directory
            .get_account(owner)
            .await?
            .map(|account| AccountView::from(&account))
            .ok_or_else(|| AppError::NotFound(format!("Account {}", owner)))
    }

    pub async fn set_product_status(
        &self,
        product_id: &str,
        req: ProductStatusRequest,
    ) -> Result<(), AppError> {
        if product_id.trim().is_empty() {
            return Err(AppError::BadRequest("Product id cannot be empty".into()));
        }
        self.catalog
            .set_product_active(product_id, req.active)
            .await?;
        tracing::info!(product = product_id, active = req.active, "Product status changed");
        Ok(())
    }
}
