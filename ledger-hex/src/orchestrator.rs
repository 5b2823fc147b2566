//! Transfer orchestration.
//!
//! Each transfer walks `CREATED → VALIDATING → DEBITING → CREDITING →
//! ITEMIZING → FINALIZING` and ends SUCCESS or FAILED. Wallet mutations,
//! line items and the SUCCESS finalization share one atomic scope; any
//! failure discards the scope and the PENDING header is finalized FAILED in a
//! separate write that always lands.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ledger_types::{
    Account, AccountDirectory, AppError, Direction, ErrorCode, Finalization, GroupId, IdGenerator,
    LedgerRepository, Money, NewTransfer, OwnerId, PaymentRequest, ProductCatalog, RepoError,
    Role, TransferId, TransferLineItem, TransferRecord, TransferRejection, TransferRequest,
    TransferResponse, TransferScope, TransferStatus, Wallet, WalletKind, prefix,
};

use crate::locks::KeyedLocks;
use crate::thresholds::ThresholdGuard;
use crate::wallets::WalletService;

/// Longest accepted remarks, in characters.
pub const MAX_REMARKS_LEN: usize = 500;

/// Tuning for conflict handling.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// Bound on waiting for a party or idempotency-key lock.
    pub lock_wait: Duration,
    /// Extra attempts after a retryable conflict.
    pub conflict_retries: u32,
    /// Base backoff; attempt `n` sleeps `n × retry_backoff`.
    pub retry_backoff: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            lock_wait: Duration::from_millis(2000),
            conflict_retries: 3,
            retry_backoff: Duration::from_millis(25),
        }
    }
}

/// Stages of one transfer, logged as it advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    Validating,
    Debiting,
    Crediting,
    Itemizing,
    Finalizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Created => "CREATED",
            Stage::Validating => "VALIDATING",
            Stage::Debiting => "DEBITING",
            Stage::Crediting => "CREDITING",
            Stage::Itemizing => "ITEMIZING",
            Stage::Finalizing => "FINALIZING",
        })
    }
}

/// A request that passed request-level validation.
struct TransferCommand {
    transfer: NewTransfer,
    group: GroupId,
}

impl TransferCommand {
    fn parse(req: TransferRequest, product_id: Option<String>) -> Result<Self, AppError> {
        if req.payer_id.as_str().trim().is_empty() || req.payee_id.as_str().trim().is_empty() {
            return Err(AppError::BadRequest("Payer and payee are required".into()));
        }
        if req.payer_id == req.payee_id {
            return Err(AppError::BadRequest(
                "Payer and payee must be different".into(),
            ));
        }

        let amount = Money::from_major(req.amount)?;

        if let Some(remarks) = &req.remarks {
            if remarks.chars().count() > MAX_REMARKS_LEN {
                return Err(AppError::BadRequest(format!(
                    "Remarks cannot exceed {} characters",
                    MAX_REMARKS_LEN
                )));
            }
        }
        if let Some(key) = &req.idempotency_key {
            if key.trim().is_empty() {
                return Err(AppError::BadRequest(
                    "Idempotency key cannot be blank".into(),
                ));
            }
        }
        if let Some(product) = &product_id {
            if product.trim().is_empty() {
                return Err(AppError::BadRequest("Product id is required".into()));
            }
        }

        let created_by = req.created_by.unwrap_or_else(|| req.payer_id.clone());
        Ok(Self {
            transfer: NewTransfer {
                payer_id: req.payer_id,
                payee_id: req.payee_id,
                amount,
                service_type: req.service_type,
                product_type: req.product_type,
                product_id,
                remarks: req.remarks,
                idempotency_key: req.idempotency_key,
                created_by,
            },
            group: req.group_id.unwrap_or_default(),
        })
    }
}

/// Sequences threshold checks, wallet mutations and ledger writes into one
/// all-or-nothing unit per transfer.
pub struct TransferOrchestrator<R: LedgerRepository> {
    repo: Arc<R>,
    wallets: Arc<WalletService<R>>,
    guard: Arc<ThresholdGuard<R>>,
    directory: Arc<dyn AccountDirectory>,
    catalog: Arc<dyn ProductCatalog>,
    ids: Arc<dyn IdGenerator>,
    locks: Arc<KeyedLocks>,
    config: OrchestratorConfig,
}

impl<R: LedgerRepository> TransferOrchestrator<R> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<R>,
        wallets: Arc<WalletService<R>>,
        guard: Arc<ThresholdGuard<R>>,
        directory: Arc<dyn AccountDirectory>,
        catalog: Arc<dyn ProductCatalog>,
        ids: Arc<dyn IdGenerator>,
        locks: Arc<KeyedLocks>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            repo,
            wallets,
            guard,
            directory,
            catalog,
            ids,
            locks,
            config,
        }
    }

    /// Moves `amount` from the payer's MAIN wallet to the payee's.
    #[tracing::instrument(skip(self, req), fields(payer = %req.payer_id, payee = %req.payee_id, amount = %req.amount))]
    pub async fn process_transfer(
        &self,
        req: TransferRequest,
    ) -> Result<TransferResponse, TransferRejection> {
        let command = TransferCommand::parse(req, None)?;
        self.run(command).await
    }

    /// Recharge and bill payment: a transfer behind actor, credential and
    /// catalog gates. Gate failures write no record.
    #[tracing::instrument(skip(self, req), fields(payer = %req.transfer.payer_id, payee = %req.transfer.payee_id, product = %req.product_id))]
    pub async fn process_payment(
        &self,
        req: PaymentRequest,
    ) -> Result<TransferResponse, TransferRejection> {
        let PaymentRequest {
            transfer,
            product_id,
            pin,
        } = req;
        let command = TransferCommand::parse(transfer, Some(product_id))?;
        self.check_gates(&command.transfer, &pin).await?;
        self.run(command).await
    }

    async fn check_gates(&self, transfer: &NewTransfer, pin: &str) -> Result<(), AppError> {
        // The PIN always unlocks the wallet that pays, never the actor's own.
        let payer = self.active_account(&transfer.payer_id).await?;
        if transfer.created_by != transfer.payer_id {
            self.active_account(&transfer.created_by).await?;
        }

        let verified = payer
            .credential_hash
            .as_deref()
            .is_some_and(|hash| ledger_repo::security::verify_pin(pin, hash));
        if !verified {
            tracing::warn!(payer = %transfer.payer_id, actor = %transfer.created_by, "Credential rejected");
            return Err(AppError::InvalidCredential);
        }

        let product = transfer.product_id.as_deref().unwrap_or_default();
        if !self.catalog.is_active(product).await? {
            return Err(AppError::ProductUnavailable(format!(
                "Product {} is not available",
                product
            )));
        }
        if !self.catalog.is_active_service(transfer.service_type).await? {
            return Err(AppError::ProductUnavailable(format!(
                "Service {} is not available",
                transfer.service_type
            )));
        }
        Ok(())
    }

    async fn active_account(&self, owner: &OwnerId) -> Result<Account, AppError> {
        let account = self
            .directory
            .get_account(owner)
            .await?
            .ok_or_else(|| AppError::AccountInactive(format!("Account {} does not exist", owner)))?;
        if !account.is_active() {
            return Err(AppError::AccountInactive(format!(
                "Account {} is not active",
                owner
            )));
        }
        Ok(account)
    }

    async fn run(&self, command: TransferCommand) -> Result<TransferResponse, TransferRejection> {
        // Serializes attempts that share a key; held until the outcome is final.
        let _key_lock = match &command.transfer.idempotency_key {
            Some(key) => {
                let lock = self.locks.acquire([format!("idem:{}", key)]).await?;
                let existing = self
                    .repo
                    .find_by_idempotency_key(key)
                    .await
                    .map_err(AppError::from)?;
                if let Some(existing) = existing {
                    return self.replay(existing, &command.transfer).await;
                }
                Some(lock)
            }
            None => None,
        };

        let attempt = command
            .transfer
            .idempotency_key
            .is_some()
            .then(|| command.transfer.clone());
        let record = TransferRecord::pending(
            TransferId::new(self.ids.new_id(prefix::TRANSFER)),
            command.transfer,
            Utc::now(),
        );
        if let Err(e) = self.repo.append_header(&record).await {
            // Another process sharing the store recorded the key first.
            if let (RepoError::Duplicate(_), Some(key), Some(attempt)) =
                (&e, &record.idempotency_key, &attempt)
            {
                let existing = self
                    .repo
                    .find_by_idempotency_key(key)
                    .await
                    .map_err(AppError::from)?;
                if let Some(existing) = existing {
                    return self.replay(existing, attempt).await;
                }
            }
            return Err(AppError::from(e).into());
        }
        tracing::debug!(transfer_id = %record.id, stage = %Stage::Created, "Transfer recorded");

        match self.execute_with_retry(&record, &command.group).await {
            Ok(response) => {
                tracing::info!(
                    transfer_id = %record.id,
                    amount = record.amount.minor(),
                    "Transfer succeeded"
                );
                Ok(response)
            }
            Err(error) => {
                tracing::warn!(transfer_id = %record.id, code = %error.code(), error = %error, "Transfer failed");
                self.record_failure(&record.id, &error).await;
                Err(TransferRejection::recorded(record.id, error))
            }
        }
    }

    async fn execute_with_retry(
        &self,
        record: &TransferRecord,
        group: &GroupId,
    ) -> Result<TransferResponse, AppError> {
        let mut attempt = 0;
        loop {
            match self.execute(record, group).await {
                Err(error) if error.is_retryable() && attempt < self.config.conflict_retries => {
                    attempt += 1;
                    tracing::debug!(transfer_id = %record.id, attempt, error = %error, "Retrying after conflict");
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                }
                outcome => return outcome,
            }
        }
    }

    async fn execute(
        &self,
        record: &TransferRecord,
        group: &GroupId,
    ) -> Result<TransferResponse, AppError> {
        let _parties = self
            .locks
            .acquire([record.payer_id.as_str(), record.payee_id.as_str()])
            .await?;

        tracing::debug!(transfer_id = %record.id, stage = %Stage::Validating);
        let payer_check = self
            .guard
            .validate(&record.payer_id, record.amount, Role::Payer, group)
            .await?;
        let payee_check = self
            .guard
            .validate(&record.payee_id, record.amount, Role::Payee, group)
            .await?;
        let violations: Vec<_> = payer_check
            .violations
            .into_iter()
            .chain(payee_check.violations)
            .collect();
        if !violations.is_empty() {
            return Err(AppError::ThresholdViolation(violations));
        }

        let payer = self
            .wallets
            .active_wallet(&record.payer_id, WalletKind::Main)
            .await?;
        let payee = self
            .wallets
            .active_wallet(&record.payee_id, WalletKind::Main)
            .await?;

        let mut scope = self.repo.begin().await?;
        match post(scope.as_mut(), record, &payer, &payee).await {
            Ok(response) => {
                scope.commit().await?;
                Ok(response)
            }
            Err(error) => {
                if let Err(e) = scope.rollback().await {
                    tracing::error!(transfer_id = %record.id, error = %e, "Rollback failed");
                }
                Err(error)
            }
        }
    }

    async fn record_failure(&self, id: &TransferId, error: &AppError) {
        let fin = Finalization::failed(error.code(), failure_remarks(error));
        if let Err(e) = self.repo.finalize(id, &fin).await {
            tracing::error!(transfer_id = %id, error = %e, "Could not record failed transfer");
        }
    }

    /// Answers a repeated idempotency key from the stored outcome.
    async fn replay(
        &self,
        existing: TransferRecord,
        attempt: &NewTransfer,
    ) -> Result<TransferResponse, TransferRejection> {
        if existing.payer_id != attempt.payer_id
            || existing.payee_id != attempt.payee_id
            || existing.amount != attempt.amount
        {
            return Err(AppError::BadRequest(
                "Idempotency key was already used for a different transfer".into(),
            )
            .into());
        }

        tracing::info!(transfer_id = %existing.id, status = %existing.status, "Replaying transfer");
        match existing.status {
            TransferStatus::Success => {
                let items = self
                    .repo
                    .transfer_items(&existing.id)
                    .await
                    .map_err(AppError::from)?;
                let post_of = |direction: Direction| {
                    items
                        .iter()
                        .find(|item| item.direction == direction)
                        .map(|item| item.post_balance.to_major())
                        .ok_or_else(|| {
                            AppError::Internal(format!(
                                "Transfer {} has no {} line item",
                                existing.id, direction
                            ))
                        })
                };

                Ok(TransferResponse {
                    transfer_id: existing.id.clone(),
                    status: TransferStatus::Success,
                    payer_balance: post_of(Direction::Debit)?,
                    payee_balance: post_of(Direction::Credit)?,
                    replayed: true,
                })
            }
            TransferStatus::Failed => Err(TransferRejection::recorded(
                existing.id,
                AppError::Replayed {
                    code: existing.error_code.unwrap_or(ErrorCode::Internal),
                    remarks: existing.remarks.unwrap_or_default(),
                },
            )),
            TransferStatus::Pending => {
                let message = format!("Transfer {} is still in progress", existing.id);
                Err(TransferRejection::recorded(
                    existing.id,
                    AppError::ConcurrencyConflict(message),
                ))
            }
        }
    }
}

/// Debit, credit, itemize and finalize inside one scope.
async fn post(
    scope: &mut dyn TransferScope,
    record: &TransferRecord,
    payer: &Wallet,
    payee: &Wallet,
) -> Result<TransferResponse, AppError> {
    tracing::debug!(transfer_id = %record.id, stage = %Stage::Debiting);
    let debit = scope.debit(&payer.id, record.amount, &record.id).await?;

    tracing::debug!(transfer_id = %record.id, stage = %Stage::Crediting);
    let credit = scope.credit(&payee.id, record.amount, &record.id).await?;

    tracing::debug!(transfer_id = %record.id, stage = %Stage::Itemizing);
    let now = Utc::now();
    let debit_item =
        TransferLineItem::from_change(record, Direction::Debit, &debit, payer.owner_type, now);
    let credit_item =
        TransferLineItem::from_change(record, Direction::Credit, &credit, payee.owner_type, now);
    scope.append_items(&debit_item, &credit_item).await?;

    tracing::debug!(transfer_id = %record.id, stage = %Stage::Finalizing);
    scope
        .finalize(&record.id, &Finalization::success(None))
        .await?;

    Ok(TransferResponse {
        transfer_id: record.id.clone(),
        status: TransferStatus::Success,
        payer_balance: debit.post.to_major(),
        payee_balance: credit.post.to_major(),
        replayed: false,
    })
}

fn failure_remarks(error: &AppError) -> String {
    let remarks = match error {
        AppError::ThresholdViolation(violations) => violations
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    };
    match remarks.char_indices().nth(MAX_REMARKS_LEN) {
        Some((cut, _)) => remarks[..cut].to_string(),
        None => remarks,
    }
}
