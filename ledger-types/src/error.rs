//! Error types for the wallet ledger.

use crate::domain::{ErrorCode, TransferId, Violation, WalletId};

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: available {available}, requested {requested} (minor units)")]
    InsufficientBalance { available: i64, requested: i64 },

    #[error("Wallet {0} is inactive")]
    WalletInactive(WalletId),

    #[error("Transfer {0} is already finalized")]
    AlreadyFinalized(TransferId),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    /// Version mismatch or busy storage. Safe to retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),
}

/// Application-level errors.
///
/// Each variant carries one stable [`ErrorCode`] and maps cleanly to an
/// HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: available {available}, requested {requested} (minor units)")]
    InsufficientBalance { available: i64, requested: i64 },

    #[error("{} threshold limit(s) violated", .0.len())]
    ThresholdViolation(Vec<Violation>),

    #[error("Account inactive: {0}")]
    AccountInactive(String),

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Product unavailable: {0}")]
    ProductUnavailable(String),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Outcome of an earlier attempt, replayed from its FAILED record.
    #[error("{remarks}")]
    Replayed { code: ErrorCode, remarks: String },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::BadRequest(_) => ErrorCode::BadRequest,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            AppError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            AppError::ThresholdViolation(_) => ErrorCode::ThresholdViolation,
            AppError::AccountInactive(_) => ErrorCode::AccountInactive,
            AppError::InvalidCredential => ErrorCode::InvalidCredential,
            AppError::ProductUnavailable(_) => ErrorCode::ProductUnavailable,
            AppError::ConcurrencyConflict(_) => ErrorCode::ConcurrencyConflict,
            AppError::Internal(_) => ErrorCode::Internal,
            AppError::Replayed { code, .. } => *code,
        }
    }

    /// Only concurrency conflicts are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ConcurrencyConflict(_))
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Conflict(e) => AppError::ConcurrencyConflict(e),
            RepoError::Duplicate(e) => AppError::BadRequest(e),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Transaction(e) => AppError::Internal(e),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InsufficientBalance {
                available,
                requested,
            } => AppError::InsufficientBalance {
                available,
                requested,
            },
            DomainError::NegativeAmount => AppError::InvalidAmount("Amount cannot be negative".into()),
            DomainError::InvalidAmount(msg) => AppError::InvalidAmount(msg),
            DomainError::WalletInactive(id) => {
                AppError::NotFound(format!("Wallet {} is inactive", id))
            }
            DomainError::AlreadyFinalized(id) => {
                AppError::Internal(format!("Transfer {} is already finalized", id))
            }
            DomainError::ValidationError(msg) => AppError::BadRequest(msg),
        }
    }
}

/// A rejected transfer.
///
/// `transfer_id` is set whenever a FAILED record documents the rejection, so
/// the caller can query it.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct TransferRejection {
    pub transfer_id: Option<TransferId>,
    #[source]
    pub error: AppError,
}

impl TransferRejection {
    pub fn recorded(transfer_id: TransferId, error: AppError) -> Self {
        Self {
            transfer_id: Some(transfer_id),
            error,
        }
    }
}

impl From<AppError> for TransferRejection {
    fn from(error: AppError) -> Self {
        Self {
            transfer_id: None,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicts_are_retryable() {
        let err: AppError = RepoError::Conflict("version mismatch".into()).into();
        assert!(err.is_retryable());
        assert_eq!(err.code(), ErrorCode::ConcurrencyConflict);
    }

    #[test]
    fn test_domain_errors_keep_their_codes() {
        let err: AppError = RepoError::Domain(DomainError::InsufficientBalance {
            available: 100,
            requested: 200,
        })
        .into();
        assert_eq!(err.code(), ErrorCode::InsufficientBalance);
        assert!(!err.is_retryable());

        let err: AppError = DomainError::WalletInactive(WalletId::new("WLT_1")).into();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_database_errors_are_internal() {
        let err: AppError = RepoError::Database("disk full".into()).into();
        assert_eq!(err.code(), ErrorCode::Internal);
    }
}
