//! # Ledger Types
//!
//! Domain types and port traits for the wallet ledger.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, Wallet, thresholds, transfers)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain, repository and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Account, AccountStatus, AccountType, BalanceChange, Direction, ErrorCode, Finalization,
    GroupId, Money, NewTransfer, OwnerId, PageRequest, ProductType, Role, ServiceType,
    ThresholdCheck, ThresholdLimits, ThresholdProfile, ThresholdProfileId, TransferFilter,
    TransferId, TransferLineItem, TransferRecord, TransferStatus, Violation, ViolationKind,
    Wallet, WalletId, WalletKind, WalletStatus, Window, WindowAllowance, WindowUsage, prefix,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError, TransferRejection};
pub use ports::{
    AccountDirectory, AtomicStore, IdGenerator, LedgerRepository, ProductCatalog,
    ThresholdRepository, TransferLedger, TransferScope, WalletStore,
};
