//! Domain models for the wallet ledger.

pub mod account;
pub mod id;
pub mod money;
pub mod threshold;
pub mod transfer;
pub mod wallet;

pub use account::{Account, AccountStatus, AccountType};
pub use id::{GroupId, OwnerId, ThresholdProfileId, TransferId, WalletId, prefix};
pub use money::Money;
pub use threshold::{
    Caps, Role, ThresholdCheck, ThresholdLimits, ThresholdProfile, Violation, ViolationKind,
    Window, WindowAllowance, WindowUsage,
};
pub use transfer::{
    Direction, ErrorCode, Finalization, NewTransfer, PageRequest, ProductType, ServiceType,
    TransferFilter, TransferLineItem, TransferRecord, TransferStatus,
};
pub use wallet::{BalanceChange, DEFAULT_CEILING, Wallet, WalletKind, WalletStatus};
