//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod directory;
mod ledger;
mod store;
mod threshold;
mod wallet;

pub use directory::{AccountDirectory, IdGenerator, ProductCatalog};
pub use ledger::TransferLedger;
pub use store::{AtomicStore, TransferScope};
pub use threshold::ThresholdRepository;
pub use wallet::WalletStore;

/// Everything the ledger services need from one storage backend.
pub trait LedgerRepository: WalletStore + TransferLedger + ThresholdRepository {}

impl<T> LedgerRepository for T where T: WalletStore + TransferLedger + ThresholdRepository {}
