//! # Ledger Repository
//!
//! Storage adapters for the wallet ledger. Every adapter implements the
//! store ports from `ledger-types` (wallets, transfer ledger, thresholds,
//! account directory and product catalog) plus the atomic scope used to
//! post both legs of a transfer together.

#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "sqlite")]
mod types;

pub mod ids;
pub mod memory;
pub mod security;


pub use ids::PrefixedIdGenerator;
pub use memory::MemoryRepo;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepo;

/// Build and initialize a repository from a database URL.
///
/// Connects, applies the schema and seeds the service catalog.
///
/// # Examples
///
/// ```ignore
/// let repo = build_repo("sqlite://data/ledger.db?mode=rwc").await?;
/// let repo = build_repo("sqlite::memory:").await?;
/// ```
#[cfg(feature = "sqlite")]
pub async fn build_repo(database_url: &str) -> anyhow::Result<SqliteRepo> {
    SqliteRepo::new(database_url).await
}
