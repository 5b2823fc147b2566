//! Transfer ledger port.

use chrono::{DateTime, Utc};

use crate::domain::{
    Finalization, OwnerId, PageRequest, Role, TransferFilter, TransferId, TransferLineItem,
    TransferRecord, WindowUsage,
};
use crate::error::RepoError;

/// Append-mostly store of transfer headers and their line items.
///
/// Line items are only written through a [`super::TransferScope`].
#[async_trait::async_trait]
pub trait TransferLedger: Send + Sync + 'static {
    /// Persists a PENDING header. A reused idempotency key is
    /// [`RepoError::Duplicate`].
    async fn append_header(&self, record: &TransferRecord) -> Result<(), RepoError>;

    /// Finalizes a header outside any scope. Used to record failures after a
    /// scope was rolled back.
    async fn finalize(
        &self,
        id: &TransferId,
        fin: &Finalization,
    ) -> Result<TransferRecord, RepoError>;

    async fn get_transfer(&self, id: &TransferId) -> Result<Option<TransferRecord>, RepoError>;

    async fn transfer_items(&self, id: &TransferId) -> Result<Vec<TransferLineItem>, RepoError>;

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<TransferRecord>, RepoError>;

    /// Transfers where `owner` is payer or payee, newest first, with the
    /// total number of matches.
    async fn list_by_party(
        &self,
        owner: &OwnerId,
        filter: &TransferFilter,
        page: PageRequest,
    ) -> Result<(Vec<TransferRecord>, u64), RepoError>;

    /// Count and sum of SUCCESS transfers where `owner` had `role`, created
    /// in `[start, end)`.
    async fn usage(
        &self,
        owner: &OwnerId,
        role: Role,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WindowUsage, RepoError>;
}
