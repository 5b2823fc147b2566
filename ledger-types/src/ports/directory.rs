//! Collaborators the ledger consumes but does not own.

use crate::domain::{Account, OwnerId, ServiceType};
use crate::error::RepoError;

/// Looks up parties: type, status, PIN hash and threshold profile.
#[async_trait::async_trait]
pub trait AccountDirectory: Send + Sync + 'static {
    async fn get_account(&self, owner: &OwnerId) -> Result<Option<Account>, RepoError>;

    /// Adds or replaces a directory entry.
    async fn register_account(&self, account: &Account) -> Result<(), RepoError>;
}

/// Product and service-type availability.
///
/// Unknown products and services are inactive.
#[async_trait::async_trait]
pub trait ProductCatalog: Send + Sync + 'static {
    async fn is_active(&self, product_id: &str) -> Result<bool, RepoError>;

    async fn is_active_service(&self, service: ServiceType) -> Result<bool, RepoError>;

    async fn set_product_active(&self, product_id: &str, active: bool) -> Result<(), RepoError>;

    async fn set_service_active(&self, service: ServiceType, active: bool)
    -> Result<(), RepoError>;
}

/// Mints opaque unique ids of the form `PREFIX_<suffix>`.
pub trait IdGenerator: Send + Sync + 'static {
    fn new_id(&self, prefix: &str) -> String;
}
