//! Account directory entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::id::{OwnerId, ThresholdProfileId};
use crate::error::DomainError;

/// Category of a party; tags wallets, line items and threshold profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    User,
    Merchant,
    Distributor,
    Admin,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::User => "USER",
            AccountType::Merchant => "MERCHANT",
            AccountType::Distributor => "DISTRIBUTOR",
            AccountType::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(AccountType::User),
            "MERCHANT" => Ok(AccountType::Merchant),
            "DISTRIBUTOR" => Ok(AccountType::Distributor),
            "ADMIN" => Ok(AccountType::Admin),
            other => Err(DomainError::ValidationError(format!(
                "unknown account type: {}",
                other
            ))),
        }
    }
}

/// Whether an account (or profile) may take part in transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Inactive => "INACTIVE",
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(AccountStatus::Active),
            "INACTIVE" => Ok(AccountStatus::Inactive),
            other => Err(DomainError::ValidationError(format!(
                "unknown status: {}",
                other
            ))),
        }
    }
}

/// A party known to the account directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: OwnerId,
    pub account_type: AccountType,
    pub status: AccountStatus,
    /// SHA-256 hex digest of the transaction PIN, if one was set.
    #[serde(skip_serializing)]
    pub credential_hash: Option<String>,
    pub threshold_profile_id: Option<ThresholdProfileId>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(id: OwnerId, account_type: AccountType) -> Self {
        Self {
            id,
            account_type,
            status: AccountStatus::Active,
            credential_hash: None,
            threshold_profile_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_credential_hash(mut self, hash: impl Into<String>) -> Self {
        self.credential_hash = Some(hash.into());
        self
    }

    pub fn with_profile(mut self, profile: ThresholdProfileId) -> Self {
        self.threshold_profile_id = Some(profile);
        self
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_builder() {
        let account = Account::new(OwnerId::new("USR_1"), AccountType::User)
            .with_profile(ThresholdProfileId::new("THP_1"));

        assert!(account.is_active());
        assert_eq!(
            account.threshold_profile_id,
            Some(ThresholdProfileId::new("THP_1"))
        );
        assert!(account.credential_hash.is_none());
    }

    #[test]
    fn test_account_type_parse() {
        assert_eq!(
            "MERCHANT".parse::<AccountType>().unwrap(),
            AccountType::Merchant
        );
        assert!(matches!(
            "ROBOT".parse::<AccountType>(),
            Err(DomainError::ValidationError(_))
        ));
    }
}
