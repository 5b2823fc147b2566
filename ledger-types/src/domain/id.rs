//! Opaque string identifiers.
//!
//! Ids are minted by an `IdGenerator` as `PREFIX_<suffix>` strings, so the
//! domain never interprets them beyond equality and ordering.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a party (user, merchant or distributor) in the account directory.
    OwnerId
);

string_id!(
    /// Identifier of a wallet row.
    WalletId
);

string_id!(
    /// Identifier of a transfer; also the reference stamped on wallets and line items.
    TransferId
);

string_id!(
    /// Identifier of a threshold profile.
    ThresholdProfileId
);

string_id!(
    /// Limit group inside a threshold profile.
    GroupId
);

impl GroupId {
    pub const DEFAULT: &'static str = "DEFAULT";
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

/// Id prefixes handed to the `IdGenerator`.
pub mod prefix {
    pub const TRANSFER: &str = "TXN";
    pub const WALLET: &str = "WLT";
    pub const PROFILE: &str = "THP";
    /// Direct wallet credits and debits outside a transfer.
    pub const ADJUSTMENT: &str = "ADJ";
}
