//! Cart ownership identity.

use serde::{Deserialize, Serialize};

use crate::types::id::{SessionId, UserId};

/// The identity a cart is keyed by: exactly one of an authenticated account
/// or an anonymous browsing session.
///
/// Modeled as a sum type rather than a pair of nullable fields so "exactly
/// one owner" holds by construction for the lifetime of the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKey {
    /// An authenticated account.
    Account(UserId),
    /// An anonymous session.
    Session(SessionId),
}

impl OwnerKey {
    /// The account ID, if this owner is an authenticated account.
    #[must_use]
    pub const fn account_id(&self) -> Option<UserId> {
        match self {
            Self::Account(id) => Some(*id),
            Self::Session(_) => None,
        }
    }

    /// The session ID, if this owner is an anonymous session.
    #[must_use]
    pub const fn session_id(&self) -> Option<SessionId> {
        match self {
            Self::Account(_) => None,
            Self::Session(id) => Some(*id),
        }
    }
}

impl core::fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Account(id) => write!(f, "account:{id}"),
            Self::Session(id) => write!(f, "session:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_is_exactly_one_identity() {
        let account = OwnerKey::Account(UserId::new(1));
        assert!(account.account_id().is_some());
        assert!(account.session_id().is_none());

        let session = OwnerKey::Session(SessionId::generate());
        assert!(session.account_id().is_none());
        assert!(session.session_id().is_some());
    }

    #[test]
    fn test_same_key_compares_equal() {
        let id = SessionId::generate();
        assert_eq!(OwnerKey::Session(id), OwnerKey::Session(id));
        assert_ne!(
            OwnerKey::Account(UserId::new(1)),
            OwnerKey::Account(UserId::new(2))
        );
    }
}
