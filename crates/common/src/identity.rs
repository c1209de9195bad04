//! Shopper identity: who a cart belongs to.

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, SessionToken};

/// The identity a cart is resolved against.
///
/// A shopper is either an authenticated account or an anonymous visitor
/// identified by a stable session token — never both, never neither. The
/// identity provider is external; this type only carries its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopperIdentity {
    /// An authenticated shopper.
    Account(AccountId),

    /// An anonymous visitor with a session token.
    Session(SessionToken),
}

impl ShopperIdentity {
    /// Returns the account ID for authenticated shoppers.
    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            ShopperIdentity::Account(id) => Some(*id),
            ShopperIdentity::Session(_) => None,
        }
    }

    /// Returns the session token for anonymous shoppers.
    pub fn session_token(&self) -> Option<&SessionToken> {
        match self {
            ShopperIdentity::Account(_) => None,
            ShopperIdentity::Session(token) => Some(token),
        }
    }

    /// Returns true for anonymous shoppers.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, ShopperIdentity::Session(_))
    }
}

impl std::fmt::Display for ShopperIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShopperIdentity::Account(id) => write!(f, "account:{id}"),
            ShopperIdentity::Session(token) => write!(f, "session:{token}"),
        }
    }
}
