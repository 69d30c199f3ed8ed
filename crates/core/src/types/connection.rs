//! Email connection records and the derived per-shop connection state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConnectionId, Email, Otp, ShopId};

/// A merchant's request to connect an email address to their shop.
///
/// Records are created pending (`activated == false`) and become activated
/// only when the matching code is verified. `(shop_id, email)` is the natural
/// key: requesting again for the same pair replaces the code and resets
/// activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    /// Row identifier.
    pub id: ConnectionId,
    /// Shop the connection belongs to.
    pub shop_id: ShopId,
    /// Address the code was issued for.
    pub email: Email,
    /// Most recently issued code for this pair.
    pub otp: Otp,
    /// Whether the code has been verified.
    pub activated: bool,
    /// When the pair was first requested.
    pub created_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl ConnectionRecord {
    /// Returns true while the record is awaiting verification.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        !self.activated
    }
}

/// Whether a shop currently has a verified email connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No activated connection exists for the shop.
    Unconnected,
    /// The shop is connected through the given address.
    Connected {
        /// The verified address.
        email: Email,
    },
}

impl ConnectionState {
    /// Returns true if the shop has a verified connection.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Returns the connected email, if any.
    #[must_use]
    pub const fn email(&self) -> Option<&Email> {
        match self {
            Self::Connected { email } => Some(email),
            Self::Unconnected => None,
        }
    }
}

impl ConnectionState {
    /// Derive the state from a shop's records.
    ///
    /// The shop is connected only when exactly one record is activated.
    /// Several activated records leave the shop `Unconnected` until it is
    /// reconnected.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = ConnectionRecord>) -> Self {
        let mut activated = records.into_iter().filter(|r| r.activated);
        match (activated.next(), activated.next()) {
            (Some(record), None) => Self::Connected {
                email: record.email,
            },
            _ => Self::Unconnected,
        }
    }
}
