//! Shop (tenant) identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of a Shopify global ID for a shop.
const SHOP_GID_PREFIX: &str = "gid://shopify/Shop/";

/// Errors that can occur when parsing a [`ShopId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopIdError {
    /// The input is empty or only whitespace.
    #[error("shop id cannot be empty")]
    Empty,
    /// A global ID did not have the `gid://shopify/Shop/<n>` shape.
    #[error("not a shop global id: {0}")]
    InvalidGid(String),
}

/// Opaque identifier of a single merchant's store.
///
/// Every connection operation is scoped by an explicit `ShopId`; it is never
/// read from ambient request state. The admin page derives it from the
/// numeric tail of the shop's global ID, and the theme extension sends the
/// same number as the `shopId` query parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopId(String);

impl ShopId {
    /// Parse a `ShopId` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`ShopIdError::Empty`] if the trimmed input is empty.
    pub fn parse(s: &str) -> Result<Self, ShopIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShopIdError::Empty);
        }
        Ok(Self(s.to_owned()))
    }

    /// Extract the shop id from a Shopify global ID such as
    /// `gid://shopify/Shop/548380009`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopIdError::InvalidGid`] if the prefix is missing or the
    /// trailing segment is empty.
    ///
    /// ```
    /// use interactive_studio_core::ShopId;
    ///
    /// let id = ShopId::from_gid("gid://shopify/Shop/548380009").unwrap();
    /// assert_eq!(id.as_str(), "548380009");
    /// ```
    pub fn from_gid(gid: &str) -> Result<Self, ShopIdError> {
        let tail = gid
            .strip_prefix(SHOP_GID_PREFIX)
            .ok_or_else(|| ShopIdError::InvalidGid(gid.to_owned()))?;
        Self::parse(tail).map_err(|_| ShopIdError::InvalidGid(gid.to_owned()))
    }

    /// Returns the shop id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ShopId {
    type Err = ShopIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopId {
    type Error = ShopIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopId> for String {
    fn from(id: ShopId) -> Self {
        id.0
    }
}

impl AsRef<str> for ShopId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
