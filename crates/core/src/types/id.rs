//! Newtype IDs for database-assigned row identifiers.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers so an image
//! id can never be passed where a connection row id is expected.

/// Define an `i32` newtype for a `SERIAL` primary key.
///
/// The type is `Copy`, serializes as a bare number, parses from a
/// (whitespace-trimmed) decimal string, and binds to `PostgreSQL` as `INT4`
/// when the `postgres` feature is enabled.
///
/// # Example
///
/// ```rust
/// # use interactive_studio_core::define_id;
/// define_id!(WidgetId);
///
/// let id: WidgetId = "42".parse().unwrap();
/// assert_eq!(id.as_i32(), 42);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl ::core::convert::From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(ConnectionId);
define_id!(ImageId);
define_id!(ImageRegistrationId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id: ImageId = " 17 ".parse().unwrap();
        assert_eq!(id, ImageId::new(17));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!("abc".parse::<ImageId>().is_err());
        assert!("".parse::<ImageId>().is_err());
    }

    #[test]
    fn test_serializes_as_bare_number() {
        let json = serde_json::to_string(&ImageId::new(5)).unwrap();
        assert_eq!(json, "5");
    }
}
