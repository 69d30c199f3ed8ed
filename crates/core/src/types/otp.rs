//! One-time passcode.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Otp`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// The input is empty or only whitespace.
    #[error("code cannot be empty")]
    Empty,
}

/// A one-time passcode tied to a pending connection.
///
/// `Debug` is redacted so codes never end up in structured logs by accident;
/// use [`Otp::as_str`] where the raw value is genuinely needed.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Otp(String);

impl Otp {
    /// Parse an `Otp` from user input.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::Empty`] if the trimmed input is empty.
    pub fn parse(s: &str) -> Result<Self, OtpError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(OtpError::Empty);
        }
        Ok(Self(s.to_owned()))
    }

    /// Build a numeric code from its value.
    #[must_use]
    pub fn from_number(code: u32) -> Self {
        Self(code.to_string())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Otp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Otp([REDACTED])")
    }
}

impl std::str::FromStr for Otp {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Otp {
    type Error = OtpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Otp> for String {
    fn from(otp: Otp) -> Self {
        otp.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Otp::parse(" 123456 ").unwrap().as_str(), "123456");
        assert_eq!(Otp::parse(""), Err(OtpError::Empty));
    }

    #[test]
    fn test_from_number() {
        assert_eq!(Otp::from_number(482_913).as_str(), "482913");
    }

    #[test]
    fn test_debug_redacts_code() {
        let otp = Otp::parse("987654").unwrap();
        let debug = format!("{otp:?}");
        assert!(!debug.contains("987654"));
        assert!(debug.contains("REDACTED"));
    }
}
