//! Customer username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum UsernameError {
    /// The input string is too short.
    #[error("username must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The input string is too long.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A customer username.
///
/// Usernames are matched case-insensitively everywhere, so this type
/// normalizes to lowercase at the boundary: two inputs that differ only in
/// case parse to the same `Username`.
///
/// ## Constraints
///
/// - Length: 3-64 characters (after trimming surrounding whitespace)
/// - Stored and compared in lowercase
///
/// ## Examples
///
/// ```
/// use punchcard_core::Username;
///
/// let a = Username::parse("Maria").unwrap();
/// let b = Username::parse("  maria ").unwrap();
/// assert_eq!(a, b);
///
/// assert!(Username::parse("ab").is_err()); // too short
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Minimum length of a username.
    pub const MIN_LENGTH: usize = 3;

    /// Maximum length of a username.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `Username` from a string.
    ///
    /// Trims surrounding whitespace and lowercases the input before
    /// validating, matching how usernames are entered on a phone keyboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is shorter than 3 or longer
    /// than 64 characters.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let normalized = s.trim().to_lowercase();

        if normalized.chars().count() < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }

        if normalized.chars().count() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(normalized))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Username` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Username {
    type Err = UsernameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(Username::parse("bob").is_ok());
        assert!(Username::parse("maria.santos").is_ok());
        assert!(Username::parse("abc").is_ok());
    }

    #[test]
    fn test_parse_too_short() {
        assert!(matches!(
            Username::parse("ab"),
            Err(UsernameError::TooShort { .. })
        ));
        assert!(matches!(
            Username::parse("  a  "),
            Err(UsernameError::TooShort { .. })
        ));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(65);
        assert!(matches!(
            Username::parse(&long),
            Err(UsernameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_normalizes_case() {
        let upper = Username::parse("Bob").unwrap();
        let lower = Username::parse("bob").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "bob");
    }

    #[test]
    fn test_trims_whitespace() {
        let name = Username::parse("  carla  ").unwrap();
        assert_eq!(name.as_str(), "carla");
    }

    #[test]
    fn test_display() {
        let name = Username::parse("Dana").unwrap();
        assert_eq!(format!("{name}"), "dana");
    }

    #[test]
    fn test_serde_roundtrip() {
        let name = Username::parse("erin").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"erin\"");

        let parsed: Username = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }
}
