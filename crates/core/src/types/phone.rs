//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Mobile numbers must have exactly ten digits.
    #[error("phone number must be 10 digits")]
    NotTenDigits,
    /// Free-form numbers must be between the given bounds.
    #[error("phone number must be between {min} and {max} characters")]
    Length {
        /// Minimum accepted length.
        min: usize,
        /// Maximum accepted length.
        max: usize,
    },
}

/// A customer phone number.
///
/// Two shapes are accepted, matching what the backend validates per form:
///
/// - [`PhoneNumber::parse_mobile`] strips every non-digit and requires
///   exactly ten digits (guest enquiries).
/// - [`PhoneNumber::parse_loose`] keeps the trimmed input as typed,
///   allowing `+91` prefixes and spaces, within 7-20 characters
///   (registration).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum length accepted by [`PhoneNumber::parse_loose`].
    pub const LOOSE_MIN: usize = 7;
    /// Maximum length accepted by [`PhoneNumber::parse_loose`].
    pub const LOOSE_MAX: usize = 20;

    /// Parse a ten digit mobile number, ignoring separators.
    ///
    /// ```
    /// use gravis_core::PhoneNumber;
    ///
    /// let phone = PhoneNumber::parse_mobile("98765 43210").unwrap();
    /// assert_eq!(phone.as_str(), "9876543210");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::NotTenDigits`] if the digit count is not ten.
    pub fn parse_mobile(s: &str) -> Result<Self, PhoneError> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != 10 {
            return Err(PhoneError::NotTenDigits);
        }
        Ok(Self(digits))
    }

    /// Parse a free-form phone number by length only.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Length`] if the trimmed input is out of bounds.
    pub fn parse_loose(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        let len = trimmed.chars().count();
        if !(Self::LOOSE_MIN..=Self::LOOSE_MAX).contains(&len) {
            return Err(PhoneError::Length {
                min: Self::LOOSE_MIN,
                max: Self::LOOSE_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number formatted for a `tel:` link (whitespace removed).
    #[must_use]
    pub fn tel_href(&self) -> String {
        let compact: String = self.0.chars().filter(|c| !c.is_whitespace()).collect();
        format!("tel:{compact}")
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
