use std::{fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

/// A stock-keeping unit code, the correlation key between document lines and
/// payload units.
///
/// Surrounding whitespace is trimmed on construction; the remaining text must
/// be non-empty. Comparison is exact (case-sensitive), matching how the 3PL
/// systems echo codes back.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(NonEmptyString);

impl Sku {
    /// Creates a new `Sku`.
    ///
    /// # Errors
    ///
    /// Returns [`BlankSkuError`] if the string is empty or only whitespace.
    pub fn new(s: impl Into<String>) -> Result<Self, BlankSkuError> {
        let s = s.into();
        let trimmed = s.trim();
        let value = if trimmed.len() == s.len() {
            s
        } else {
            trimmed.to_string()
        };
        NonEmptyString::new(value).map(Self).map_err(|_| BlankSkuError)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Error returned when a SKU is blank.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("SKU must not be blank")]
pub struct BlankSkuError;

impl TryFrom<String> for Sku {
    type Error = BlankSkuError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Sku {
    type Error = BlankSkuError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self {
        sku.0.as_str().to_owned()
    }
}

impl FromStr for Sku {
    type Err = BlankSkuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Sku {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Sku {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
