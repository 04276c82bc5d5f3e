use super::ValidationError;
use crate::constants::DOCUMENT_ENDPOINT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::num::NonZeroUsize;

/// Opaque key addressing one document in the remote service.
///
/// Identifiers are compared byte-for-byte; the only normalization applied
/// at construction is trimming surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Creates an identifier, rejecting blank input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField("identifier"));
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Identifier {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for Identifier {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum number of identifiers the remote service accepts in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    pub fn new(value: usize) -> Result<Self, ValidationError> {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or(ValidationError::OutOfBounds {
                value,
                min: 1,
                max: usize::MAX,
            })
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        // The endpoint constant is a non-zero literal.
        Self(NonZeroUsize::new(DOCUMENT_ENDPOINT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_trims_whitespace() {
        let id = Identifier::new("  abc123 ").unwrap();
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn identifier_rejects_blank_input() {
        assert_eq!(
            Identifier::new("   "),
            Err(ValidationError::EmptyField("identifier"))
        );
        assert!(Identifier::try_from("").is_err());
    }

    #[test]
    fn identifier_serializes_as_plain_string() {
        let id = Identifier::new("1a2b").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"1a2b\"");
        let back: Identifier = serde_json::from_str("\"1a2b\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn deserializing_validates_like_new() {
        let trimmed: Identifier = serde_json::from_str("\" 1a2b \"").unwrap();
        assert_eq!(trimmed.as_str(), "1a2b");
        assert!(serde_json::from_str::<Identifier>("\"  \"").is_err());
    }

    #[test]
    fn page_size_rejects_zero() {
        assert!(matches!(
            PageSize::new(0),
            Err(ValidationError::OutOfBounds { value: 0, min: 1, .. })
        ));
        assert_eq!(PageSize::new(2).unwrap().get(), 2);
    }

    #[test]
    fn page_size_defaults_to_endpoint_limit() {
        assert_eq!(PageSize::default().get(), DOCUMENT_ENDPOINT_PAGE_SIZE);
    }
}
