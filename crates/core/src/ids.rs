//! List and page identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a logical list (collection of pages).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(i64);

impl ListId {
    /// Create a list id, rejecting non-positive values.
    pub fn new(id: i64) -> crate::Result<Self> {
        if id <= 0 {
            return Err(crate::Error::InvalidId(format!(
                "list id must be positive, got {id}"
            )));
        }
        Ok(Self(id))
    }

    /// Parse from a decimal string (e.g. a path segment).
    pub fn parse(s: &str) -> crate::Result<Self> {
        let id = s
            .parse::<i64>()
            .map_err(|e| crate::Error::InvalidId(format!("invalid list id '{s}': {e}")))?;
        Self::new(id)
    }

    /// Wrap a value read back from storage without re-validating it.
    pub fn from_stored(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListId({})", self.0)
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a page. Page ids come from a single monotonic sequence,
/// so within one list a larger id always means a later page in the chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(i64);

impl PageId {
    /// Create a page id, rejecting non-positive values.
    pub fn new(id: i64) -> crate::Result<Self> {
        if id <= 0 {
            return Err(crate::Error::InvalidId(format!(
                "page id must be positive, got {id}"
            )));
        }
        Ok(Self(id))
    }

    /// Parse from a decimal string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let id = s
            .parse::<i64>()
            .map_err(|e| crate::Error::InvalidId(format!("invalid page id '{s}': {e}")))?;
        Self::new(id)
    }

    /// Wrap a value read back from storage without re-validating it.
    pub fn from_stored(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId({})", self.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_id_rejects_non_positive() {
        assert!(ListId::new(0).is_err());
        assert!(ListId::new(-3).is_err());
        assert_eq!(ListId::new(7).unwrap().get(), 7);
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(ListId::parse("12").unwrap().get(), 12);
        assert_eq!(PageId::parse("1").unwrap().get(), 1);
        assert!(ListId::parse("abc").is_err());
        assert!(PageId::parse("").is_err());
        assert!(PageId::parse("0").is_err());
    }

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        let page = PageId::new(42).unwrap();
        assert_eq!(serde_json::to_string(&page).unwrap(), "42");
        let list: ListId = serde_json::from_str("3").unwrap();
        assert_eq!(list.get(), 3);
    }
}
