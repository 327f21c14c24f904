//! Domain identifier types with validation
//!
//! This module provides newtype wrappers for report identifiers. Each type
//! ensures type safety and validates format compliance at construction, so
//! an invalid identifier is rejected before any network call is made.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

static MEASURE_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^BR\d{3}$").expect("measure id pattern is valid"));

/// Business measure identifier newtype wrapper
///
/// Measure identifiers follow the fixed format `BR` + three digits
/// (e.g. `BR007`). Report-level export filters are built from this value,
/// so anything else is rejected at configuration-load time.
///
/// # Examples
///
/// ```
/// use easel::domain::ids::MeasureId;
/// use std::str::FromStr;
///
/// let measure = MeasureId::from_str("BR007").unwrap();
/// assert_eq!(measure.as_str(), "BR007");
///
/// assert!(MeasureId::from_str("BR7").is_err());
/// assert!(MeasureId::from_str("XX123").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MeasureId(String);

impl MeasureId {
    /// Creates a new MeasureId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not match `BR` + three digits.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if !MEASURE_ID_PATTERN.is_match(&id) {
            return Err(format!(
                "measure id '{id}' must match the format \"BR\" followed by 3 digits"
            ));
        }
        Ok(Self(id))
    }

    /// Returns the measure id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MeasureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MeasureId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for MeasureId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Deserialization runs the same validation as `new`, so a measure id that
// arrives through a JSON page file or a database row is checked on entry.
impl<'de> Deserialize<'de> for MeasureId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        MeasureId::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_measure_ids() {
        for id in ["BR000", "BR007", "BR123", "BR999"] {
            let measure = MeasureId::new(id).unwrap();
            assert_eq!(measure.as_str(), id);
        }
    }

    #[test]
    fn test_invalid_measure_ids() {
        for id in [
            "", "BR", "BR1", "BR12", "BR1234", "br007", "XX007", "BR07a", "007", " BR007",
            "BR007 ",
        ] {
            assert!(MeasureId::new(id).is_err(), "expected '{id}' to be rejected");
        }
    }

    #[test]
    fn test_from_str() {
        let measure: MeasureId = "BR042".parse().unwrap();
        assert_eq!(measure.to_string(), "BR042");
    }

    #[test]
    fn test_deserialize_valid() {
        let measure: MeasureId = serde_json::from_str("\"BR007\"").unwrap();
        assert_eq!(measure.as_str(), "BR007");
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<MeasureId, _> = serde_json::from_str("\"BR77\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_as_plain_string() {
        let measure = MeasureId::new("BR007").unwrap();
        assert_eq!(serde_json::to_string(&measure).unwrap(), "\"BR007\"");
    }
}
