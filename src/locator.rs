//! Compound `"<device>::<entity>"` locators

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LocateError;

/// Separator between the device and entity parts
pub const DELIMITER: &str = "::";

/// A device name and an entity name.
///
/// Parsing splits on the first `::` only; the entity part keeps any later
/// `::` verbatim. Names are not escaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator {
    device: String,
    entity: String,
}

impl Locator {
    pub fn new(device: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            entity: entity.into(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, LocateError> {
        s.split_once(DELIMITER)
            .map(|(device, entity)| Self::new(device, entity))
            .ok_or_else(|| LocateError::MalformedLocator(s.to_string()))
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }
}

impl FromStr for Locator {
    type Err = LocateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locator {
    type Error = LocateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> String {
        locator.to_string()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.device, DELIMITER, self.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let locator = Locator::parse("Keystation::Port 1").unwrap();
        assert_eq!(locator.device(), "Keystation");
        assert_eq!(locator.entity(), "Port 1");
    }

    #[test]
    fn test_parse_splits_on_first_delimiter() {
        let locator = Locator::parse("A::B::C").unwrap();
        assert_eq!(locator.device(), "A");
        assert_eq!(locator.entity(), "B::C");
    }

    #[test]
    fn test_parse_allows_empty_parts() {
        let locator: Locator = "::".parse().unwrap();
        assert_eq!(locator.device(), "");
        assert_eq!(locator.entity(), "");
    }

    #[test]
    fn test_parse_missing_delimiter() {
        assert_eq!(
            Locator::parse("Keystation Port 1"),
            Err(LocateError::MalformedLocator("Keystation Port 1".to_string()))
        );
        assert!(Locator::parse("Keystation:Port 1").is_err());
        assert!(Locator::parse("").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Locator::new("D", "E").to_string(), "D::E");
    }

    #[test]
    fn test_serde_as_string() {
        let locator: Locator = serde_yaml::from_str("\"Keystation::Port 1\"").unwrap();
        assert_eq!(locator, Locator::new("Keystation", "Port 1"));
        assert_eq!(serde_json::to_string(&locator).unwrap(), "\"Keystation::Port 1\"");

        assert!(serde_yaml::from_str::<Locator>("\"no delimiter\"").is_err());
    }
}
