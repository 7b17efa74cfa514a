//! Error types for locator resolution.

use thiserror::Error;

use crate::table::Direction;

/// Why a locator did not resolve
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("malformed locator {0:?} (expected \"<device>::<entity>\")")]
    MalformedLocator(String),

    #[error("no device named {0:?}")]
    DeviceNotFound(String),

    #[error("device {device:?} has no entity named {entity:?}")]
    EntityNotFound { device: String, entity: String },

    #[error("device {device:?} has no entity at index {index}")]
    EntityIndexOutOfRange { device: String, index: usize },

    #[error("{locator} has no {direction} at index {index}")]
    EndpointNotFound {
        locator: String,
        direction: Direction,
        index: usize,
    },
}

impl LocateError {
    /// True for every variant except a malformed locator
    pub fn is_not_found(&self) -> bool {
        !matches!(self, LocateError::MalformedLocator(_))
    }
}

pub type Result<T> = std::result::Result<T, LocateError>;
