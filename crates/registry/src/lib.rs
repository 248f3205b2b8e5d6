use std::{error, fmt, result};

pub mod controller;
pub mod geocode;
pub mod store;

use controller::Mode;
use store::StoreError;

/// Errors surfaced by registry operations. Store failures never leave a
/// partially applied mirror behind; the mirror keeps its last known good
/// state and the operation can simply be retried.
#[derive(Debug)]
pub enum RegistryError {
    /// The draft is missing data required before a store write.
    Validation(&'static str),
    /// An operation referenced an id the mirror does not know.
    NotFound,
    /// An operation was invoked outside the mode it is valid in.
    Mode {
        operation: &'static str,
        mode: Mode,
    },
    /// The shelter store reported a failure.
    Store(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Validation(what) => {
                write!(f, "validation failed: {}", what)
            }
            RegistryError::NotFound => {
                write!(f, "no shelter with the requested id")
            }
            RegistryError::Mode { operation, mode } => {
                write!(f, "{} is not valid in {:?} mode", operation, mode)
            }
            RegistryError::Store(why) => write!(f, "shelter store error: {}", why),
        }
    }
}

impl error::Error for RegistryError {}

impl From<StoreError> for RegistryError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => RegistryError::NotFound,
            StoreError::Other(why) => RegistryError::Store(why),
        }
    }
}

pub type Result<T> = result::Result<T, RegistryError>;
