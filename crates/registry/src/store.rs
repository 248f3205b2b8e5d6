use std::{error, fmt, result};

use async_trait::async_trait;
use model::{
    shelter::{Shelter, ShelterPatch},
    WithId,
};
use utility::id::Id;

#[derive(Debug)]
pub enum StoreError {
    NotFound,
    Other(Box<dyn error::Error + Send + Sync>),
}

impl StoreError {
    pub fn other<E: error::Error + Send + Sync + 'static>(why: E) -> Self {
        Self::Other(Box::new(why))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "record not found"),
            StoreError::Other(why) => write!(f, "{}", why),
        }
    }
}

impl error::Error for StoreError {}

pub type Result<T> = result::Result<T, StoreError>;

/// Durable shelter storage. Each call is atomic from the registry's point
/// of view; there are no partial-failure semantics to handle.
#[async_trait]
pub trait ShelterStore: Send + Sync {
    /// All persisted shelters in server-assigned order.
    async fn list(&self) -> Result<Vec<WithId<Shelter>>>;

    /// Persists a new record and returns the assigned id.
    async fn create(&self, shelter: Shelter) -> Result<Id<Shelter>>;

    /// Updates the single field named by the patch, leaving all other
    /// columns untouched so concurrent edits of other fields cannot race.
    async fn update_field(
        &self,
        id: &Id<Shelter>,
        patch: ShelterPatch,
    ) -> Result<()>;

    async fn delete(&self, id: &Id<Shelter>) -> Result<()>;
}
