//! Shared types for the store contracts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle to a granted lease.
///
/// A token is minted by [`LeaseStore::acquire`](crate::LeaseStore::acquire)
/// and must be presented back at release. Scoping release to the token -
/// rather than the bare lock name - prevents a process from releasing a
/// lease it no longer holds after the store reclaimed and reassigned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseToken {
    /// Name of the critical section this lease guards.
    name: String,

    /// Unique id of this particular grant. Two grants for the same name
    /// are never equal, even across reclaim-and-reacquire cycles.
    id: Uuid,
}

impl LeaseToken {
    /// Mints a token for a fresh grant of the named lease.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: Uuid::new_v4(),
        }
    }

    /// Returns the lock name this token belongs to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unique grant id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl std::fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}
