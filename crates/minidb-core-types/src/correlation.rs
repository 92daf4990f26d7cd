//! Correlation types for telling stores apart in structured logs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier assigned to a store when it is opened
///
/// Two stores open on the same database file still get distinct ids, so their
/// statement echoes can be separated in a shared log stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(String);

impl StoreId {
    /// Generate a new StoreId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
