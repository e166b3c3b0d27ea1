//! Tenant ("domain") scoping.
//!
//! Every piece of inventory data is partitioned by a tenant key. The key is
//! an explicit parameter on every service and repository call; nothing is
//! inferred from session or global state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The tenant key stored in the `domain` column of every table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for TenantId {
    fn from(key: String) -> Self {
        Self(key)
    }
}
