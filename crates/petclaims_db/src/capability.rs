//! Credential tiers.
//!
//! The hosted database offers a public key subject to row-level security and a
//! service-role key that bypasses it. Callers pick the tier explicitly when
//! they build a [`crate::DbClient`]; repositories check it before running
//! anything the public tier is not allowed to do.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Unauthenticated callers: a dose may be read or confirmed by exact token only.
    Restricted,
    /// Operator and server-side jobs: full read/write.
    Elevated,
}

impl Capability {
    pub fn allows(&self, required: Capability) -> bool {
        match required {
            Capability::Restricted => true,
            Capability::Elevated => *self == Capability::Elevated,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Restricted => f.write_str("restricted"),
            Capability::Elevated => f.write_str("elevated"),
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "restricted" => Ok(Capability::Restricted),
            "elevated" => Ok(Capability::Elevated),
            other => Err(format!("unknown capability '{}'", other)),
        }
    }
}
