//! Orchestrator version parsing and ordering.
//!
//! Versions are dot-separated non-negative integers such as `1.27.3`.
//! Two versions are only comparable when they have the same number of
//! components: `1.27` and `1.27.0` are never padded to match, the
//! comparison fails with [`AksverError::MismatchedArity`] instead.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AksverError;

/// A parsed orchestrator version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    /// Parse a version string like "1.27.3".
    pub fn parse(version: &str) -> Result<Self, AksverError> {
        let components = version
            .split('.')
            .map(|part| {
                // u64::from_str accepts a leading '+', which is not a version digit
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(AksverError::MalformedVersion(version.to_string()));
                }
                part.parse::<u64>()
                    .map_err(|_| AksverError::MalformedVersion(version.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { components })
    }

    /// Numeric components, most significant first.
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Number of components.
    pub fn arity(&self) -> usize {
        self.components.len()
    }

    /// Compare two versions component by component.
    ///
    /// Fails when the component counts differ.
    pub fn try_cmp(&self, other: &Version) -> Result<Ordering, AksverError> {
        if self.arity() != other.arity() {
            return Err(AksverError::MismatchedArity {
                left: self.to_string(),
                right: other.to_string(),
            });
        }
        Ok(self.components.cmp(&other.components))
    }

    /// Strictly less than `other`.
    pub fn try_lt(&self, other: &Version) -> Result<bool, AksverError> {
        Ok(self.try_cmp(other)? == Ordering::Less)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other).ok()
    }
}

impl FromStr for Version {
    type Err = AksverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = AksverError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", component)?;
            first = false;
        }
        Ok(())
    }
}

/// Compare two version strings.
pub fn compare(a: &str, b: &str) -> Result<Ordering, AksverError> {
    Version::parse(a)?.try_cmp(&Version::parse(b)?)
}
