//! Qualified capability names.
//!
//! A reference is either flat (`noop`) or scoped (`github.onPush`), where the
//! scope names a registered integration or application and the leaf names one
//! of its nested components or triggers. Names are parsed once here and the
//! typed form is passed around afterwards.

use crate::error::RegistryError;
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '.';

/// A parsed capability reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    scope: Option<String>,
    leaf: String,
}

impl QualifiedName {
    /// Parses a flat or scoped name.
    ///
    /// # Errors
    ///
    /// Returns `NameFormat` for more than one separator or an empty part.
    pub fn parse(name: &str) -> Result<Self, RegistryError> {
        let malformed = || RegistryError::NameFormat {
            name: name.to_string(),
        };
        let mut parts = name.split(SEPARATOR);
        let first = parts.next().unwrap_or_default();
        let second = parts.next();
        if parts.next().is_some() || first.is_empty() {
            return Err(malformed());
        }
        match second {
            None => Ok(Self::flat(first)),
            Some("") => Err(malformed()),
            Some(leaf) => Ok(Self::scoped(first, leaf)),
        }
    }

    #[must_use]
    pub fn flat(leaf: impl Into<String>) -> Self {
        Self {
            scope: None,
            leaf: leaf.into(),
        }
    }

    #[must_use]
    pub fn scoped(scope: impl Into<String>, leaf: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            leaf: leaf.into(),
        }
    }

    /// The integration or application name, for scoped references.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    #[must_use]
    pub fn leaf(&self) -> &str {
        &self.leaf
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{scope}{SEPARATOR}{}", self.leaf),
            None => f.write_str(&self.leaf),
        }
    }
}

impl FromStr for QualifiedName {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
