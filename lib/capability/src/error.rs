//! Error types for the capability crate.
//!
//! - `RegistryError`: name lookups against a registry (client input errors)
//! - `CapabilityError`: failures returned from capability behaviour, including
//!   panics recovered by the isolation layer

use crate::capability::Kind;
use std::fmt;

/// Result type for capability behaviour operations.
pub type CapabilityResult<T> = switchyard_core::Result<T, CapabilityError>;

/// Errors from registry lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No capability of this kind is registered under the name.
    NotFound { kind: Kind, name: String },
    /// The scope of a qualified name is neither an integration nor an application.
    ScopeNotFound { scope: String },
    /// The name has more than one separator or an empty part.
    NameFormat { name: String },
}

impl RegistryError {
    /// Returns true for the not-found class, whatever level failed.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ScopeNotFound { .. })
    }

    /// The HTTP status a transport answers with for this lookup failure.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        if self.is_not_found() { 404 } else { 400 }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { kind, name } => write!(f, "{kind} {name} not registered"),
            Self::ScopeNotFound { scope } => {
                write!(f, "integration or application {scope} not registered")
            }
            Self::NameFormat { name } => write!(f, "invalid name format: {name}"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Errors from capability behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The implementation panicked; recovered at the isolation boundary.
    AbnormalTermination {
        capability: String,
        operation: &'static str,
        cause: String,
    },
    /// The implementation returned an error of its own.
    Failed { message: String },
    /// The capability does not implement this operation.
    NotSupported { operation: String },
    /// Configuration handed to the capability could not be used.
    InvalidConfiguration { message: String },
}

impl CapabilityError {
    /// Shorthand for the common `Failed` variant.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Returns true if this error came from a recovered panic.
    #[must_use]
    pub fn is_abnormal_termination(&self) -> bool {
        matches!(self, Self::AbnormalTermination { .. })
    }

    /// The HTTP status to answer with when this error ends a webhook or
    /// request-handling call.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::AbnormalTermination { .. } | Self::Failed { .. } => 500,
            Self::NotSupported { .. } => 404,
            Self::InvalidConfiguration { .. } => 400,
        }
    }
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbnormalTermination {
                capability,
                operation,
                cause,
            } => write!(f, "{capability} panicked in {operation}(): {cause}"),
            Self::Failed { message } => f.write_str(message),
            Self::NotSupported { operation } => write!(f, "{operation} is not supported"),
            Self::InvalidConfiguration { message } => {
                write!(f, "invalid configuration: {message}")
            }
        }
    }
}

impl std::error::Error for CapabilityError {}
