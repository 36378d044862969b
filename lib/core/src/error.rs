//! Shared result type.
//!
//! Crates define their own error enums (`RegistryError`, `CapabilityError`,
//! `CompileError`, ...) and return them wrapped in a rootcause [`Report`] at
//! their public boundaries.

use rootcause::Report;

/// Result carrying a rootcause report of context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
