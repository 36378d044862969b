//! Operator CLI for the switchyard capability runtime.

pub mod commands;
pub mod config;
pub mod error;
