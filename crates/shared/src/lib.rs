//! Multisite Shared Types and Utilities
//!
//! This crate contains the binding model, errors, and database helpers shared across the
//! multisite workspace.

pub mod db;
pub mod error;
pub mod types;

pub use db::*;
pub use error::*;
pub use types::*;
