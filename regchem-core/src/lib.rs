//! Shared primitives, traits, and utilities for the regchem workspace.
//!
//! `regchem-core` provides the foundation the chemistry and regulation crates
//! build on:
//!
//! - **Error types**: [`RegchemError`] and [`Result`] for structured error handling
//! - **Traits**: Core abstractions like [`Annotated`], [`Summarizable`], [`ContentAddressable`]
//! - **Hashing**: SHA-256 content addressing for regulation snapshots

pub mod error;
pub mod hash;
pub mod traits;

pub use error::{RegchemError, Result};
pub use traits::*;
