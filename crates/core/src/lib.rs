//! Gravis Core - Shared types library.
//!
//! This crate provides the domain types used by the Gravis storefront:
//! prices expressed in paisa, validated emails and phone numbers, and
//! type-safe wrappers for the identifiers issued by the catalog backend.
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O and no HTTP
//! clients. This keeps it lightweight and testable in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and phone numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
