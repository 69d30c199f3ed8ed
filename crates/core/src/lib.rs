//! Interactive Studio Core - Shared types library.
//!
//! This crate provides common types used across all Interactive Studio components:
//! - `studio` - Embedded Shopify app server (app proxy + admin page)
//! - `cli` - Command-line tools for migrations and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for shops, emails, one-time codes, image IDs,
//!   and the connection record itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
