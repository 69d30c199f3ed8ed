//! Interactive Studio library.
//!
//! An embedded Shopify app: merchants connect an email address to their
//! shop with a one-time code, browse a gallery of interactive SVG templates,
//! and assign images to theme blocks through the storefront app proxy.
//!
//! The crate is a library so the router and the connection workflow can be
//! driven from integration tests and the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
