//! Core types for Interactive Studio.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod connection;
pub mod email;
pub mod id;
pub mod image;
pub mod otp;
pub mod shop;

pub use connection::{ConnectionRecord, ConnectionState};
pub use email::{Email, EmailError};
pub use id::*;
pub use image::InteractiveSvg;
pub use otp::{Otp, OtpError};
pub use shop::{ShopId, ShopIdError};
