//! Business logic services.
//!
//! # Services
//!
//! - `connection` - Two-step email connection workflow
//! - `email` - Connection code delivery via SMTP

pub mod connection;
pub mod email;

pub use connection::{
    CodeGenerator, CodeMailer, ConnectionError, ConnectionWorkflow, DeliverCode, DeliveryError,
    IssueCode, RequestAccepted, ValidationError, VerifyResult,
};
pub use email::{EmailError, EmailService};
