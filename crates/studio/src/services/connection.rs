//! Email connection workflow.
//!
//! A merchant connects an email address to their shop in two steps:
//!
//! ```text
//! Unconnected --request_connection(email)--> Pending(email, otp)
//! Pending(email, otp) --verify_connection(otp) [match]--> Activated(email)
//! Pending(email, otp) --verify_connection(wrong otp)--> Pending (unchanged)
//! ```
//!
//! The workflow holds no state between calls. Every call names its shop
//! explicitly and performs single-statement operations against a
//! [`ConnectionStore`]. Code generation and delivery sit behind
//! [`IssueCode`] and [`DeliverCode`].

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use interactive_studio_core::{
    ConnectionState, Email, EmailError as AddressError, Otp, OtpError, ShopId, ShopIdError,
};

use crate::db::{ConnectionStore, RepositoryError};
use crate::services::email::{EmailError, EmailService};

/// Message returned for a code that does not match exactly one pending
/// connection.
pub const INVALID_CODE_MESSAGE: &str = "Invalid code";

/// Input rejected before any storage call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("shop id: {0}")]
    ShopId(#[from] ShopIdError),
    #[error("email: {0}")]
    Email(#[from] AddressError),
    #[error("code: {0}")]
    Otp(#[from] OtpError),
}

/// Errors from the connection workflow.
///
/// A wrong code is not an error; see [`VerifyResult`].
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),

    /// A pending record matched the code but was gone when activated.
    #[error("connection for shop {shop_id} disappeared during verification")]
    Inconsistent { shop_id: ShopId },
}

/// Failed to hand a code to its recipient.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Outcome of [`ConnectionWorkflow::request_connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestAccepted {
    pub accepted: bool,
}

/// Outcome of [`ConnectionWorkflow::verify_connection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerifyResult {
    /// The code matched and the connection is now active.
    #[must_use]
    pub const fn verified() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// The code did not match exactly one pending connection.
    #[must_use]
    pub fn invalid_code() -> Self {
        Self {
            success: false,
            message: Some(INVALID_CODE_MESSAGE.to_string()),
        }
    }
}

/// Produces the code for a new connection request.
pub trait IssueCode: Send + Sync {
    fn issue(&self, email: &Email) -> Otp;
}

/// Delivers an issued code to the address that requested it.
pub trait DeliverCode: Send + Sync {
    fn deliver(
        &self,
        email: &Email,
        otp: &Otp,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Built-in code issuers.
#[derive(Debug, Clone)]
pub enum CodeGenerator {
    /// Six random digits.
    Random,
    /// The same code for every request. Development only.
    Fixed(Otp),
}

impl CodeGenerator {
    /// `Fixed` when a code is configured, `Random` otherwise.
    #[must_use]
    pub fn from_config(fixed: Option<Otp>) -> Self {
        fixed.map_or(Self::Random, Self::Fixed)
    }
}

impl IssueCode for CodeGenerator {
    fn issue(&self, _email: &Email) -> Otp {
        match self {
            Self::Random => generate_code(),
            Self::Fixed(otp) => otp.clone(),
        }
    }
}

/// Generate a 6-digit connection code.
#[must_use]
pub fn generate_code() -> Otp {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    Otp::from_number(code)
}

/// Built-in code deliverers.
#[derive(Debug, Clone)]
pub enum CodeMailer {
    /// Send the code over SMTP.
    Smtp(EmailService),
    /// Write the code to the log. Used when SMTP is not configured.
    Log,
}

impl DeliverCode for CodeMailer {
    async fn deliver(&self, email: &Email, otp: &Otp) -> Result<(), DeliveryError> {
        match self {
            Self::Smtp(service) => {
                service
                    .send_connection_code(email.as_str(), otp.as_str())
                    .await?;
            }
            Self::Log => {
                tracing::warn!(
                    email = %email,
                    code = %otp.as_str(),
                    "Email not configured - connection code logged (dev mode)"
                );
            }
        }
        Ok(())
    }
}

/// The two-step email connection workflow.
#[derive(Debug)]
pub struct ConnectionWorkflow<S, I = CodeGenerator, D = CodeMailer> {
    store: S,
    issuer: I,
    mailer: D,
}

impl<S, I, D> ConnectionWorkflow<S, I, D>
where
    S: ConnectionStore,
    I: IssueCode,
    D: DeliverCode,
{
    #[must_use]
    pub const fn new(store: S, issuer: I, mailer: D) -> Self {
        Self {
            store,
            issuer,
            mailer,
        }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Issue a code for `(shop_id, email)` and move the pair to pending.
    ///
    /// Any earlier code for the pair stops working. The request is accepted
    /// even if delivery fails; the merchant can request again.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::Validation` for an empty shop id or email
    /// and `ConnectionError::Storage` if the store fails.
    #[instrument(skip(self, email), fields(shop_id = %shop_id))]
    pub async fn request_connection(
        &self,
        shop_id: &str,
        email: &str,
    ) -> Result<RequestAccepted, ConnectionError> {
        let shop_id = ShopId::parse(shop_id).map_err(ValidationError::from)?;
        let email = Email::parse(email).map_err(ValidationError::from)?;

        let otp = self.issuer.issue(&email);
        let record = self.store.upsert_pending(&shop_id, &email, &otp).await?;
        tracing::info!(connection_id = %record.id, "Connection pending verification");

        if let Err(e) = self.mailer.deliver(&email, &otp).await {
            tracing::error!(error = %e, connection_id = %record.id, "Failed to deliver connection code");
        }

        Ok(RequestAccepted { accepted: true })
    }

    /// Activate the pending connection that was issued `otp`.
    ///
    /// An unknown code, or one shared by several pending connections,
    /// yields [`VerifyResult::invalid_code`]. Codes stop matching once
    /// activated, so replaying one fails.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::Validation` for an empty shop id or code,
    /// `ConnectionError::Storage` if the store fails, and
    /// `ConnectionError::Inconsistent` if the matched record vanished before
    /// activation.
    #[instrument(skip(self, otp), fields(shop_id = %shop_id))]
    pub async fn verify_connection(
        &self,
        shop_id: &str,
        otp: &str,
    ) -> Result<VerifyResult, ConnectionError> {
        let shop_id = ShopId::parse(shop_id).map_err(ValidationError::from)?;
        let otp = Otp::parse(otp).map_err(ValidationError::from)?;

        let pending = match self.store.find_pending_by_otp(&shop_id, &otp).await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(VerifyResult::invalid_code()),
            Err(RepositoryError::Ambiguous { matches }) => {
                tracing::warn!(matches, "Code matches several pending connections");
                return Ok(VerifyResult::invalid_code());
            }
            Err(e) => return Err(e.into()),
        };

        match self.store.activate(&shop_id, &pending.email).await {
            Ok(record) => {
                tracing::info!(connection_id = %record.id, "Connection activated");
                Ok(VerifyResult::verified())
            }
            Err(RepositoryError::NotFound) => Err(ConnectionError::Inconsistent { shop_id }),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `shop_id` has exactly one activated connection.
    ///
    /// A shop with several activated records reads as unconnected.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::Validation` for an empty shop id and
    /// `ConnectionError::Storage` if the store fails.
    #[instrument(skip(self))]
    pub async fn connection_state(&self, shop_id: &str) -> Result<ConnectionState, ConnectionError> {
        let shop_id = ShopId::parse(shop_id).map_err(ValidationError::from)?;
        let activated = self.store.list_activated(&shop_id).await?;
        if activated.len() > 1 {
            tracing::warn!(count = activated.len(), "Shop has several activated connections");
        }
        Ok(ConnectionState::from_records(activated))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use interactive_studio_core::ConnectionRecord;

    use super::*;
    use crate::db::MemoryConnectionStore;

    /// Issues codes from a fixed list, in order.
    struct ScriptedCodes(Mutex<VecDeque<&'static str>>);

    impl ScriptedCodes {
        fn new(codes: &[&'static str]) -> Self {
            Self(Mutex::new(codes.iter().copied().collect()))
        }
    }

    impl IssueCode for ScriptedCodes {
        fn issue(&self, _email: &Email) -> Otp {
            Otp::parse(self.0.lock().unwrap().pop_front().unwrap()).unwrap()
        }
    }

    /// Records every delivery.
    #[derive(Default)]
    struct Outbox(Mutex<Vec<(String, String)>>);

    impl DeliverCode for Outbox {
        async fn deliver(&self, email: &Email, otp: &Otp) -> Result<(), DeliveryError> {
            self.0
                .lock()
                .unwrap()
                .push((email.to_string(), otp.as_str().to_string()));
            Ok(())
        }
    }

    struct BrokenMailer;

    impl DeliverCode for BrokenMailer {
        async fn deliver(&self, email: &Email, _otp: &Otp) -> Result<(), DeliveryError> {
            Err(DeliveryError::Email(EmailError::InvalidAddress(
                email.to_string(),
            )))
        }
    }

    /// Finds pending records but loses them before activation.
    #[derive(Default)]
    struct VanishingStore(MemoryConnectionStore);

    impl ConnectionStore for VanishingStore {
        async fn upsert_pending(
            &self,
            shop_id: &ShopId,
            email: &Email,
            otp: &Otp,
        ) -> Result<ConnectionRecord, RepositoryError> {
            self.0.upsert_pending(shop_id, email, otp).await
        }

        async fn find_pending_by_otp(
            &self,
            shop_id: &ShopId,
            otp: &Otp,
        ) -> Result<Option<ConnectionRecord>, RepositoryError> {
            self.0.find_pending_by_otp(shop_id, otp).await
        }

        async fn activate(
            &self,
            _shop_id: &ShopId,
            _email: &Email,
        ) -> Result<ConnectionRecord, RepositoryError> {
            Err(RepositoryError::NotFound)
        }

        async fn find_activated(
            &self,
            shop_id: &ShopId,
        ) -> Result<Option<ConnectionRecord>, RepositoryError> {
            self.0.find_activated(shop_id).await
        }

        async fn list_activated(
            &self,
            shop_id: &ShopId,
        ) -> Result<Vec<ConnectionRecord>, RepositoryError> {
            self.0.list_activated(shop_id).await
        }
    }

    fn workflow(
        codes: &[&'static str],
    ) -> ConnectionWorkflow<MemoryConnectionStore, ScriptedCodes, Outbox> {
        ConnectionWorkflow::new(
            MemoryConnectionStore::new(),
            ScriptedCodes::new(codes),
            Outbox::default(),
        )
    }

    fn shop1() -> ShopId {
        ShopId::parse("shop1").unwrap()
    }

    #[tokio::test]
    async fn test_repeated_request_keeps_single_record_with_latest_code() {
        let wf = workflow(&["111111", "222222"]);
        wf.request_connection("shop1", "a@x.com").await.unwrap();
        wf.request_connection("shop1", "a@x.com").await.unwrap();

        let records = wf.store().records_for(&shop1()).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].is_pending());
        assert_eq!(records[0].otp.as_str(), "222222");

        let stale = wf.verify_connection("shop1", "111111").await.unwrap();
        assert_eq!(stale, VerifyResult::invalid_code());
    }

    #[tokio::test]
    async fn test_wrong_then_right_code() {
        let wf = workflow(&["123456"]);
        let accepted = wf.request_connection("shop1", "a@x.com").await.unwrap();
        assert!(accepted.accepted);

        let wrong = wf.verify_connection("shop1", "000000").await.unwrap();
        assert!(!wrong.success);
        assert_eq!(wrong.message.as_deref(), Some("Invalid code"));

        let right = wf.verify_connection("shop1", "123456").await.unwrap();
        assert_eq!(right, VerifyResult::verified());

        let active = wf.store().find_activated(&shop1()).await.unwrap().unwrap();
        assert_eq!(active.email.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_code_cannot_be_replayed() {
        let wf = workflow(&["123456"]);
        wf.request_connection("shop1", "a@x.com").await.unwrap();
        assert!(wf.verify_connection("shop1", "123456").await.unwrap().success);

        let replay = wf.verify_connection("shop1", "123456").await.unwrap();
        assert!(!replay.success);
    }

    #[tokio::test]
    async fn test_code_is_scoped_to_shop() {
        let wf = workflow(&["123456"]);
        wf.request_connection("shop1", "a@x.com").await.unwrap();

        let other = wf.verify_connection("shop2", "123456").await.unwrap();
        assert_eq!(other, VerifyResult::invalid_code());
    }

    #[tokio::test]
    async fn test_verifying_second_email_activates_that_email() {
        let wf = workflow(&["111111", "222222"]);
        wf.request_connection("shop1", "a@x.com").await.unwrap();
        wf.request_connection("shop1", "b@x.com").await.unwrap();

        assert!(wf.verify_connection("shop1", "222222").await.unwrap().success);

        let records = wf.store().records_for(&shop1()).await;
        let a = records.iter().find(|r| r.email.as_str() == "a@x.com").unwrap();
        let b = records.iter().find(|r| r.email.as_str() == "b@x.com").unwrap();
        assert!(a.is_pending());
        assert!(b.activated);
    }

    #[tokio::test]
    async fn test_colliding_codes_are_rejected() {
        let wf = workflow(&["123456", "123456"]);
        wf.request_connection("shop1", "a@x.com").await.unwrap();
        wf.request_connection("shop1", "b@x.com").await.unwrap();

        let result = wf.verify_connection("shop1", "123456").await.unwrap();
        assert_eq!(result, VerifyResult::invalid_code());
        assert!(wf.store().find_activated(&shop1()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_before_storage() {
        let wf = workflow(&[]);

        let err = wf.request_connection("shop1", "  ").await.unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Validation(ValidationError::Email(_))
        ));
        let err = wf.request_connection("", "a@x.com").await.unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Validation(ValidationError::ShopId(_))
        ));
        let err = wf.verify_connection("shop1", "").await.unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Validation(ValidationError::Otp(_))
        ));

        assert!(wf.store().records_for(&shop1()).await.is_empty());
    }

    #[tokio::test]
    async fn test_request_delivers_issued_code() {
        let wf = workflow(&["654321"]);
        wf.request_connection("shop1", "a@x.com").await.unwrap();

        let sent = wf.mailer.0.lock().unwrap().clone();
        assert_eq!(sent, vec![("a@x.com".to_string(), "654321".to_string())]);
    }

    #[tokio::test]
    async fn test_delivery_failure_still_accepts_request() {
        let wf = ConnectionWorkflow::new(
            MemoryConnectionStore::new(),
            ScriptedCodes::new(&["123456"]),
            BrokenMailer,
        );

        let accepted = wf.request_connection("shop1", "a@x.com").await.unwrap();
        assert!(accepted.accepted);
        assert!(wf.verify_connection("shop1", "123456").await.unwrap().success);
    }

    #[tokio::test]
    async fn test_connection_state() {
        let wf = workflow(&["123456"]);
        assert_eq!(
            wf.connection_state("shop1").await.unwrap(),
            ConnectionState::Unconnected
        );

        wf.request_connection("shop1", "a@x.com").await.unwrap();
        assert!(!wf.connection_state("shop1").await.unwrap().is_connected());

        wf.verify_connection("shop1", "123456").await.unwrap();
        let state = wf.connection_state("shop1").await.unwrap();
        assert_eq!(state.email().map(Email::as_str), Some("a@x.com"));
    }

    #[tokio::test]
    async fn test_record_lost_before_activation_is_inconsistent() {
        let wf = ConnectionWorkflow::new(
            VanishingStore::default(),
            ScriptedCodes::new(&["123456"]),
            Outbox::default(),
        );
        wf.request_connection("shop1", "a@x.com").await.unwrap();

        let err = wf.verify_connection("shop1", "123456").await.unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Inconsistent { ref shop_id } if shop_id.as_str() == "shop1"
        ));
    }

    #[tokio::test]
    async fn test_two_activated_emails_read_as_unconnected() {
        let wf = workflow(&["111111", "222222"]);
        wf.request_connection("shop1", "a@x.com").await.unwrap();
        wf.verify_connection("shop1", "111111").await.unwrap();
        wf.request_connection("shop1", "b@x.com").await.unwrap();
        wf.verify_connection("shop1", "222222").await.unwrap();

        assert_eq!(wf.store().list_activated(&shop1()).await.unwrap().len(), 2);
        assert_eq!(
            wf.connection_state("shop1").await.unwrap(),
            ConnectionState::Unconnected
        );
    }

    #[test]
    fn test_generate_code_format() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.as_str().len(), 6);
            let value: u32 = code.as_str().parse().unwrap();
            assert!((100_000..1_000_000).contains(&value));
        }
    }

    #[test]
    fn test_fixed_generator() {
        let fixed = CodeGenerator::from_config(Some(Otp::parse("123456").unwrap()));
        let email = Email::parse("a@x.com").unwrap();
        assert_eq!(fixed.issue(&email).as_str(), "123456");
        assert!(matches!(CodeGenerator::from_config(None), CodeGenerator::Random));
    }

    #[test]
    fn test_verify_result_json() {
        let json = serde_json::to_value(VerifyResult::verified()).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true }));

        let json = serde_json::to_value(VerifyResult::invalid_code()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "Invalid code" })
        );
    }
}
