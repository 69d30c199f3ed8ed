//! Connection workflow scenarios.
//!
//! Drives the request/verify state machine end to end over the in-memory
//! store, as the proxy and admin page would.

#![allow(clippy::unwrap_used)]

use interactive_studio::db::{ConnectionStore, MemoryConnectionStore};
use interactive_studio::services::{
    CodeGenerator, CodeMailer, ConnectionError, ConnectionWorkflow, IssueCode, VerifyResult,
};
use interactive_studio_core::{ConnectionState, Email, Otp, ShopId};

/// Hands out codes derived from the requesting address.
struct CodePerEmail(Vec<(&'static str, &'static str)>);

impl IssueCode for CodePerEmail {
    fn issue(&self, email: &Email) -> Otp {
        let (_, code) = self.0.iter().find(|(e, _)| *e == email.as_str()).unwrap();
        Otp::parse(code).unwrap()
    }
}

fn fixed_workflow(code: &str) -> ConnectionWorkflow<MemoryConnectionStore> {
    ConnectionWorkflow::new(
        MemoryConnectionStore::new(),
        CodeGenerator::Fixed(Otp::parse(code).unwrap()),
        CodeMailer::Log,
    )
}

fn shop(id: &str) -> ShopId {
    ShopId::parse(id).unwrap()
}

#[tokio::test]
async fn test_shop1_connect_and_verify_scenario() {
    let wf = fixed_workflow("123456");

    let accepted = wf.request_connection("shop1", "a@x.com").await.unwrap();
    assert!(accepted.accepted);

    let wrong = wf.verify_connection("shop1", "000000").await.unwrap();
    assert_eq!(
        wrong,
        VerifyResult {
            success: false,
            message: Some("Invalid code".to_string()),
        }
    );

    let right = wf.verify_connection("shop1", "123456").await.unwrap();
    assert_eq!(
        right,
        VerifyResult {
            success: true,
            message: None,
        }
    );

    let active = wf.store().find_activated(&shop("shop1")).await.unwrap().unwrap();
    assert_eq!(active.email.as_str(), "a@x.com");
    assert!(active.activated);
}

#[tokio::test]
async fn test_second_request_replaces_pending_code() {
    let wf = ConnectionWorkflow::new(
        MemoryConnectionStore::new(),
        CodeGenerator::Random,
        CodeMailer::Log,
    );

    wf.request_connection("shop1", "a@x.com").await.unwrap();
    let first = wf.store().records_for(&shop("shop1")).await;
    wf.request_connection("shop1", "a@x.com").await.unwrap();
    let second = wf.store().records_for(&shop("shop1")).await;

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].id, second[0].id);
    assert!(second[0].is_pending());

    let latest = second[0].otp.as_str().to_string();
    if first[0].otp.as_str() != latest {
        let stale = wf
            .verify_connection("shop1", first[0].otp.as_str())
            .await
            .unwrap();
        assert!(!stale.success);
    }
    assert!(wf.verify_connection("shop1", &latest).await.unwrap().success);
}

#[tokio::test]
async fn test_no_replay_after_activation() {
    let wf = fixed_workflow("123456");
    wf.request_connection("shop1", "a@x.com").await.unwrap();

    assert!(wf.verify_connection("shop1", "123456").await.unwrap().success);
    let replay = wf.verify_connection("shop1", "123456").await.unwrap();
    assert!(!replay.success);
    assert_eq!(replay.message.as_deref(), Some("Invalid code"));
}

#[tokio::test]
async fn test_never_issued_code_is_invalid() {
    let wf = fixed_workflow("123456");
    let result = wf.verify_connection("shop1", "123456").await.unwrap();
    assert_eq!(result, VerifyResult::invalid_code());
}

#[tokio::test]
async fn test_two_pending_emails_activate_the_matching_one() {
    let wf = ConnectionWorkflow::new(
        MemoryConnectionStore::new(),
        CodePerEmail(vec![("a@x.com", "111111"), ("b@x.com", "222222")]),
        CodeMailer::Log,
    );

    wf.request_connection("shop1", "a@x.com").await.unwrap();
    wf.request_connection("shop1", "b@x.com").await.unwrap();

    assert!(wf.verify_connection("shop1", "222222").await.unwrap().success);

    let state = wf.connection_state("shop1").await.unwrap();
    assert_eq!(state.email().map(Email::as_str), Some("b@x.com"));

    let records = wf.store().records_for(&shop("shop1")).await;
    let a = records.iter().find(|r| r.email.as_str() == "a@x.com").unwrap();
    assert!(a.is_pending());
}

#[tokio::test]
async fn test_second_verified_email_disconnects_the_shop() {
    let wf = ConnectionWorkflow::new(
        MemoryConnectionStore::new(),
        CodePerEmail(vec![("a@x.com", "111111"), ("b@x.com", "222222")]),
        CodeMailer::Log,
    );

    wf.request_connection("shop1", "a@x.com").await.unwrap();
    assert!(wf.verify_connection("shop1", "111111").await.unwrap().success);
    assert!(wf.connection_state("shop1").await.unwrap().is_connected());

    wf.request_connection("shop1", "b@x.com").await.unwrap();
    assert!(wf.verify_connection("shop1", "222222").await.unwrap().success);

    assert_eq!(
        wf.connection_state("shop1").await.unwrap(),
        ConnectionState::Unconnected
    );
}

#[tokio::test]
async fn test_shops_are_isolated() {
    let wf = fixed_workflow("123456");
    wf.request_connection("shop1", "a@x.com").await.unwrap();
    wf.request_connection("shop2", "a@x.com").await.unwrap();

    assert!(wf.verify_connection("shop1", "123456").await.unwrap().success);

    assert!(wf.connection_state("shop1").await.unwrap().is_connected());
    assert_eq!(
        wf.connection_state("shop2").await.unwrap(),
        ConnectionState::Unconnected
    );
}

#[tokio::test]
async fn test_re_request_after_activation_disconnects_until_verified() {
    let wf = fixed_workflow("123456");
    wf.request_connection("shop1", "a@x.com").await.unwrap();
    wf.verify_connection("shop1", "123456").await.unwrap();
    assert!(wf.connection_state("shop1").await.unwrap().is_connected());

    wf.request_connection("shop1", "a@x.com").await.unwrap();
    assert!(!wf.connection_state("shop1").await.unwrap().is_connected());

    assert!(wf.verify_connection("shop1", "123456").await.unwrap().success);
    assert!(wf.connection_state("shop1").await.unwrap().is_connected());
}

#[tokio::test]
async fn test_validation_errors() {
    let wf = fixed_workflow("123456");

    assert!(matches!(
        wf.request_connection("shop1", "").await,
        Err(ConnectionError::Validation(_))
    ));
    assert!(matches!(
        wf.verify_connection("shop1", "   ").await,
        Err(ConnectionError::Validation(_))
    ));
    assert!(matches!(
        wf.connection_state("").await,
        Err(ConnectionError::Validation(_))
    ));
}
