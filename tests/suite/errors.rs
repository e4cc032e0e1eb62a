//! Upstream failures surface as user-facing notices.

use triad_core::Severity;
use triad_types::MethodIndex;
use wiremock::MockServer;

use crate::common::{METHODS_REPLY, controller, mount_error, mount_reply};

#[tokio::test]
async fn auth_failure_names_the_key_to_fix() {
    let server = MockServer::start().await;
    mount_error(&server, 401, "Access denied due to invalid subscription key").await;

    let mut session = controller(&server);
    session.submit_problem("dedupe");
    assert!(session.generate_methods().await.is_err());

    let notice = session.last_error().unwrap();
    assert_eq!(notice.severity, Severity::Error);
    assert!(notice.message.starts_with("Azure OpenAI authentication failed."));
    assert!(notice.message.contains("AZURE_OPENAI_API_KEY"));
    assert!(session.state().methods().is_none());
}

#[tokio::test]
async fn rate_limit_gets_a_hint() {
    let server = MockServer::start().await;
    mount_error(&server, 429, "Too many requests").await;

    let mut session = controller(&server);
    session.submit_problem("dedupe");
    assert!(session.generate_methods().await.is_err());

    let message = &session.last_error().unwrap().message;
    assert!(message.contains("429"));
    assert!(message.contains("Rate limited"));
}

#[tokio::test]
async fn empty_reply_is_an_error_not_a_turn() {
    let server = MockServer::start().await;
    mount_reply(&server, METHODS_REPLY).await;
    mount_reply(&server, "   ").await;

    let mut session = controller(&server);
    session.submit_problem("dedupe");
    session.generate_methods().await.unwrap();
    session.select_method(MethodIndex::B).unwrap();

    assert!(session.request_followup().await.is_err());
    assert!(session.state().transcript(MethodIndex::B).is_empty());
    assert!(session.last_error().is_some());
}

#[tokio::test]
async fn success_clears_the_previous_notice() {
    let server = MockServer::start().await;
    mount_error(&server, 503, "busy").await;
    mount_reply(&server, METHODS_REPLY).await;

    let mut session = controller(&server);
    session.submit_problem("dedupe");
    assert!(session.generate_methods().await.is_err());
    assert!(session.last_error().is_some());

    session.generate_methods().await.unwrap();
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn validation_errors_are_warnings() {
    let server = MockServer::start().await;

    let mut session = controller(&server);
    assert!(session.select_method(MethodIndex::A).is_err());
    let notice = session.last_error().unwrap();
    assert_eq!(notice.severity, Severity::Warning);
    assert_eq!(notice.message, "Generate the three methods first.");
}
