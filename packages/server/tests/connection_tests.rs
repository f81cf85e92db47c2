//! Integration tests for the WhatsApp connection lifecycle.
//!
//! Covers:
//! - Immediate authorization from persisted credentials
//! - Pairing flow with challenge rotation
//! - Idempotent connect, disconnect, and restart after failure
//! - Link drops and connect timeouts

mod common;

use common::{test_identity, TestHarness};
use otp_core::domains::connection::{ConnectionError, ConnectionSession, ConnectionState};
use otp_core::kernel::{
    ClientIdentity, DeliveryError, MockTransport, PairingChallenge, SessionCredentials,
    TestDependencies, TransportEvent,
};
use std::time::Duration;
use test_context::test_context;

// ============================================================================
// Authorization
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_connect_authorizes_with_persisted_credentials(ctx: &mut TestHarness) {
    assert_eq!(ctx.service.connection().status(), ConnectionSession::Idle);

    let session = ctx.connect().await;

    assert_eq!(
        session,
        ConnectionSession::Ready {
            identity: test_identity()
        }
    );
    assert_eq!(
        ctx.transport().credentials_seen(),
        vec![Some(SessionCredentials("test-client".to_string()))]
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_connect_is_idempotent_while_live(ctx: &mut TestHarness) {
    ctx.connect().await;

    let session = ctx.service.connection().connect();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(session.is_ready());
    assert_eq!(ctx.transport().begin_calls(), 1);
}

#[tokio::test]
async fn test_auth_failure_settles_as_failed() {
    let ctx = TestHarness::with_deps(TestDependencies::new());

    ctx.service.connection().connect();
    ctx.eventually(|| ctx.transport().begin_calls() == 1).await;
    assert!(ctx
        .transport()
        .emit(TransportEvent::AuthFailure("session revoked".to_string())));

    let session = ctx.wait_for_state(ConnectionState::Failed).await;
    assert!(session
        .failure_reason()
        .is_some_and(|reason| reason.contains("session revoked")));
}

// ============================================================================
// Pairing
// ============================================================================

#[tokio::test]
async fn test_pairing_flow_rotates_challenge_then_authorizes() {
    let ctx = TestHarness::with_deps(
        TestDependencies::new().mock_transport(MockTransport::new().pairing("qr-1")),
    );

    let session = ctx.connect().await;
    assert_eq!(
        session.pairing_challenge(),
        Some(&PairingChallenge("qr-1".to_string()))
    );

    ctx.transport()
        .emit(TransportEvent::PairingRequired(PairingChallenge(
            "qr-2".to_string(),
        )));
    let mut rx = ctx.service.connection().subscribe();
    tokio::time::timeout(
        common::WAIT,
        rx.wait_for(|s| s.pairing_challenge().is_some_and(|c| c.0 == "qr-2")),
    )
    .await
    .expect("challenge rotated")
    .expect("channel open");

    let identity = ClientIdentity {
        phone_number: "14155550199".to_string(),
        name: "Paired Phone".to_string(),
    };
    ctx.transport()
        .emit(TransportEvent::Authorized(identity.clone()));

    let session = ctx.wait_for_state(ConnectionState::Ready).await;
    assert_eq!(session.identity(), Some(&identity));
    assert_eq!(session.pairing_challenge(), None);
}

// ============================================================================
// Failures and recovery
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_link_drop_fails_ready_session(ctx: &mut TestHarness) {
    ctx.connect().await;

    ctx.transport()
        .emit(TransportEvent::LinkDropped("phone offline".to_string()));
    let session = ctx.wait_for_state(ConnectionState::Failed).await;

    assert!(session
        .failure_reason()
        .is_some_and(|reason| reason.contains("phone offline")));
    assert!(matches!(
        ctx.service.connection().send("9876543210", "hello").await,
        Err(ConnectionError::NotConnected)
    ));
}

#[tokio::test]
async fn test_failed_start_then_reconnect_restarts_session() {
    let ctx = TestHarness::with_deps(TestDependencies::new().mock_transport(
        MockTransport::new().failing_start(DeliveryError::Transport("boom".to_string())),
    ));

    let session = ctx.connect().await;
    assert_eq!(session.state(), ConnectionState::Failed);
    assert!(session
        .failure_reason()
        .is_some_and(|reason| reason.contains("boom")));

    let session = ctx.connect().await;
    assert_eq!(session.state(), ConnectionState::Failed);
    assert_eq!(ctx.transport().begin_calls(), 2);
    // The failed session is torn down before the restart.
    assert!(ctx.transport().end_calls() >= 1);
}

#[tokio::test]
async fn test_reset_returns_failed_session_to_idle() {
    let ctx = TestHarness::with_deps(TestDependencies::new().mock_transport(
        MockTransport::new().failing_start(DeliveryError::Transport("boom".to_string())),
    ));
    ctx.connect().await;

    let session = ctx.service.connection().reset();

    assert_eq!(session, ConnectionSession::Idle);
}

#[tokio::test]
async fn test_stream_end_before_authorization_fails_session() {
    let ctx = TestHarness::with_deps(TestDependencies::new());

    ctx.service.connection().connect();
    ctx.eventually(|| ctx.transport().begin_calls() == 1).await;
    ctx.transport().close_sessions();

    let session = ctx.wait_for_state(ConnectionState::Failed).await;
    assert!(session.failure_reason().is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_disconnect_ends_session_and_ignores_stale_events(ctx: &mut TestHarness) {
    ctx.connect().await;

    let session = ctx.service.connection().disconnect();
    assert_eq!(session, ConnectionSession::Idle);
    ctx.eventually(|| ctx.transport().end_calls() == 1).await;

    // Events from the torn-down session no longer move the state.
    ctx.transport()
        .emit(TransportEvent::LinkDropped("late".to_string()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(ctx.service.connection().status(), ConnectionSession::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconnect_waits_for_previous_teardown() {
    let ctx = TestHarness::with_deps(
        TestDependencies::new().mock_transport(
            MockTransport::new()
                .authorizing(test_identity())
                .slow_teardown(Duration::from_millis(20)),
        ),
    );
    ctx.connect().await;

    ctx.service.connection().disconnect();
    let session = ctx.connect().await;

    assert!(session.is_ready());
    assert_eq!(ctx.transport().lifecycle_calls(), vec!["begin", "end", "begin"]);
    assert!(ctx.service.connection().status().is_ready());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connect_after_reset_waits_for_teardown() {
    let ctx = TestHarness::with_deps(
        TestDependencies::new().mock_transport(
            MockTransport::new()
                .failing_start(DeliveryError::Transport("boom".to_string()))
                .slow_teardown(Duration::from_millis(20)),
        ),
    );
    ctx.connect().await;

    ctx.service.connection().reset();
    let session = ctx.connect().await;

    assert_eq!(session.state(), ConnectionState::Failed);
    assert_eq!(ctx.transport().lifecycle_calls(), vec!["begin", "end", "begin"]);
}

#[tokio::test(start_paused = true)]
async fn test_connect_and_wait_times_out_when_session_never_settles() {
    let ctx = TestHarness::with_deps(TestDependencies::new());

    let result = ctx
        .service
        .connection()
        .connect_and_wait(Duration::from_secs(30))
        .await;

    assert!(matches!(result, Err(ConnectionError::Timeout)));
    assert_eq!(
        ctx.service.connection().status().state(),
        ConnectionState::Initializing
    );
}
