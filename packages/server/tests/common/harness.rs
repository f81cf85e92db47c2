//! Test harness for integration testing.
//!
//! Wires an [`OtpService`] to scripted test doubles and the real router, so
//! tests can drive the service directly or over HTTP without a network.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::Router;
use otp_core::domains::connection::{ConnectionSession, ConnectionState};
use otp_core::domains::otp::OtpService;
use otp_core::kernel::{ClientIdentity, MockTransport, TestDependencies};
use otp_core::server::build_app;
use serde_json::Value;
use std::time::Duration;
use test_context::AsyncTestContext;
use tower::ServiceExt;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn test_identity() -> ClientIdentity {
    ClientIdentity {
        phone_number: "14155550100".to_string(),
        name: "OTP Test Sender".to_string(),
    }
}

/// Test harness around one service instance.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &mut TestHarness) {
///     ctx.connect().await;
///     let (status, body) = ctx.post("/api/send-otp", json!({"phoneNumber": "9876543210"})).await;
/// }
/// ```
pub struct TestHarness {
    pub deps: TestDependencies,
    pub service: OtpService,
    router: Router,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {
        self.service.connection().disconnect();
    }
}

impl TestHarness {
    /// Harness whose transport authorizes every session immediately.
    pub fn new() -> Self {
        Self::with_deps(
            TestDependencies::new()
                .mock_transport(MockTransport::new().authorizing(test_identity())),
        )
    }

    pub fn with_deps(deps: TestDependencies) -> Self {
        Self::with_timeout(deps, WAIT)
    }

    /// Harness whose connect route waits at most `connect_timeout`.
    pub fn with_timeout(deps: TestDependencies, connect_timeout: Duration) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let service = deps.build_service();
        let router = build_app(service.clone(), connect_timeout, &[]);
        Self {
            deps,
            service,
            router,
        }
    }

    pub fn transport(&self) -> &MockTransport {
        &self.deps.transport
    }

    /// Connect and wait for the session to settle.
    pub async fn connect(&self) -> ConnectionSession {
        self.service
            .connection()
            .connect_and_wait(WAIT)
            .await
            .expect("session did not settle")
    }

    /// Wait until the session reaches `state`.
    pub async fn wait_for_state(&self, state: ConnectionState) -> ConnectionSession {
        let mut rx = self.service.connection().subscribe();
        let session = tokio::time::timeout(WAIT, rx.wait_for(|session| session.state() == state))
            .await
            .unwrap_or_else(|_| panic!("session never reached {:?}", state))
            .expect("session channel closed")
            .clone();
        session
    }

    /// Poll `condition` until it holds or the wait expires.
    pub async fn eventually(&self, condition: impl Fn() -> bool) {
        tokio::time::timeout(WAIT, async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition never became true");
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Body::empty(), Some("application/json"))
            .await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            uri,
            Body::from(body.to_string()),
            Some("application/json"),
        )
        .await
    }

    /// POST an arbitrary body, optionally without a content type.
    pub async fn post_raw(
        &self,
        uri: &str,
        body: &str,
        content_type: Option<&str>,
    ) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Body::from(body.to_string()), content_type)
            .await
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Body,
        content_type: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let request = builder.body(body).expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, json)
    }
}
