//! Retry and cancellation behavior of the invocation pipeline, driven by a
//! scripted transport on a paused clock.

mod support;

use std::time::Duration;

use nanorpc_client::{CallContext, Client, ClientConfig, InvokeError, RetryPolicy};
use nanorpc_common::TransportError;
use support::{ScriptedTransport, Step};

fn client(transport: &ScriptedTransport, retry: RetryPolicy) -> Client<ScriptedTransport> {
    Client::with_transport(
        ClientConfig::new("http://rpc.test").with_retry(retry),
        transport.clone(),
    )
}

// ============================================================================
// Retry budget
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_two_retries_recover_after_two_failures() {
    let transport = ScriptedTransport::new([
        Step::Fail("refused"),
        Step::Fail("refused"),
        Step::Respond(200, r#""ok""#),
    ]);
    let client = client(&transport, RetryPolicy::fixed(2, Duration::from_millis(100)));

    let result: String = client.invoke("hello", "reddec").await.unwrap();
    assert_eq!(result, "ok");
    assert_eq!(transport.exchanges(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_budget_returns_last_error() {
    let transport = ScriptedTransport::new([
        Step::Fail("first"),
        Step::Fail("second"),
        Step::Fail("third"),
        Step::Respond(200, r#""too late""#),
    ]);
    let client = client(&transport, RetryPolicy::fixed(2, Duration::from_millis(100)));

    let err = client.invoke::<_, String>("hello", "x").await.unwrap_err();
    assert!(matches!(err, InvokeError::Transport(_)));
    assert!(err.to_string().contains("third"));
    assert_eq!(transport.exchanges(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_zero_retries_means_one_exchange() {
    let transport = ScriptedTransport::new([Step::Fail("refused"), Step::Respond(200, "1")]);
    let client = client(&transport, RetryPolicy::none());

    let err = client.invoke::<_, i32>("one", &()).await.unwrap_err();
    assert!(matches!(err, InvokeError::Transport(_)));
    assert_eq!(transport.exchanges(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_base_url_fails_without_exchanges() {
    let transport = ScriptedTransport::new([Step::Respond(200, r#""never""#)]);
    let client = Client::with_transport(
        ClientConfig::new("https://example.com")
            .with_retry(RetryPolicy::fixed(3, Duration::from_millis(200))),
        transport.clone(),
    );

    let start = tokio::time::Instant::now();
    let err = client.invoke::<_, String>("hello", "reddec").await.unwrap_err();
    assert!(matches!(
        err,
        InvokeError::Transport(TransportError::InvalidUri { .. })
    ));
    assert!(!err.is_retryable(true));
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(transport.exchanges(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unaddressable_endpoint_is_not_retried() {
    let transport = ScriptedTransport::new([Step::Respond(200, r#""never""#)]);
    let client = client(&transport, RetryPolicy::unbounded(Duration::from_millis(50)));

    let err = client
        .invoke::<_, String>("hello world", "reddec")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InvokeError::Transport(TransportError::InvalidUri { .. })
    ));
    assert_eq!(transport.exchanges(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_retries_until_success() {
    let mut steps = vec![Step::Fail("down"); 5];
    steps.push(Step::Respond(200, "42"));
    let transport = ScriptedTransport::new(steps);
    let client = client(&transport, RetryPolicy::unbounded(Duration::from_secs(1)));

    let answer: i32 = client.invoke("answer", &()).await.unwrap();
    assert_eq!(answer, 42);
    assert_eq!(transport.exchanges(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_delay_between_attempts() {
    let transport = ScriptedTransport::new([
        Step::Fail("refused"),
        Step::Fail("refused"),
        Step::Respond(200, "null"),
    ]);
    let client = client(&transport, RetryPolicy::fixed(2, Duration::from_millis(250)));

    let start = tokio::time::Instant::now();
    client.invoke::<_, ()>("wait", &()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(500));
}

// ============================================================================
// Failure classes
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_remote_error_not_retried_by_default() {
    let transport = ScriptedTransport::new([
        Step::Respond(500, "division by zero\n"),
        Step::Respond(200, "0"),
    ]);
    let client = client(&transport, RetryPolicy::fixed(3, Duration::ZERO));

    let err = client.invoke::<_, i64>("div", &(1, 0)).await.unwrap_err();
    match err {
        InvokeError::Remote { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "division by zero");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
    assert_eq!(transport.exchanges(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_remote_error_retried_when_enabled() {
    let transport = ScriptedTransport::new([
        Step::Respond(503, "warming up"),
        Step::Respond(200, "7"),
    ]);
    let policy = RetryPolicy::fixed(3, Duration::ZERO).with_retry_remote_errors(true);
    let client = client(&transport, policy);

    let value: i64 = client.invoke("seven", &()).await.unwrap();
    assert_eq!(value, 7);
    assert_eq!(transport.exchanges(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_reports_status() {
    let transport = ScriptedTransport::new([Step::Respond(404, "method nope not found")]);
    let client = client(&transport, RetryPolicy::none());

    let err = client.invoke::<_, ()>("nope", &()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "code 404: method nope not found");
}

#[tokio::test(start_paused = true)]
async fn test_decode_failure_is_never_retried() {
    let transport = ScriptedTransport::new([
        Step::Respond(200, "not json"),
        Step::Respond(200, r#""fine""#),
    ]);
    let client = client(&transport, RetryPolicy::unbounded(Duration::ZERO));

    let err = client.invoke::<_, String>("garbled", &()).await.unwrap_err();
    assert!(matches!(err, InvokeError::Decode(_)));
    assert_eq!(transport.exchanges(), 1);
}

// ============================================================================
// Cancellation and deadlines
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_during_delay_stops_retrying() {
    let transport = ScriptedTransport::new(vec![Step::Fail("down"); 10]);
    let client = client(&transport, RetryPolicy::unbounded(Duration::from_secs(10)));

    let ctx = CallContext::background();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();
    });

    let err = client
        .invoke_with_context::<_, ()>(&ctx, "never", &())
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Cancelled));
    assert_eq!(transport.exchanges(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_bounds_unbounded_retries() {
    let transport = ScriptedTransport::new(vec![Step::Fail("down"); 100]);
    let client = client(&transport, RetryPolicy::unbounded(Duration::from_millis(100)));

    let err = client
        .invoke_timeout::<_, ()>(Duration::from_millis(350), "slow", &())
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::DeadlineExceeded));
    assert!((3..=4).contains(&transport.exchanges()));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_aborts_exchange_in_flight() {
    let transport = ScriptedTransport::new([Step::Hang, Step::Respond(200, "null")]);
    let client = client(&transport, RetryPolicy::fixed(5, Duration::ZERO));

    let err = client
        .invoke_timeout::<_, ()>(Duration::from_secs(1), "hang", &())
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::DeadlineExceeded));
    assert_eq!(transport.exchanges(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_already_cancelled_context() {
    let transport = ScriptedTransport::new([Step::Fail("down"), Step::Respond(200, "null")]);
    let client = client(&transport, RetryPolicy::fixed(1, Duration::ZERO));

    let ctx = CallContext::background();
    ctx.cancel();
    let err = client
        .invoke_with_context::<_, ()>(&ctx, "x", &())
        .await
        .unwrap_err();
    assert!(err.is_context());
}

// ============================================================================
// Request shape and output slot
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_request_targets_endpoint_url() {
    let transport = ScriptedTransport::new([Step::Respond(200, r#""hello reddec""#)]);
    let client = Client::with_transport(ClientConfig::new("http://rpc.test/api/"), transport.clone());

    let _: String = client.invoke("hello", "reddec").await.unwrap();
    assert_eq!(transport.urls(), vec!["http://rpc.test/api/hello".to_string()]);
    assert_eq!(&transport.bodies()[0][..], br#""reddec""#);
}

#[tokio::test(start_paused = true)]
async fn test_invoke_into_writes_only_on_success() {
    let transport = ScriptedTransport::new([
        Step::Respond(200, "[1,2,3]"),
        Step::Respond(500, "boom"),
    ]);
    let client = client(&transport, RetryPolicy::none());
    let ctx = CallContext::background();

    let mut out: Vec<u8> = Vec::new();
    client.invoke_into(&ctx, "list", &(), &mut out).await.unwrap();
    assert_eq!(out, vec![1, 2, 3]);

    let result = client.invoke_into(&ctx, "list", &(), &mut out).await;
    assert!(matches!(result, Err(InvokeError::Remote { status: 500, .. })));
    assert_eq!(out, vec![1, 2, 3]);
}
