//! End-to-end behavior of the capture server over real sockets.

use std::sync::Arc;

use httpcap::http::MemorySink;
use httpcap::lifecycle::startup_with_sink;
use httpcap::net::ListenerError;
use httpcap::StartupError;
use tokio::io::AsyncWriteExt;

mod common;

#[tokio::test]
async fn ok_response_carries_standard_headers() {
    let (running, _sink) = common::start_server().await;
    let mut client = common::connect(&running).await;

    let head = common::exchange(&mut client, "GET /anything HTTP/1.1\r\nHost: test\r\n\r\n").await;

    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "{head}");
    assert!(common::header(&head, "date").is_some());
    assert_eq!(common::header(&head, "server").as_deref(), Some("HttpCap/1.1"));
    assert_eq!(common::header(&head, "content-length").as_deref(), Some("0"));
    assert_eq!(common::header(&head, "connection").as_deref(), Some("keep-alive"));

    running.stop().await.unwrap();
}

#[tokio::test]
async fn persistent_connection_serves_sequential_requests() {
    let (running, sink) = common::start_server().await;
    let mut client = common::connect(&running).await;

    let first = common::exchange(&mut client, "GET /first HTTP/1.1\r\nHost: test\r\n\r\n").await;
    let second = common::exchange(&mut client, "DELETE /second HTTP/1.1\r\nHost: test\r\n\r\n").await;

    assert!(first.starts_with("HTTP/1.1 200 OK"));
    assert!(second.starts_with("HTTP/1.1 200 OK"));
    let lines = sink.lines();
    assert!(lines.contains(&"GET /first HTTP/1.1".to_string()));
    assert!(lines.contains(&"DELETE /second HTTP/1.1".to_string()));

    running.stop().await.unwrap();
}

#[tokio::test]
async fn header_elements_traced_in_compatible_layout() {
    let (running, sink) = common::start_server().await;
    let mut client = common::connect(&running).await;

    common::exchange(
        &mut client,
        "GET /elements HTTP/1.1\r\nHost: test\r\nX-Test: a=1; b=2\r\nX-Multi: z, a=1; b=2\r\n\r\n",
    )
    .await;

    let lines = sink.lines();
    assert_eq!(
        lines,
        vec![
            "GET /elements HTTP/1.1",
            "  host=[test]",
            "  x-test=[a]",
            "  x-multi=[z=1;b=2,a]",
        ]
    );

    running.stop().await.unwrap();
}

#[tokio::test]
async fn body_traced_but_never_echoed() {
    let (running, sink) = common::start_server().await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let response = client
        .post(format!("http://{}/submit", running.local_addr()))
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()["content-length"], "0");
    assert!(response.bytes().await.unwrap().is_empty());
    assert_eq!(sink.lines().last().map(String::as_str), Some("hello"));

    running.stop().await.unwrap();
}

#[tokio::test]
async fn http10_request_closes_connection() {
    let (running, _sink) = common::start_server().await;
    let mut client = common::connect(&running).await;

    let head = common::exchange(&mut client, "GET / HTTP/1.0\r\n\r\n").await;

    assert!(head.contains(" 200 OK"), "{head}");
    assert_eq!(common::header(&head, "connection").as_deref(), Some("close"));
    assert!(common::closed_by_server(&mut client).await);

    running.stop().await.unwrap();
}

#[tokio::test]
async fn explicit_close_is_honoured() {
    let (running, _sink) = common::start_server().await;
    let mut client = common::connect(&running).await;

    let head = common::exchange(
        &mut client,
        "GET / HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert_eq!(common::header(&head, "connection").as_deref(), Some("close"));
    assert!(common::closed_by_server(&mut client).await);

    running.stop().await.unwrap();
}

#[tokio::test]
async fn aborted_client_does_not_disturb_others() {
    let (running, _sink) = common::start_server().await;

    let mut quitter = common::connect(&running).await;
    let mut steady = common::connect(&running).await;

    quitter
        .write_all(b"POST /partial HTTP/1.1\r\nHost: test\r\nContent-Le")
        .await
        .unwrap();
    drop(quitter);

    let head = common::exchange(&mut steady, "GET /steady HTTP/1.1\r\nHost: test\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 200 OK"));

    running.stop().await.unwrap();
}

#[tokio::test]
async fn malformed_request_only_ends_its_connection() {
    let (running, _sink) = common::start_server().await;

    let mut broken = common::connect(&running).await;
    broken.write_all(b"\x01\x02garbage\r\n\r\n").await.unwrap();
    assert!(common::closed_by_server(&mut broken).await);

    let mut healthy = common::connect(&running).await;
    let head = common::exchange(&mut healthy, "GET / HTTP/1.1\r\nHost: test\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 200 OK"));

    running.stop().await.unwrap();
}

#[tokio::test]
async fn port_in_use_is_startup_error() {
    let (running, _sink) = common::start_server().await;

    let mut config = common::loopback_config();
    config.listener.port = running.local_addr().port();

    let err = startup_with_sink(&config, Arc::new(MemorySink::new()))
        .await
        .err()
        .unwrap();
    assert!(
        matches!(err, StartupError::Listener(ListenerError::Bind { .. })),
        "unexpected error: {err}"
    );

    running.stop().await.unwrap();
}
