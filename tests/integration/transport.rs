//! Real-socket integration tests
//!
//! Runs the relay on a bound TCP listener and talks to it with reqwest, so
//! the inbound `Host` header and concurrent connections are real.

use std::time::Duration;

use futures::future::join_all;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

use crate::common::{spawn_relay, test_config};
use crate::mocks::MockUpstream;

#[tokio::test]
async fn test_host_header_is_replaced_by_upstream_host() {
    let upstream = MockUpstream::start().await;
    upstream.mock_health_ok().await;
    let relay = spawn_relay(test_config(&upstream.uri())).await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/api/health", relay))
        .header("x-custom", "abc")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), r#"{"ok":true}"#);

    let received = upstream.received().await;
    assert_eq!(received.len(), 1);
    let headers = &received[0].headers;
    assert_eq!(headers.get_all("host").iter().count(), 1);
    assert_eq!(headers.get("host").unwrap(), upstream.address().as_str());
    assert_eq!(headers.get("x-custom").unwrap(), "abc");
}

#[tokio::test]
async fn test_upstream_sees_only_caller_headers_plus_transport_ones() {
    let upstream = MockUpstream::start().await;
    upstream.mock_health_ok().await;
    let relay = spawn_relay(test_config(&upstream.uri())).await;

    reqwest::Client::new()
        .get(format!("http://{}/api/health", relay))
        .header("x-custom", "abc")
        .header("x-trace", "t-1")
        .send()
        .await
        .unwrap();

    let received = upstream.received().await;
    let mut names: Vec<&str> = received[0].headers.keys().map(|k| k.as_str()).collect();
    names.sort_unstable();
    // `accept` is sent by the calling client here; `host` is set by the transport
    assert_eq!(names, vec!["accept", "host", "x-custom", "x-trace"]);
}

#[tokio::test]
async fn test_concurrent_requests_are_not_mixed() {
    const N: usize = 24;

    let upstream = MockUpstream::start().await;
    for i in 0..N {
        Mock::given(method("GET"))
            .and(path(format!("/api/items/{}", i)))
            .respond_with(
                ResponseTemplate::new(200 + (i % 3) as u16)
                    .set_body_string(format!("item-{}", i))
                    // Reverse the completion order
                    .set_delay(Duration::from_millis(((N - i) * 10) as u64)),
            )
            .expect(1)
            .mount(upstream.server())
            .await;
    }
    let relay = spawn_relay(test_config(&upstream.uri())).await;
    let client = reqwest::Client::new();

    let requests = (0..N).map(|i| {
        let client = client.clone();
        let url = format!("http://{}/api/items/{}", relay, i);
        async move {
            let response = client.get(url).send().await.unwrap();
            let status = response.status().as_u16();
            let body = response.text().await.unwrap();
            (i, status, body)
        }
    });

    let results = join_all(requests).await;

    assert_eq!(results.len(), N);
    for (i, status, body) in results {
        assert_eq!(status, 200 + (i % 3) as u16);
        assert_eq!(body, format!("item-{}", i));
    }
}

#[tokio::test]
async fn test_requests_overlap_instead_of_queueing() {
    const N: usize = 8;
    let delay = Duration::from_millis(400);

    let upstream = MockUpstream::start().await;
    upstream.mock_slow("/api/slow", delay).await;
    let relay = spawn_relay(test_config(&upstream.uri())).await;
    let client = reqwest::Client::new();

    let started = std::time::Instant::now();
    let requests = (0..N).map(|_| {
        let client = client.clone();
        let url = format!("http://{}/api/slow", relay);
        async move { client.get(url).send().await.unwrap().status() }
    });
    let statuses = join_all(requests).await;

    assert!(statuses.iter().all(|s| s.is_success()));
    // Serial handling would take N * delay
    assert!(started.elapsed() < delay * (N as u32) / 2);
}

/// Serve one raw HTTP/1.1 response on an ephemeral port, ignoring the request
async fn raw_upstream(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_chunked_upstream_response_reaches_caller() {
    let upstream = raw_upstream(
        "HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\nx-a: 1\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
    )
    .await;
    let relay = spawn_relay(test_config(&upstream)).await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/api/stream", relay))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers().get("x-a").unwrap(), "1");
    assert_eq!(response.text().await.unwrap(), "hello world");
}

#[tokio::test]
async fn test_chunked_upstream_error_reaches_caller() {
    let upstream = raw_upstream(
        "HTTP/1.1 404 Not Found\r\ncontent-type: application/json\r\ntransfer-encoding: chunked\r\nconnection: keep-alive\r\n\r\n15\r\n{\"error\":\"not found\"}\r\n0\r\n\r\n",
    )
    .await;
    let relay = spawn_relay(test_config(&upstream)).await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/api/missing", relay))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(response.text().await.unwrap(), r#"{"error":"not found"}"#);
}
