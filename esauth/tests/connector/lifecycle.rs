use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use bytes::Bytes;
use esauth::{Body, Connection, RequestParams};
use esauth_aws_v4::StaticCredentialProvider;
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use test_case::test_case;

use super::{
    channel_callback, connect, connect_with, options, wait_for_requests, Answer, TestProvider,
};
use crate::support::TestServer;

#[tokio::test]
async fn test_send_returns_response() -> Result<()> {
    let server = TestServer::start().await?;
    let conn = connect(&server, StaticCredentialProvider::new("ak", "sk"));

    let resp = conn
        .send(
            RequestParams::new(Method::GET, "/test/_search").with_querystring("q=test:hello"),
        )
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(conn.open_requests(), 0);

    let body: serde_json::Value = serde_json::from_str(&resp.text().await?)?;
    assert_eq!(body["acknowledged"], true);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    // The wire carries the signed, canonical query.
    assert_eq!(requests[0].path, "/test/_search?q=test%3Ahello");
    Ok(())
}

#[tokio::test]
async fn test_callback_called_exactly_once() -> Result<()> {
    let server = TestServer::start().await?;
    let conn = connect(&server, StaticCredentialProvider::new("ak", "sk"));

    let (callback, mut rx) = channel_callback();
    let handle = conn.request(RequestParams::new(Method::HEAD, "/"), callback);

    let resp = rx.recv().await.expect("outcome must be delivered")?;
    assert_eq!(resp.status(), StatusCode::OK);
    // Aborting a finished request changes nothing.
    handle.abort();
    assert!(rx.recv().await.is_none());
    assert_eq!(conn.open_requests(), 0);
    Ok(())
}

#[tokio::test]
async fn test_invalid_path_skips_credentials() -> Result<()> {
    let server = TestServer::start().await?;
    let provider = TestProvider::new(Answer::Valid);
    let conn = connect(&server, provider.clone());

    let (callback, mut rx) = channel_callback();
    let handle = conn.request(
        RequestParams::new(Method::GET, "/test/_doc/\u{6587}\u{4ef6}"),
        callback,
    );
    handle.abort();

    let err = rx
        .try_recv()
        .expect("callback must run before request returns")
        .unwrap_err();
    assert!(err.is_invalid_path());
    assert_eq!(conn.open_requests(), 0);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(provider.calls(), 0);
    assert!(server.requests().is_empty());
    Ok(())
}

#[test_case(Answer::Fail ; "provider error")]
#[test_case(Answer::Nothing ; "no credential")]
#[test_case(Answer::Expired ; "expired credential")]
#[tokio::test]
async fn test_credential_failure_is_connection_error(answer: Answer) -> Result<()> {
    let server = TestServer::start().await?;
    let provider = TestProvider::new(answer);
    let conn = connect(&server, provider.clone());

    let err = conn
        .send(RequestParams::new(Method::GET, "/_cluster/health"))
        .await
        .unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err}");
    assert_eq!(provider.calls(), 1);
    assert_eq!(conn.open_requests(), 0);
    assert!(server.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_provider_error_wins_over_abort() -> Result<()> {
    let server = TestServer::start().await?;
    let provider = TestProvider::new(Answer::Fail).with_delay(Duration::from_millis(100));
    let conn = connect(&server, provider);

    let (callback, mut rx) = channel_callback();
    let handle = conn.request(RequestParams::new(Method::GET, "/"), callback);
    handle.abort();

    let err = rx.recv().await.expect("outcome must be delivered").unwrap_err();
    assert!(err.is_connection());
    assert_eq!(conn.open_requests(), 0);
    Ok(())
}

#[tokio::test]
async fn test_abort_while_loading_credentials_is_silent() -> Result<()> {
    let server = TestServer::start().await?;
    let provider = TestProvider::new(Answer::Valid).with_delay(Duration::from_millis(100));
    let conn = connect(&server, provider.clone());

    let (callback, mut rx) = channel_callback();
    let handle = conn.request(RequestParams::new(Method::GET, "/"), callback);
    assert_eq!(conn.open_requests(), 1);
    handle.abort();

    // The callback is dropped without being called.
    assert!(rx.recv().await.is_none());
    assert_eq!(conn.open_requests(), 0);
    assert_eq!(provider.calls(), 1);
    assert!(server.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_abort_after_dispatch() -> Result<()> {
    let server = TestServer::start().await?;
    let conn = connect(&server, StaticCredentialProvider::new("ak", "sk"));

    let (callback, mut rx) = channel_callback();
    let handle = conn.request(RequestParams::new(Method::GET, "/slow/_search"), callback);
    wait_for_requests(&server, 1).await;
    handle.abort();
    handle.abort();

    let err = rx.recv().await.expect("outcome must be delivered").unwrap_err();
    assert!(err.is_aborted());
    assert!(rx.recv().await.is_none());
    assert_eq!(conn.open_requests(), 0);
    Ok(())
}

#[tokio::test]
async fn test_request_timeout() -> Result<()> {
    let server = TestServer::start().await?;
    let conn = connect(&server, StaticCredentialProvider::new("ak", "sk"));

    let start = Instant::now();
    let err = conn
        .send(
            RequestParams::new(Method::GET, "/slow/_search")
                .with_timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "unexpected error: {err}");
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(conn.open_requests(), 0);
    Ok(())
}

#[tokio::test]
async fn test_timeout_is_the_only_outcome() -> Result<()> {
    let server = TestServer::start().await?;
    let conn = connect(&server, StaticCredentialProvider::new("ak", "sk"));

    let (callback, mut rx) = channel_callback();
    let handle = conn.request(
        RequestParams::new(Method::GET, "/slow/_search").with_timeout(Duration::from_millis(200)),
        callback,
    );

    let err = rx.recv().await.expect("outcome must be delivered").unwrap_err();
    assert!(err.is_timeout(), "unexpected error: {err}");
    // Late abort and the dropped network future deliver nothing more.
    handle.abort();
    assert!(rx.recv().await.is_none());
    assert_eq!(conn.open_requests(), 0);
    Ok(())
}

#[tokio::test]
async fn test_node_timeout_is_default() -> Result<()> {
    let server = TestServer::start().await?;
    let conn = connect_with(
        options(&server).with_timeout(Duration::from_millis(200)),
        StaticCredentialProvider::new("ak", "sk"),
    );

    let err = conn
        .send(RequestParams::new(Method::GET, "/slow/_search"))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    Ok(())
}

#[tokio::test]
async fn test_connection_refused() -> Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let conn = connect_with(
        esauth::ConnectionOptions::new(format!("http://{addr}").parse()?),
        StaticCredentialProvider::new("ak", "sk"),
    );

    let err = conn
        .send(RequestParams::new(Method::GET, "/"))
        .await
        .unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err}");
    assert_eq!(conn.open_requests(), 0);
    Ok(())
}

#[tokio::test]
async fn test_stream_error_is_connection_error() -> Result<()> {
    let server = TestServer::start().await?;
    let conn = connect(&server, StaticCredentialProvider::new("ak", "sk"));

    let chunks: Vec<io::Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"{\"index\":{}}\n")),
        Err(io::Error::other("source went away")),
    ];
    let err = conn
        .send(
            RequestParams::new(Method::POST, "/_bulk")
                .with_body(Body::from_stream(futures::stream::iter(chunks))),
        )
        .await
        .unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err}");
    assert_eq!(conn.open_requests(), 0);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_requests() -> Result<()> {
    let server = TestServer::start().await?;
    let conn = connect(&server, StaticCredentialProvider::new("ak", "sk"));

    let sends = (0..8).map(|i| {
        let conn = conn.clone();
        async move {
            conn.send(RequestParams::new(Method::GET, format!("/idx-{i}/_count")))
                .await
        }
    });
    for res in futures::future::join_all(sends).await {
        assert_eq!(res?.status(), StatusCode::OK);
    }

    assert_eq!(conn.open_requests(), 0);
    assert_eq!(server.requests().len(), 8);
    Ok(())
}
