use std::env;
use std::str::FromStr;

use anyhow::Result;
use esauth::{Config, ConnectionOptions, Connector, RequestParams};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, StatusCode};
use log::warn;
use serde_json::{json, Value};

/// Build a connector against a real domain, or `None` if live tests are off.
fn init_live_test() -> Option<esauth::AwsConnection> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("ESAUTH_AWS_ES_TEST").unwrap_or_default() != "on" {
        warn!("ESAUTH_AWS_ES_TEST is not set, skipped");
        return None;
    }

    let url = env::var("ESAUTH_AWS_ES_URL").expect("env ESAUTH_AWS_ES_URL must be set");
    let url = reqwest::Url::from_str(&url).expect("ESAUTH_AWS_ES_URL must be a valid url");

    let conn = Connector::new(Config::default())
        .connect(ConnectionOptions::new(url))
        .expect("connect must succeed, is AWS_REGION set?");
    Some(conn)
}

#[tokio::test]
async fn test_cluster_health() -> Result<()> {
    let Some(conn) = init_live_test() else {
        return Ok(());
    };

    let resp = conn
        .send(RequestParams::new(Method::GET, "/_cluster/health"))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&resp.bytes().await?)?;
    assert!(body["status"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_index_and_search() -> Result<()> {
    let Some(conn) = init_live_test() else {
        return Ok(());
    };

    let index = format!("esauth-live-{}", chrono::Utc::now().timestamp_millis());
    let json_header = HeaderValue::from_static("application/json");

    let resp = conn
        .send(
            RequestParams::new(Method::PUT, format!("/{index}/_doc/1"))
                .with_querystring("refresh=true")
                .with_header(CONTENT_TYPE, json_header.clone())
                .with_body(json!({ "test": "hello" }).to_string()),
        )
        .await?;
    assert!(resp.status().is_success(), "index failed: {}", resp.status());

    let resp = conn
        .send(
            RequestParams::new(Method::POST, format!("/{index}/_search"))
                .with_header(CONTENT_TYPE, json_header)
                .with_body(json!({ "query": { "term": { "test": "hello" } } }).to_string()),
        )
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&resp.bytes().await?)?;
    assert_eq!(body["hits"]["hits"][0]["_source"]["test"], "hello");

    let resp = conn
        .send(RequestParams::new(Method::DELETE, format!("/{index}")))
        .await?;
    assert!(resp.status().is_success());
    Ok(())
}
