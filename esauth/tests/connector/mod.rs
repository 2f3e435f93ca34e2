mod lifecycle;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use esauth::{AwsConnection, Callback, Config, ConnectionOptions, Connector, Response};
use esauth_aws_v4::Credential;
use esauth_core::{Context, ProvideCredential};
use tokio::sync::mpsc;

use crate::support::TestServer;

/// How [`TestProvider`] answers.
#[derive(Debug, Clone, Copy)]
pub enum Answer {
    Valid,
    Expired,
    Nothing,
    Fail,
}

/// Credential provider that counts calls and can be slow or broken.
#[derive(Debug, Clone)]
pub struct TestProvider {
    pub calls: Arc<AtomicUsize>,
    delay: Duration,
    answer: Answer,
}

impl TestProvider {
    pub fn new(answer: Answer) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            answer,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProvideCredential for TestProvider {
    type Credential = Credential;

    async fn provide_credential(
        &self,
        _: &Context,
    ) -> esauth_core::Result<Option<Self::Credential>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let cred = Credential {
            access_key_id: "access_key_id".to_string(),
            secret_access_key: "secret_access_key".to_string(),
            session_token: None,
            expires_in: None,
        };
        match self.answer {
            Answer::Valid => Ok(Some(cred)),
            Answer::Expired => Ok(Some(Credential {
                expires_in: Some(esauth_core::time::now() - chrono::TimeDelta::minutes(5)),
                ..cred
            })),
            Answer::Nothing => Ok(None),
            Answer::Fail => Err(esauth_core::Error::credential_denied(
                "instance profile unreachable",
            )),
        }
    }
}

pub fn options(server: &TestServer) -> ConnectionOptions {
    ConnectionOptions::new(server.url().parse().expect("url must be valid"))
}

pub fn connect_with(
    options: ConnectionOptions,
    provider: impl ProvideCredential<Credential = Credential>,
) -> AwsConnection {
    Connector::new(Config::new("us-east-1"))
        .with_context(Context::new())
        .with_credential_provider(provider)
        .connect(options)
        .expect("connect must succeed")
}

pub fn connect(
    server: &TestServer,
    provider: impl ProvideCredential<Credential = Credential>,
) -> AwsConnection {
    connect_with(options(server), provider)
}

/// A callback forwarding its outcome into a channel.
///
/// The channel closes once the callback is consumed or dropped.
pub fn channel_callback() -> (Callback, mpsc::UnboundedReceiver<esauth::Result<Response>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: Callback = Box::new(move |res| {
        let _ = tx.send(res);
    });
    (callback, rx)
}

/// Wait until the server saw `n` requests.
pub async fn wait_for_requests(server: &TestServer, n: usize) {
    for _ in 0..200 {
        if server.requests().len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server never received {n} requests");
}
