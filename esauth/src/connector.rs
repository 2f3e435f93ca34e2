use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use esauth_aws_v4::{Credential, DefaultCredentialProvider, RequestSigner};
use esauth_core::{Context, OsEnv, ProvideCredential, Signer, SigningPayload};
use esauth_file_read_tokio::TokioFileRead;
use http::header::CONTENT_LENGTH;
use http::HeaderValue;
use log::debug;
use tokio::sync::oneshot;

use crate::pending::{OpenRequestGuard, PendingOperation};
use crate::request::{build_request_object, validate_path};
use crate::{
    Body, Callback, Config, Connection, ConnectionOptions, Error, RequestHandle, RequestParams,
    Response, Result, WireRequest,
};

/// Connector builds signing connections to search cluster nodes.
///
/// ```no_run
/// use esauth::{Config, Connector, ConnectionOptions, RequestParams};
///
/// # async fn example() -> anyhow::Result<()> {
/// let connector = Connector::new(Config::new("us-east-1"));
/// let conn = connector.connect(ConnectionOptions::new(
///     "https://search-demo.us-east-1.es.amazonaws.com".parse()?,
/// ))?;
///
/// let resp = conn
///     .send(RequestParams::new(http::Method::GET, "/_cluster/health"))
///     .await?;
/// println!("{}", resp.status());
/// # Ok(())
/// # }
/// ```
pub struct Connector {
    config: Config,
    ctx: Context,
    provider: Arc<dyn ProvideCredential<Credential = Credential>>,
}

impl Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl Connector {
    /// Create a connector reading files with tokio and the process environment,
    /// with credentials from [`DefaultCredentialProvider`].
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ctx: Context::new().with_file_read(TokioFileRead).with_env(OsEnv),
            provider: Arc::new(DefaultCredentialProvider::new()),
        }
    }

    /// Replace the context used for config and credential loading.
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Replace the credential provider.
    pub fn with_credential_provider(
        mut self,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    /// Create a connection to the node described by `options`.
    ///
    /// Fails if no region can be resolved or the node url has no host.
    pub fn connect(&self, options: ConnectionOptions) -> esauth_core::Result<AwsConnection> {
        let config = self.config.clone().from_env(&self.ctx);
        let Some(region) = config.region else {
            return Err(esauth_core::Error::config_invalid(
                "region is required, set it in config or via AWS_REGION",
            ));
        };
        if options.url.host_str().is_none() {
            return Err(esauth_core::Error::config_invalid(format!(
                "node url {} has no host",
                options.url
            )));
        }

        let client = options.agent.clone().unwrap_or_default();
        let signer = Signer::new(
            self.ctx.clone(),
            self.provider.clone(),
            RequestSigner::new(&config.service, &region),
        );

        Ok(AwsConnection {
            inner: Arc::new(Inner {
                options,
                client,
                signer,
            }),
            open_requests: Arc::new(AtomicUsize::new(0)),
        })
    }
}

/// A connection that signs every request with AWS SigV4 before sending it.
#[derive(Clone, Debug)]
pub struct AwsConnection {
    inner: Arc<Inner>,
    open_requests: Arc<AtomicUsize>,
}

#[derive(Debug)]
struct Inner {
    options: ConnectionOptions,
    client: reqwest::Client,
    signer: Signer<Credential>,
}

impl AwsConnection {
    /// Options of the node this connection talks to.
    pub fn options(&self) -> &ConnectionOptions {
        &self.inner.options
    }

    /// Send a request and wait for its outcome.
    ///
    /// A request aborted while credentials were loading never reports an outcome;
    /// here it surfaces as a request aborted error.
    pub async fn send(&self, params: RequestParams) -> Result<Response> {
        let (tx, rx) = oneshot::channel();
        let _handle = self.request(
            params,
            Box::new(move |res| {
                let _ = tx.send(res);
            }),
        );

        rx.await.unwrap_or_else(|_| Err(Error::aborted()))
    }

    /// Run one request from credential loading to response headers.
    ///
    /// Returns `None` when the request was aborted while credentials were loading.
    async fn execute(&self, req: WireRequest, op: &PendingOperation) -> Option<Result<Response>> {
        let cred = match self.inner.signer.credential().await {
            Ok(cred) => cred,
            Err(err) => return Some(Err(err.into())),
        };
        if op.is_aborted() {
            return None;
        }

        let timeout = req.timeout;
        let request = match self.sign(req, &cred).await {
            Ok(request) => request,
            Err(err) => return Some(Err(err)),
        };

        Some(self.dispatch(request, timeout, op).await)
    }

    async fn sign(&self, req: WireRequest, cred: &Credential) -> Result<reqwest::Request> {
        let (mut parts, ()) = http::Request::new(()).into_parts();
        parts.uri = req.uri()?;
        parts.method = req.method;
        parts.headers = req.headers;

        if let Body::Bytes(bs) = &req.body {
            parts
                .headers
                .insert(CONTENT_LENGTH, HeaderValue::from(bs.len()));
        }

        let payload = match &req.body {
            Body::Empty => SigningPayload::Bytes(&[]),
            Body::Bytes(bs) => SigningPayload::Bytes(&bs[..]),
            Body::Stream(_) => SigningPayload::Unsigned,
        };
        self.inner.signer.sign(&mut parts, payload, cred).await?;

        let body = match req.body {
            Body::Empty => reqwest::Body::from(Bytes::new()),
            Body::Bytes(bs) => reqwest::Body::from(bs),
            Body::Stream(stream) => reqwest::Body::wrap_stream(stream),
        };

        Ok(reqwest::Request::try_from(http::Request::from_parts(
            parts, body,
        ))?)
    }

    async fn dispatch(
        &self,
        request: reqwest::Request,
        timeout: Option<Duration>,
        op: &PendingOperation,
    ) -> Result<Response> {
        let target = format!("{} {}", request.method(), request.url().path());
        let timeout = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            _ = op.aborted() => {
                debug!("request aborted: {target}");
                Err(Error::aborted())
            }
            _ = timeout => {
                debug!("request timed out: {target}");
                Err(Error::timeout())
            }
            res = self.inner.client.execute(request) => res.map_err(Error::from),
        }
    }
}

impl Connection for AwsConnection {
    fn request(&self, params: RequestParams, callback: Callback) -> RequestHandle {
        let guard = OpenRequestGuard::new(&self.open_requests);

        let req = build_request_object(&self.inner.options, params);
        if let Err(err) = validate_path(&req.path) {
            drop(guard);
            callback(Err(err));
            return RequestHandle::noop();
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            drop(guard);
            callback(Err(Error::connection(
                "request must be started inside a tokio runtime",
            )));
            return RequestHandle::noop();
        };

        debug!("starting a new request: {} {}", req.method, req.path);

        let op = Arc::new(PendingOperation::new());
        let this = self.clone();
        let pending = op.clone();
        runtime.spawn(async move {
            let outcome = this.execute(req, &pending).await;
            drop(guard);

            match outcome {
                Some(res) => callback(res),
                None => debug!("request aborted while loading credentials, dropped"),
            }
        });

        RequestHandle::new(op)
    }

    fn open_requests(&self) -> usize {
        self.open_requests.load(Ordering::SeqCst)
    }
}
