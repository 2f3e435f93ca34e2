use std::fmt::{self, Debug};
use std::io;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Url;

use crate::{Error, Result};

/// Bytes that can't travel raw in a request target.
///
/// `?` is kept since the path carries the search part too. `\` would be read as a
/// path separator by the url parser.
const WIRE_PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A stream of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync + 'static>>;

/// Request body handed over by the client.
#[derive(Default)]
pub enum Body {
    /// No body at all.
    #[default]
    Empty,
    /// A finite body, hashed into the signature and sent with `content-length`.
    Bytes(Bytes),
    /// A streaming body, signed as unsigned payload and piped chunk by chunk.
    Stream(BodyStream),
}

impl Body {
    /// Wrap a stream of chunks as a body.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + Sync + 'static,
    {
        Body::Stream(Box::pin(stream))
    }

    /// Whether the body is a stream.
    pub fn is_stream(&self) -> bool {
        matches!(self, Body::Stream(_))
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Bytes(bs) => f.debug_tuple("Bytes").field(&bs.len()).finish(),
            Body::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Bytes(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(value.into())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Bytes(value.into())
    }
}

impl From<&'static str> for Body {
    fn from(value: &'static str) -> Self {
        Body::Bytes(Bytes::from_static(value.as_bytes()))
    }
}

/// The abstract request a client passes to [`crate::Connection::request`].
#[derive(Debug)]
pub struct RequestParams {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the node url, like `/idx/_search`.
    pub path: String,
    /// Already encoded querystring without the leading `?`.
    pub querystring: Option<String>,
    /// Request headers, overriding the node defaults.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Body,
    /// Request timeout, overriding the node default.
    pub timeout: Option<Duration>,
}

impl RequestParams {
    /// Create a request without query, headers or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            querystring: None,
            headers: HeaderMap::new(),
            body: Body::Empty,
            timeout: None,
        }
    }

    /// Set the querystring.
    pub fn with_querystring(mut self, querystring: impl Into<String>) -> Self {
        self.querystring = Some(querystring.into());
        self
    }

    /// Set a header, replacing previous values.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options of the node a connection talks to.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Node url, may carry a base path and a search part.
    pub url: Url,
    /// Headers sent with every request.
    pub headers: HeaderMap,
    /// HTTP client used for dispatch, a default client if absent.
    pub agent: Option<reqwest::Client>,
    /// Default request timeout.
    pub timeout: Option<Duration>,
}

impl ConnectionOptions {
    /// Create options for the given node url.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
            agent: None,
            timeout: None,
        }
    }

    /// Set the default headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the HTTP client.
    pub fn with_agent(mut self, agent: reqwest::Client) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Set the default timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A concrete request ready to be signed and sent.
#[derive(Debug)]
pub struct WireRequest {
    /// Url scheme, like `https`.
    pub protocol: String,
    /// Host without IPv6 brackets.
    pub hostname: String,
    /// Explicit port, `None` for the scheme default.
    pub port: Option<u16>,
    /// HTTP method.
    pub method: Method,
    /// Pathname plus search.
    pub path: String,
    /// Merged headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Body,
    /// Effective timeout.
    pub timeout: Option<Duration>,
}

impl WireRequest {
    /// Build the absolute uri this request is sent to.
    ///
    /// The uri goes through the same url parser the HTTP client uses, so dot segments
    /// are already resolved here and the signed target is the one on the wire.
    pub fn uri(&self) -> Result<Uri> {
        let host = if self.hostname.contains(':') {
            format!("[{}]", self.hostname)
        } else {
            self.hostname.clone()
        };
        let authority = match self.port {
            Some(port) => format!("{host}:{port}"),
            None => host,
        };

        let uri = format!(
            "{}://{authority}{}",
            self.protocol,
            utf8_percent_encode(&self.path, WIRE_PATH_ENCODE_SET)
        );
        let url = Url::parse(&uri).map_err(|e| {
            Error::connection(format!("failed to build request uri {uri}")).with_source(e)
        })?;
        url.as_str().parse::<Uri>().map_err(|e| {
            Error::connection(format!("failed to build request uri {url}")).with_source(e)
        })
    }
}

/// Turn the client's request into a wire request against the node.
pub fn build_request_object(options: &ConnectionOptions, params: RequestParams) -> WireRequest {
    let url = &options.url;

    let mut search = url.query().map(|q| format!("?{q}")).unwrap_or_default();
    if let Some(qs) = params.querystring.filter(|qs| !qs.is_empty()) {
        search.push(if search.is_empty() { '?' } else { '&' });
        search.push_str(&qs);
    }

    let mut headers = options.headers.clone();
    // Request headers replace node defaults of the same name.
    headers.extend(params.headers);

    WireRequest {
        protocol: url.scheme().to_string(),
        hostname: url
            .host_str()
            .unwrap_or_default()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string(),
        port: url.port(),
        method: params.method,
        path: resolve_pathname(url.path(), &params.path) + &search,
        headers,
        body: params.body,
        timeout: params.timeout.or(options.timeout),
    }
}

/// Join the node pathname and the request path with exactly one `/`.
fn resolve_pathname(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

/// Reject paths carrying characters outside `U+0021..=U+00FF`.
pub fn validate_path(path: &str) -> Result<()> {
    if path.chars().any(|c| !('\u{21}'..='\u{ff}').contains(&c)) {
        return Err(Error::invalid_path(path));
    }
    Ok(())
}
