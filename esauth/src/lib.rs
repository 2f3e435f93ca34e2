// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Signing transport for search clusters behind AWS SigV4.
//!
//! esauth plugs into a search client as its [`Connection`]: every request gets fresh
//! credentials, is signed for the `es` service and is sent with reqwest. The outcome
//! is delivered to a callback exactly once, unless the request is aborted while its
//! credentials are still loading.
//!
//! ## Example
//!
//! ```no_run
//! use esauth::{Config, Connection, ConnectionOptions, Connector, RequestParams};
//! use esauth_aws_v4::StaticCredentialProvider;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let connector = Connector::new(Config::new("us-east-1"))
//!     .with_credential_provider(StaticCredentialProvider::new("access_key_id", "secret"));
//! let conn = connector.connect(ConnectionOptions::new(
//!     "https://search-demo.us-east-1.es.amazonaws.com".parse()?,
//! ))?;
//!
//! let handle = conn.request(
//!     RequestParams::new(http::Method::GET, "/_search").with_querystring("q=title:hello"),
//!     Box::new(|res| match res {
//!         Ok(resp) => println!("got {}", resp.status()),
//!         Err(err) => eprintln!("failed: {err}"),
//!     }),
//! );
//! // Changed our mind.
//! handle.abort();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
pub use config::{Config, DEFAULT_SERVICE};

mod connection;
pub use connection::{Callback, Connection, RequestHandle, Response};

mod connector;
pub use connector::{AwsConnection, Connector};

mod error;
pub use error::{Error, ErrorKind, Result};

mod pending;

mod request;
pub use request::{
    build_request_object, validate_path, Body, BodyStream, ConnectionOptions, RequestParams,
    WireRequest,
};
