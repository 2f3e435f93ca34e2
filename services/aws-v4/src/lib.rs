//! AWS SigV4 signing for search cluster requests.
//!
//! This crate provides the AWS [`Credential`], the credential providers that resolve
//! it, and [`RequestSigner`], which signs requests for the `es` service (or any
//! other SigV4 service name).
//!
//! ## Example
//!
//! ```no_run
//! use esauth_aws_v4::{DefaultCredentialProvider, RequestSigner};
//! use esauth_core::{Context, OsEnv, Signer, SigningPayload};
//! use esauth_file_read_tokio::TokioFileRead;
//!
//! # async fn example() -> esauth_core::Result<()> {
//! let ctx = Context::new().with_file_read(TokioFileRead).with_env(OsEnv);
//! let signer = Signer::new(
//!     ctx,
//!     DefaultCredentialProvider::new(),
//!     RequestSigner::new("es", "us-east-1"),
//! );
//!
//! let body = br#"{"query":{"match_all":{}}}"#;
//! let mut parts = http::Request::post("https://search-demo.us-east-1.es.amazonaws.com/test/_search")
//!     .header("content-type", "application/json")
//!     .body(())
//!     .expect("request must be valid")
//!     .into_parts()
//!     .0;
//!
//! let cred = signer.credential().await?;
//! signer.sign(&mut parts, SigningPayload::Bytes(body), &cred).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod constants;
pub use constants::{AWS_DEFAULT_REGION, AWS_REGION};

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::RequestSigner;

mod provide_credential;
pub use provide_credential::*;
