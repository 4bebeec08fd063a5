//! The `hawk-auth` crate provides support for [Hawk](https://github.com/hueniverse/hawk)
//! authentication. It is a low-level crate, used by higher-level crates to integrate with various
//! Rust HTTP libraries.  It does no I/O of its own: callers hand it the relevant request fields
//! and header values, and a function to look up credentials.
//!
//! # Examples
//!
//! ## Hawk Client
//!
//! A client signs each request with [`client::header`], keeps the returned artifacts, and checks
//! the server's reply with [`client::authenticate_response`].
//!
//! ```
//! use hawk_auth::{client, Credentials, DigestAlgorithm};
//!
//! let credentials = Credentials::new("me", "tok", DigestAlgorithm::Sha256);
//! let options = client::RequestOptions::default()
//!     .payload(b"some data")
//!     .content_type("text/plain")
//!     .ext("my-ext-value");
//! let signed = client::header("https://example.com/v1/users", "POST", &credentials, &options)
//!     .unwrap();
//!
//! // ..send the request with `Authorization: <signed.header>`, then check the response:
//! # let server_authorization = hawk_auth::server::header(&credentials, &signed.artifacts,
//! #     &hawk_auth::server::HeaderOptions::default()).unwrap();
//! let headers = client::ResponseHeaders {
//!     server_authorization: Some(server_authorization.as_str()),
//!     ..Default::default()
//! };
//! client::authenticate_response(&headers, &credentials, &signed.artifacts,
//!                               &client::ResponseOptions::default()).unwrap();
//! ```
//!
//! ## Hawk Server
//!
//! ```
//! use hawk_auth::{client, server, Credentials, DigestAlgorithm};
//!
//! let credentials = Credentials::new("me", "tok", DigestAlgorithm::Sha256);
//! # let signed = client::header("https://example.com/v1/users", "GET", &credentials,
//! #     &client::RequestOptions::default()).unwrap();
//! let request = server::Request {
//!     method: "GET",
//!     url: "/v1/users",
//!     host: Some("example.com"),
//!     port: Some(443),
//!     authorization: Some(signed.header.as_str()),
//!     content_type: None,
//! };
//!
//! match server::authenticate(&request, |_id: &str| Ok(Some(credentials.clone())),
//!                            &server::AuthenticateOptions::default()) {
//!     Ok(authenticated) => {
//!         let reply = server::HeaderOptions::default().payload(b"ok").content_type("text/plain");
//!         let header =
//!             server::header(&authenticated.credentials, &authenticated.artifacts, &reply)
//!                 .unwrap();
//!         assert!(header.starts_with("Hawk mac=\""));
//!     }
//!     Err(e) => {
//!         // answer with e.status_code(), plus e.www_authenticate_header() for a 401
//!         panic!("{}", e);
//!     }
//! }
//! ```
//!
//! ## Features
//!
//! By default, the `use_ring` feature is enabled, which means that this crate will use `ring` for
//! all cryptographic operations.
//!
//! Alternatively, one can configure the crate with the `use_openssl` feature to use the `openssl`
//! crate.
//!
//! If no features are enabled, you must provide a custom implementation of the
//! [`crypto::Cryptographer`] trait to the `set_cryptographer` function, or the cryptographic
//! operations will panic.

mod artifacts;
pub use crate::artifacts::Artifacts;

mod b64;
pub use crate::b64::{base64url_decode, base64url_encode};

mod bewit;
pub use crate::bewit::Bewit;

mod credentials;
pub use crate::credentials::{Credentials, DigestAlgorithm, SUPPORTED_ALGORITHMS};

mod error;
pub use crate::error::*;

mod header;
pub use crate::header::{
    escape_header_attribute, parse_authorization_header, parse_authorization_header_with_limit,
    Attributes, AUTHORIZATION_KEYS, MAX_MATCH_LENGTH,
};

mod mac;
pub use crate::mac::{
    calculate_mac, calculate_ts_mac, normalized_string, timestamp_message, MacType,
    TimestampMessage, HEADER_VERSION,
};

mod payload;
pub use crate::payload::{parse_content_type, payload_hash, PayloadHasher};

mod util;
pub use crate::util::{now, now_secs};

pub mod client;
pub mod crypto;
pub mod server;

pub use crate::server::DEFAULT_TIMESTAMP_SKEW_SEC;
