//! Server-side operations: authenticating requests, bewits and messages, and generating the
//! `Server-Authorization` header for responses.
//!
//! Credentials are found through a lookup function supplied by the application.  It receives
//! the credentials id and returns `Ok(None)` for unknown ids; an `Err` is treated as an internal
//! failure.  The lookup may return any type implementing `AsRef<Credentials>`, so applications
//! can carry their own user data through authentication.
//!
//! # Examples
//!
//! ```
//! use hawk_auth::{client, server, Credentials, DigestAlgorithm};
//!
//! let credentials = Credentials::new(
//!     "dh37fgj492je",
//!     "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn",
//!     DigestAlgorithm::Sha256,
//! );
//! let signed = client::header("http://example.com:8000/resource/1?b=1&a=2", "GET", &credentials,
//!                             &client::RequestOptions::default()).unwrap();
//!
//! let request = server::Request {
//!     method: "GET",
//!     url: "/resource/1?b=1&a=2",
//!     host: Some("example.com"),
//!     port: Some(8000),
//!     authorization: Some(signed.header.as_str()),
//!     ..Default::default()
//! };
//! let authenticated = server::authenticate(
//!     &request,
//!     |id: &str| Ok(if id == "dh37fgj492je" { Some(credentials.clone()) } else { None }),
//!     &server::AuthenticateOptions::default(),
//! ).unwrap();
//! assert_eq!(authenticated.credentials.id, "dh37fgj492je");
//! ```

use crate::artifacts::Artifacts;
use crate::bewit::Bewit;
use crate::client::MessageAuthorization;
use crate::credentials::Credentials;
use crate::crypto;
use crate::error::*;
use crate::header::{
    escape_header_attribute, format_header, parse_authorization_header_with_limit,
    AUTHORIZATION_KEYS, MAX_MATCH_LENGTH,
};
use crate::mac::{calculate_mac, timestamp_message, MacType};
use crate::payload::payload_hash;
use crate::util;
use log::{debug, trace};
use std::fmt;
use std::str::FromStr;

/// Default allowed difference, in seconds, between the client's and the server's clocks.
pub const DEFAULT_TIMESTAMP_SKEW_SEC: u64 = 60;

/// A replay check, called with the credentials key, the nonce and the timestamp of a request
/// whose MAC has already been verified.  Returning an error rejects the request.
pub type NonceCheck<'a> = dyn Fn(&[u8], &str, u64) -> Result<(), failure::Error> + 'a;

/// The parts of an incoming HTTP request that take part in authentication.
#[derive(Clone, Debug, Default)]
pub struct Request<'a> {
    pub method: &'a str,
    /// Path and query, e.g. `/resource/4?filter=a`.
    pub url: &'a str,
    pub host: Option<&'a str>,
    pub port: Option<u16>,
    /// The `Authorization` header value.
    pub authorization: Option<&'a str>,
    pub content_type: Option<&'a str>,
}

/// Options for [`authenticate`], [`authenticate_bewit`] and [`authenticate_message`].
#[derive(Clone)]
pub struct AuthenticateOptions<'a> {
    /// Overrides the request's host, e.g. when behind a proxy.
    pub host: Option<&'a str>,
    /// Overrides the request's port.
    pub port: Option<u16>,
    pub timestamp_skew_sec: u64,
    pub localtime_offset_msec: i64,
    /// The request body.  When set, the request must carry a matching hash.
    pub payload: Option<&'a [u8]>,
    pub nonce_check: Option<&'a NonceCheck<'a>>,
    /// Longest header or URL that will be parsed.
    pub max_match_length: usize,
}

impl<'a> Default for AuthenticateOptions<'a> {
    fn default() -> Self {
        AuthenticateOptions {
            host: None,
            port: None,
            timestamp_skew_sec: DEFAULT_TIMESTAMP_SKEW_SEC,
            localtime_offset_msec: 0,
            payload: None,
            nonce_check: None,
            max_match_length: MAX_MATCH_LENGTH,
        }
    }
}

impl<'a> fmt::Debug for AuthenticateOptions<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AuthenticateOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timestamp_skew_sec", &self.timestamp_skew_sec)
            .field("localtime_offset_msec", &self.localtime_offset_msec)
            .field("payload", &self.payload.map(|p| p.len()))
            .field("nonce_check", &self.nonce_check.is_some())
            .field("max_match_length", &self.max_match_length)
            .finish()
    }
}

impl<'a> AuthenticateOptions<'a> {
    pub fn host(mut self, host: &'a str) -> Self {
        self.host = Some(host);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn timestamp_skew_sec(mut self, skew: u64) -> Self {
        self.timestamp_skew_sec = skew;
        self
    }

    pub fn localtime_offset_msec(mut self, offset: i64) -> Self {
        self.localtime_offset_msec = offset;
        self
    }

    pub fn payload(mut self, payload: &'a [u8]) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn nonce_check(mut self, check: &'a NonceCheck<'a>) -> Self {
        self.nonce_check = Some(check);
        self
    }

    pub fn max_match_length(mut self, max: usize) -> Self {
        self.max_match_length = max;
        self
    }
}

/// A successfully authenticated request.
#[derive(Clone, Debug)]
pub struct Authenticated<C> {
    pub credentials: C,
    /// Keep these to build the response header with [`header`], or to check a deferred payload
    /// with [`authenticate_payload`].
    pub artifacts: Artifacts,
}

/// A successfully authenticated bewit.
#[derive(Clone, Debug)]
pub struct AuthenticatedBewit<C> {
    pub credentials: C,
    pub bewit: Bewit,
}

fn log_failure<T>(kind: &str, result: ServerResult<T>) -> ServerResult<T> {
    if let Err(ref e) = result {
        debug!("{} authentication failed: {}", kind, e);
    }
    result
}

fn resolve_host<'a>(
    request: &Request<'a>,
    options: &AuthenticateOptions<'a>,
) -> ServerResult<(&'a str, u16)> {
    let host = options.host.or(request.host).filter(|h| !h.is_empty());
    let port = options.port.or(request.port).filter(|p| *p != 0);
    match (host, port) {
        (Some(host), Some(port)) => Ok((host, port)),
        _ => Err(ServerError::bad_request("Invalid Host header")),
    }
}

fn lookup_credentials<C, F>(id: &str, lookup: F) -> ServerResult<C>
where
    C: AsRef<Credentials>,
    F: FnOnce(&str) -> Result<Option<C>, failure::Error>,
{
    let credentials = lookup(id)
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .ok_or_else(|| ServerError::unauthorized("Unknown credentials"))?;
    credentials.as_ref().validate_for_server()?;
    Ok(credentials)
}

/// The received text, not this value, is what gets signed, so zero-padded timestamps verify.
fn parse_timestamp(ts: &str) -> ServerResult<u64> {
    if ts.is_empty() || !ts.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServerError::bad_request("Invalid timestamp"));
    }
    u64::from_str(ts).map_err(|_| ServerError::bad_request("Invalid timestamp"))
}

fn check_nonce(
    credentials: &Credentials,
    nonce: &str,
    ts: u64,
    options: &AuthenticateOptions,
) -> ServerResult<()> {
    if let Some(check) = options.nonce_check {
        check(&credentials.key, nonce, ts).map_err(|e| {
            debug!("nonce check failed for {}: {}", credentials.id, e);
            ServerError::unauthorized("Invalid nonce")
        })?;
    }
    Ok(())
}

/// Reject timestamps outside the allowed skew, sending back the server's own signed time so the
/// client can resynchronize.
fn check_timestamp(
    ts: u64,
    now: u64,
    credentials: &Credentials,
    options: &AuthenticateOptions,
) -> ServerResult<()> {
    let skew = i128::from(options.timestamp_skew_sec) * 1000;
    if (i128::from(ts) * 1000 - i128::from(now)).abs() > skew {
        let tsm = timestamp_message(credentials, options.localtime_offset_msec)?;
        return Err(ServerError::Unauthorized {
            message: "Stale timestamp".to_string(),
            attributes: vec![
                ("ts".to_string(), tsm.ts.to_string()),
                ("tsm".to_string(), tsm.tsm),
            ],
        });
    }
    Ok(())
}

/// Authenticate a request carrying a Hawk `Authorization` header.
pub fn authenticate<C, F>(
    request: &Request,
    lookup: F,
    options: &AuthenticateOptions,
) -> ServerResult<Authenticated<C>>
where
    C: AsRef<Credentials>,
    F: FnOnce(&str) -> Result<Option<C>, failure::Error>,
{
    log_failure("request", authenticate_request(request, lookup, options))
}

fn authenticate_request<C, F>(
    request: &Request,
    lookup: F,
    options: &AuthenticateOptions,
) -> ServerResult<Authenticated<C>>
where
    C: AsRef<Credentials>,
    F: FnOnce(&str) -> Result<Option<C>, failure::Error>,
{
    let now = util::now(options.localtime_offset_msec);

    let (host, port) = resolve_host(request, options)?;

    let attributes = parse_authorization_header_with_limit(
        request.authorization.unwrap_or(""),
        AUTHORIZATION_KEYS,
        options.max_match_length,
    )?;

    let (id, ts, nonce, mac) = match (
        attributes.get("id"),
        attributes.get("ts"),
        attributes.get("nonce"),
        attributes.get("mac"),
    ) {
        (Some(id), Some(ts), Some(nonce), Some(mac)) => (id, ts, nonce, mac),
        _ => return Err(ServerError::bad_request("Missing attributes")),
    };
    let ts_text = ts.clone();
    let ts = parse_timestamp(ts)?;

    let artifacts = Artifacts {
        ts,
        ts_text: Some(ts_text),
        nonce: nonce.clone(),
        method: Some(request.method.to_string()),
        resource: Some(request.url.to_string()),
        host: Some(host.to_string()),
        port: Some(port),
        hash: attributes.get("hash").cloned(),
        ext: attributes.get("ext").cloned(),
        app: attributes.get("app").cloned(),
        dlg: attributes.get("dlg").cloned(),
        mac: Some(mac.clone()),
        id: Some(id.clone()),
    };

    let credentials = lookup_credentials(id, lookup)?;
    let creds = credentials.as_ref();

    trace!("verifying header MAC for {}", id);
    let calculated = calculate_mac(MacType::Header, creds, &artifacts)?;
    if !crypto::fixed_time_eq(&calculated, mac) {
        return Err(ServerError::unauthorized("Bad MAC"));
    }

    if let Some(payload) = options.payload {
        let hash = match artifacts.hash {
            Some(ref hash) => hash,
            None => return Err(ServerError::unauthorized("Missing required payload hash")),
        };
        let calculated = payload_hash(payload, creds.algorithm, request.content_type)?;
        if !crypto::fixed_time_eq(&calculated, hash) {
            return Err(ServerError::unauthorized("Bad payload hash"));
        }
    }

    check_nonce(creds, &artifacts.nonce, ts, options)?;
    check_timestamp(ts, now, creds, options)?;

    Ok(Authenticated {
        credentials,
        artifacts,
    })
}

/// Check a payload that was not available when the request was authenticated.
pub fn authenticate_payload(
    payload: &[u8],
    credentials: &Credentials,
    artifacts: &Artifacts,
    content_type: Option<&str>,
) -> ServerResult<()> {
    let calculated = payload_hash(payload, credentials.algorithm, content_type)?;
    authenticate_payload_hash(&calculated, artifacts)
}

/// Compare a payload hash computed by the caller, e.g. with a `PayloadHasher` over a streamed
/// body, against the one the request carried.
pub fn authenticate_payload_hash(calculated_hash: &str, artifacts: &Artifacts) -> ServerResult<()> {
    match artifacts.hash {
        Some(ref hash) if crypto::fixed_time_eq(calculated_hash, hash) => Ok(()),
        _ => Err(ServerError::unauthorized("Bad payload hash")),
    }
}

/// Options for [`header`].
#[derive(Clone, Debug, Default)]
pub struct HeaderOptions<'a> {
    /// A precomputed hash of the response payload.
    pub hash: Option<String>,
    pub ext: Option<String>,
    /// The response body, hashed when `hash` is not given.
    pub payload: Option<&'a [u8]>,
    pub content_type: Option<&'a str>,
}

impl<'a> HeaderOptions<'a> {
    pub fn hash<S: Into<String>>(mut self, hash: S) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn ext<S: Into<String>>(mut self, ext: S) -> Self {
        self.ext = Some(ext.into());
        self
    }

    pub fn payload(mut self, payload: &'a [u8]) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn content_type(mut self, content_type: &'a str) -> Self {
        self.content_type = Some(content_type);
        self
    }
}

/// Generate the `Server-Authorization` header for a response to an authenticated request.
pub fn header(
    credentials: &Credentials,
    artifacts: &Artifacts,
    options: &HeaderOptions,
) -> ServerResult<String> {
    credentials.validate_for_server()?;

    let mut artifacts = Artifacts {
        mac: None,
        hash: options.hash.clone().filter(|h| !h.is_empty()),
        ext: options.ext.clone(),
        ..artifacts.clone()
    };

    if artifacts.hash.is_none() {
        if let Some(payload) = options.payload {
            artifacts.hash = Some(payload_hash(
                payload,
                credentials.algorithm,
                options.content_type,
            )?);
        }
    }

    let mac = calculate_mac(MacType::Response, credentials, &artifacts)?;

    let ext = match artifacts.ext_str() {
        Some(ext) => Some(escape_header_attribute(ext).map_err(|e| match e {
            ClientError::InvalidArgument(msg) => ServerError::Internal(msg),
            e => ServerError::Internal(e.to_string()),
        })?),
        None => None,
    };

    let mut attributes = vec![("mac", mac.as_str())];
    if let Some(ref hash) = artifacts.hash {
        attributes.push(("hash", hash.as_str()));
    }
    if let Some(ref ext) = ext {
        attributes.push(("ext", ext.as_str()));
    }
    Ok(format_header(&attributes))
}

/// Authenticate a GET or HEAD request carrying a `bewit` query parameter in place of an
/// `Authorization` header.
pub fn authenticate_bewit<C, F>(
    request: &Request,
    lookup: F,
    options: &AuthenticateOptions,
) -> ServerResult<AuthenticatedBewit<C>>
where
    C: AsRef<Credentials>,
    F: FnOnce(&str) -> Result<Option<C>, failure::Error>,
{
    log_failure("bewit", authenticate_bewit_request(request, lookup, options))
}

fn authenticate_bewit_request<C, F>(
    request: &Request,
    lookup: F,
    options: &AuthenticateOptions,
) -> ServerResult<AuthenticatedBewit<C>>
where
    C: AsRef<Credentials>,
    F: FnOnce(&str) -> Result<Option<C>, failure::Error>,
{
    let now = util::now(options.localtime_offset_msec);

    if request.url.len() > options.max_match_length {
        return Err(ServerError::bad_request("Resource path exceeds max length"));
    }

    let (raw, url) = match Bewit::strip_from_url(request.url) {
        Some(found) => found,
        None => return Err(ServerError::unauthorized("")),
    };

    if raw.is_empty() {
        return Err(ServerError::unauthorized("Empty bewit"));
    }

    if request.method != "GET" && request.method != "HEAD" {
        return Err(ServerError::unauthorized("Invalid method"));
    }

    if request.authorization.map(|a| !a.is_empty()).unwrap_or(false) {
        return Err(ServerError::bad_request("Multiple authentications"));
    }

    let bewit = Bewit::from_str(raw)?;

    if bewit.exp().saturating_mul(1000) <= now {
        return Err(ServerError::unauthorized("Access expired"));
    }

    let credentials = lookup_credentials(bewit.id(), lookup)?;
    let creds = credentials.as_ref();

    let (host, port) = resolve_host(request, options)?;
    let artifacts = Artifacts {
        ts: bewit.exp(),
        nonce: String::new(),
        method: Some("GET".to_string()),
        resource: Some(url),
        host: Some(host.to_string()),
        port: Some(port),
        ext: Some(bewit.ext().unwrap_or("").to_string()),
        ..Default::default()
    };

    trace!("verifying bewit MAC for {}", bewit.id());
    let calculated = calculate_mac(MacType::Bewit, creds, &artifacts)?;
    if !crypto::fixed_time_eq(&calculated, bewit.mac()) {
        return Err(ServerError::unauthorized("Bad MAC"));
    }

    Ok(AuthenticatedBewit { credentials, bewit })
}

/// Authenticate a message signed with `client::sign_message`, returning the credentials.
pub fn authenticate_message<C, F>(
    host: &str,
    port: u16,
    message: &[u8],
    authorization: &MessageAuthorization,
    lookup: F,
    options: &AuthenticateOptions,
) -> ServerResult<C>
where
    C: AsRef<Credentials>,
    F: FnOnce(&str) -> Result<Option<C>, failure::Error>,
{
    log_failure(
        "message",
        authenticate_message_inner(host, port, message, authorization, lookup, options),
    )
}

fn authenticate_message_inner<C, F>(
    host: &str,
    port: u16,
    message: &[u8],
    authorization: &MessageAuthorization,
    lookup: F,
    options: &AuthenticateOptions,
) -> ServerResult<C>
where
    C: AsRef<Credentials>,
    F: FnOnce(&str) -> Result<Option<C>, failure::Error>,
{
    let now = util::now(options.localtime_offset_msec);

    if host.is_empty() || port == 0 {
        return Err(ServerError::bad_request("Invalid host or port"));
    }

    if authorization.id.is_empty()
        || authorization.ts == 0
        || authorization.nonce.is_empty()
        || authorization.hash.is_empty()
        || authorization.mac.is_empty()
    {
        return Err(ServerError::bad_request("Invalid authorization"));
    }

    let credentials = lookup_credentials(&authorization.id, lookup)?;
    let creds = credentials.as_ref();

    let artifacts = Artifacts {
        ts: authorization.ts,
        nonce: authorization.nonce.clone(),
        host: Some(host.to_string()),
        port: Some(port),
        hash: Some(authorization.hash.clone()),
        ..Default::default()
    };

    let calculated = calculate_mac(MacType::Message, creds, &artifacts)?;
    if !crypto::fixed_time_eq(&calculated, &authorization.mac) {
        return Err(ServerError::unauthorized("Bad MAC"));
    }

    let hash = payload_hash(message, creds.algorithm, None)?;
    if !crypto::fixed_time_eq(&hash, &authorization.hash) {
        return Err(ServerError::unauthorized("Bad message hash"));
    }

    check_nonce(creds, &authorization.nonce, authorization.ts, options)?;
    check_timestamp(authorization.ts, now, creds, options)?;

    Ok(credentials)
}
