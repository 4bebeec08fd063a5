//! Client-side operations: signing requests, verifying the server's response, issuing bewits
//! and signing messages.
//!
//! # Examples
//!
//! ```
//! use hawk_auth::{client, Credentials, DigestAlgorithm};
//!
//! let credentials = Credentials::new(
//!     "dh37fgj492je",
//!     "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn",
//!     DigestAlgorithm::Sha256,
//! );
//! let options = client::RequestOptions::default()
//!     .payload(b"{\"hello\": true}")
//!     .content_type("application/json")
//!     .ext("my-ext-value");
//! let signed = client::header("https://example.com/resource?a=1", "POST", &credentials, &options)
//!     .unwrap();
//! assert!(signed.header.starts_with("Hawk id=\"dh37fgj492je\", ts=\""));
//! ```

use crate::artifacts::Artifacts;
use crate::bewit::Bewit;
use crate::credentials::Credentials;
use crate::crypto;
use crate::error::*;
use crate::header::{escape_header_attribute, parse_authorization_header, Attributes};
use crate::mac::{calculate_mac, calculate_ts_mac, MacType};
use crate::payload::payload_hash;
use crate::util;
use log::{debug, trace};
use url::Url;

/// Options for [`header`].  Everything is optional; unset values are generated or omitted.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions<'a> {
    /// Request time in seconds; defaults to the current time plus `localtime_offset_msec`.
    pub timestamp: Option<u64>,
    /// Defaults to a random six-character nonce.
    pub nonce: Option<String>,
    pub localtime_offset_msec: i64,
    /// The request body.  `Some(b"")` is an empty body and is still hashed.
    pub payload: Option<&'a [u8]>,
    pub content_type: Option<&'a str>,
    /// A precomputed payload hash; takes precedence over `payload`.
    pub hash: Option<String>,
    pub ext: Option<String>,
    pub app: Option<String>,
    pub dlg: Option<String>,
}

impl<'a> RequestOptions<'a> {
    pub fn timestamp(mut self, ts: u64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn nonce<S: Into<String>>(mut self, nonce: S) -> Self {
        self.nonce = Some(nonce.into());
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

    pub fn content_type(mut self, content_type: &'a str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn hash<S: Into<String>>(mut self, hash: S) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn ext<S: Into<String>>(mut self, ext: S) -> Self {
        self.ext = Some(ext.into());
        self
    }

    pub fn app<S: Into<String>>(mut self, app: S) -> Self {
        self.app = Some(app.into());
        self
    }

    pub fn dlg<S: Into<String>>(mut self, dlg: S) -> Self {
        self.dlg = Some(dlg.into());
        self
    }
}

/// A signed request: the `Authorization` header value, and the artifacts to keep for
/// verifying the response.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedRequest {
    pub header: String,
    pub artifacts: Artifacts,
}

/// Split a URL into host, port and resource (path plus non-empty query).
fn parse_uri(uri: &str) -> ClientResult<(String, u16, String)> {
    let url = Url::parse(uri)
        .map_err(|e| ClientError::InvalidArgument(format!("Invalid URI {:?}: {}", uri, e)))?;
    let host = match url.host_str() {
        Some(h) if !h.is_empty() => h.to_string(),
        _ => {
            return Err(ClientError::InvalidArgument(format!(
                "URI {:?} has no host",
                uri
            )))
        }
    };
    let port = url
        .port()
        .unwrap_or(if url.scheme() == "https" { 443 } else { 80 });
    let resource = match url.query() {
        Some(q) if !q.is_empty() => format!("{}?{}", url.path(), q),
        _ => url.path().to_string(),
    };
    Ok((host, port, resource))
}

/// Generate the value of an `Authorization` header for a request.
pub fn header(
    uri: &str,
    method: &str,
    credentials: &Credentials,
    options: &RequestOptions,
) -> ClientResult<SignedRequest> {
    if uri.is_empty() {
        return Err(ClientError::InvalidArgument("Empty URI".to_string()));
    }
    if method.is_empty() {
        return Err(ClientError::InvalidArgument("Empty method".to_string()));
    }

    credentials.validate_for_client()?;

    let (host, port, resource) = parse_uri(uri)?;

    let ts = match options.timestamp {
        Some(ts) => ts,
        None => util::now_secs(options.localtime_offset_msec),
    };
    let nonce = match options.nonce {
        Some(ref n) if !n.is_empty() => n.clone(),
        _ => util::random_nonce()?,
    };

    let mut artifacts = Artifacts {
        ts,
        ts_text: None,
        nonce,
        method: Some(method.to_string()),
        resource: Some(resource),
        host: Some(host),
        port: Some(port),
        hash: options.hash.clone().filter(|h| !h.is_empty()),
        ext: options.ext.clone(),
        app: options.app.clone().filter(|a| !a.is_empty()),
        dlg: options.dlg.clone().filter(|d| !d.is_empty()),
        mac: None,
        id: Some(credentials.id.clone()),
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

    trace!("signing {} request for {}", method, credentials.id);
    let mac = calculate_mac(MacType::Header, credentials, &artifacts)?;

    let mut header = format!(
        "Hawk id=\"{}\", ts=\"{}\", nonce=\"{}\"",
        credentials.id, artifacts.ts, artifacts.nonce
    );
    if let Some(ref hash) = artifacts.hash {
        header.push_str(&format!(", hash=\"{}\"", hash));
    }
    if let Some(ext) = artifacts.ext_str() {
        header.push_str(&format!(", ext=\"{}\"", escape_header_attribute(ext)?));
    }
    header.push_str(&format!(", mac=\"{}\"", mac));
    if let Some(ref app) = artifacts.app {
        header.push_str(&format!(", app=\"{}\"", app));
        if let Some(ref dlg) = artifacts.dlg {
            header.push_str(&format!(", dlg=\"{}\"", dlg));
        }
    }

    artifacts.mac = Some(mac);
    Ok(SignedRequest { header, artifacts })
}

/// The response headers that take part in response verification.
#[derive(Clone, Debug, Default)]
pub struct ResponseHeaders<'a> {
    pub www_authenticate: Option<&'a str>,
    pub server_authorization: Option<&'a str>,
    pub content_type: Option<&'a str>,
}

/// Options for [`authenticate_response`].
#[derive(Clone, Debug, Default)]
pub struct ResponseOptions<'a> {
    /// The response body.  When set, the server must have sent a matching hash.
    pub payload: Option<&'a [u8]>,
    /// Fail if the response has no `Server-Authorization` header.
    pub required: bool,
}

impl<'a> ResponseOptions<'a> {
    pub fn payload(mut self, payload: &'a [u8]) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// The attributes of the response's Hawk headers, for callers that want the server's `ext` or
/// `error`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedResponseHeaders {
    pub www_authenticate: Option<Attributes>,
    pub server_authorization: Option<Attributes>,
}

/// Verify a server's response to a request signed with [`header`], using the artifacts that
/// call returned.
pub fn authenticate_response(
    headers: &ResponseHeaders,
    credentials: &Credentials,
    artifacts: &Artifacts,
    options: &ResponseOptions,
) -> ClientResult<ParsedResponseHeaders> {
    let mut result = ParsedResponseHeaders::default();

    if let Some(www_authenticate) = headers.www_authenticate.filter(|h| !h.is_empty()) {
        let attributes = parse_authorization_header(www_authenticate, &["ts", "tsm", "error"])
            .map_err(|_| {
                ClientError::InvalidHeader("Invalid WWW-Authenticate header".to_string())
            })?;

        // the server timestamp is only validated, never used to adjust the local clock
        if let Some(ts) = attributes.get("ts") {
            let valid = match ts.parse::<u64>() {
                Ok(ts) => {
                    let tsm = calculate_ts_mac(ts, credentials)?;
                    attributes
                        .get("tsm")
                        .map(|given| crypto::fixed_time_eq(&tsm, given))
                        .unwrap_or(false)
                }
                Err(_) => false,
            };
            if !valid {
                debug!("invalid server timestamp hash for {}", credentials.id);
                return Err(ClientError::InvalidHeader(
                    "Invalid server timestamp hash".to_string(),
                ));
            }
        }

        result.www_authenticate = Some(attributes);
    }

    let server_authorization = match headers.server_authorization.filter(|h| !h.is_empty()) {
        Some(h) => h,
        None if !options.required => return Ok(result),
        None => "",
    };

    let attributes = parse_authorization_header(server_authorization, &["mac", "ext", "hash"])
        .map_err(|_| {
            ClientError::InvalidHeader("Invalid Server-Authorization header".to_string())
        })?;

    let mut artifacts = artifacts.clone();
    artifacts.ext = attributes.get("ext").cloned();
    artifacts.hash = attributes.get("hash").cloned();

    let mac = calculate_mac(MacType::Response, credentials, &artifacts)?;
    let mac_matches = attributes
        .get("mac")
        .map(|given| crypto::fixed_time_eq(&mac, given))
        .unwrap_or(false);
    if !mac_matches {
        debug!("bad response MAC for {}", credentials.id);
        return Err(ClientError::BadResponseMac);
    }

    if let Some(payload) = options.payload {
        let given = match attributes.get("hash") {
            Some(h) => h,
            None => return Err(ClientError::MissingResponseHash),
        };
        let calculated = payload_hash(payload, credentials.algorithm, headers.content_type)?;
        if !crypto::fixed_time_eq(&calculated, given) {
            debug!("bad response payload hash for {}", credentials.id);
            return Err(ClientError::BadResponsePayloadMac);
        }
    }

    result.server_authorization = Some(attributes);
    Ok(result)
}

/// Options for [`get_bewit`].
#[derive(Clone, Debug, Default)]
pub struct BewitOptions {
    /// How long the bewit is valid, in seconds.  Must be non-zero.
    pub ttl_sec: u64,
    pub ext: Option<String>,
    pub localtime_offset_msec: i64,
}

impl BewitOptions {
    pub fn new(ttl_sec: u64) -> Self {
        BewitOptions {
            ttl_sec,
            ..Default::default()
        }
    }

    pub fn ext<S: Into<String>>(mut self, ext: S) -> Self {
        self.ext = Some(ext.into());
        self
    }

    pub fn localtime_offset_msec(mut self, offset: i64) -> Self {
        self.localtime_offset_msec = offset;
        self
    }
}

/// Generate a bewit granting GET access to `uri` until `ttl_sec` from now.  The result is
/// already base64url-encoded, ready to be appended as `?bewit=...`.
pub fn get_bewit(
    uri: &str,
    credentials: &Credentials,
    options: &BewitOptions,
) -> ClientResult<String> {
    if uri.is_empty() {
        return Err(ClientError::InvalidArgument("Empty URI".to_string()));
    }
    if options.ttl_sec == 0 {
        return Err(ClientError::InvalidArgument(
            "Bewit TTL must be greater than zero".to_string(),
        ));
    }

    credentials.validate_for_client()?;

    let (host, port, resource) = parse_uri(uri)?;
    let now = util::now_secs(options.localtime_offset_msec);
    let exp = match now.checked_add(options.ttl_sec) {
        Some(exp) => exp,
        None => return Err(ClientError::InvalidArgument("Bewit TTL too large".to_string())),
    };
    let ext = options.ext.clone().unwrap_or_default();

    let artifacts = Artifacts {
        ts: exp,
        nonce: String::new(),
        method: Some("GET".to_string()),
        resource: Some(resource),
        host: Some(host),
        port: Some(port),
        ext: Some(ext.clone()),
        ..Default::default()
    };
    let mac = calculate_mac(MacType::Bewit, credentials, &artifacts)?;

    Ok(Bewit::new(credentials.id.clone(), exp, mac, Some(ext)).to_str())
}

/// Options for [`sign_message`].
#[derive(Clone, Debug, Default)]
pub struct MessageOptions {
    pub timestamp: Option<u64>,
    pub nonce: Option<String>,
    pub localtime_offset_msec: i64,
}

impl MessageOptions {
    pub fn timestamp(mut self, ts: u64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn nonce<S: Into<String>>(mut self, nonce: S) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn localtime_offset_msec(mut self, offset: i64) -> Self {
        self.localtime_offset_msec = offset;
        self
    }
}

/// Authorization for a message sent outside of HTTP, as produced by [`sign_message`] and
/// consumed by `server::authenticate_message`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageAuthorization {
    pub id: String,
    pub ts: u64,
    pub nonce: String,
    pub hash: String,
    pub mac: String,
}

/// Sign an arbitrary message destined for `host`:`port`.
pub fn sign_message(
    host: &str,
    port: u16,
    message: &[u8],
    credentials: &Credentials,
    options: &MessageOptions,
) -> ClientResult<MessageAuthorization> {
    if host.is_empty() {
        return Err(ClientError::InvalidArgument("Empty host".to_string()));
    }
    if port == 0 {
        return Err(ClientError::InvalidArgument("Invalid port".to_string()));
    }

    credentials.validate_for_client()?;

    let ts = match options.timestamp {
        Some(ts) => ts,
        None => util::now_secs(options.localtime_offset_msec),
    };
    let nonce = match options.nonce {
        Some(ref n) if !n.is_empty() => n.clone(),
        _ => util::random_nonce()?,
    };
    let hash = payload_hash(message, credentials.algorithm, None)?;

    let artifacts = Artifacts {
        ts,
        nonce,
        host: Some(host.to_string()),
        port: Some(port),
        hash: Some(hash),
        ..Default::default()
    };
    let mac = calculate_mac(MacType::Message, credentials, &artifacts)?;

    Ok(MessageAuthorization {
        id: credentials.id.clone(),
        ts: artifacts.ts,
        nonce: artifacts.nonce,
        hash: artifacts.hash.unwrap_or_default(),
        mac,
    })
}
