use crate::crypto::CryptoError;
use failure::Fail;

pub type ClientResult<T> = std::result::Result<T, ClientError>;
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Failures raised while signing requests or verifying responses.  These are always local and
/// synchronous; nothing here is retried.
#[derive(Fail, Debug)]
pub enum ClientError {
    #[fail(display = "Invalid argument type: {}", _0)]
    InvalidArgument(String),

    #[fail(display = "Invalid credentials")]
    InvalidCredentials,

    #[fail(display = "Unknown algorithm")]
    UnknownAlgorithm,

    #[fail(display = "{}", _0)]
    InvalidHeader(String),

    #[fail(display = "Bad response MAC")]
    BadResponseMac,

    #[fail(display = "Bad response payload MAC")]
    BadResponsePayloadMac,

    #[fail(display = "Missing response hash attribute")]
    MissingResponseHash,

    #[fail(display = "{}", _0)]
    Crypto(#[fail(cause)] CryptoError),
}

impl From<CryptoError> for ClientError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::UnsupportedDigest(_) => ClientError::UnknownAlgorithm,
            e => ClientError::Crypto(e),
        }
    }
}

/// Failures raised while verifying requests, bewits and messages, each mapping onto an HTTP
/// status: `BadRequest` is 400, `Unauthorized` is 401 and `Internal` is 500.
#[derive(Fail, Debug, Clone, PartialEq)]
pub enum ServerError {
    /// The request is malformed; the client must fix it before retrying.
    #[fail(display = "Bad request: {}", _0)]
    BadRequest(String),

    /// Authentication failed.  `attributes` are extra `WWW-Authenticate` attributes, such as the
    /// `ts`/`tsm` pair sent with a stale timestamp.
    #[fail(display = "Unauthorized: {}", message)]
    Unauthorized {
        message: String,
        attributes: Vec<(String, String)>,
    },

    /// The application supplied malformed credentials, or one of its callbacks failed.
    #[fail(display = "Internal error: {}", _0)]
    Internal(String),
}

impl ServerError {
    pub(crate) fn bad_request<S: Into<String>>(message: S) -> Self {
        ServerError::BadRequest(message.into())
    }

    pub(crate) fn unauthorized<S: Into<String>>(message: S) -> Self {
        ServerError::Unauthorized {
            message: message.into(),
            attributes: vec![],
        }
    }

    /// The bare error message, without the kind prefix used by `Display`.
    pub fn message(&self) -> &str {
        match self {
            ServerError::BadRequest(m) | ServerError::Internal(m) => m,
            ServerError::Unauthorized { message, .. } => message,
        }
    }

    /// The HTTP status code a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::BadRequest(_) => 400,
            ServerError::Unauthorized { .. } => 401,
            ServerError::Internal(_) => 500,
        }
    }

    pub fn www_authenticate_attributes(&self) -> &[(String, String)] {
        match self {
            ServerError::Unauthorized { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Render the value of the `WWW-Authenticate` header for an `Unauthorized` error, e.g.
    /// `Hawk ts="1362346425", tsm="...", error="Stale timestamp"`.  Other kinds carry no
    /// challenge and return `None`.
    pub fn www_authenticate_header(&self) -> Option<String> {
        let (message, attributes) = match self {
            ServerError::Unauthorized {
                message,
                attributes,
            } => (message, attributes),
            _ => return None,
        };

        let mut parts: Vec<String> = attributes
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect();
        if !message.is_empty() {
            parts.push(format!("error=\"{}\"", message));
        }

        if parts.is_empty() {
            Some("Hawk".to_string())
        } else {
            Some(format!("Hawk {}", parts.join(", ")))
        }
    }
}

impl From<CryptoError> for ServerError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::UnsupportedDigest(_) => ServerError::Internal("Unknown algorithm".into()),
            e => ServerError::Internal(e.to_string()),
        }
    }
}

/// Structural problems with a bewit token.
#[derive(Fail, Debug, PartialEq)]
pub enum InvalidBewit {
    #[fail(display = "Invalid bewit encoding")]
    Encoding,
    #[fail(display = "Invalid bewit structure")]
    Structure,
    #[fail(display = "Missing bewit attributes")]
    MissingAttributes,
}

impl From<InvalidBewit> for ServerError {
    fn from(e: InvalidBewit) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}
