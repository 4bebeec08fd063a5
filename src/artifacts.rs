/// The values that go into a Hawk MAC.
///
/// Clients get these back from [`crate::client::header`] and keep them until the response
/// arrives; servers get them back from [`crate::server::authenticate`] and pass them on to
/// [`crate::server::header`].  Absent optional values normalize as empty lines.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Artifacts {
    /// Seconds since the epoch.
    pub ts: u64,
    /// The timestamp exactly as it appeared in a received header.  When set, it is signed in
    /// place of the decimal form of `ts`.
    pub ts_text: Option<String>,
    pub nonce: String,
    pub method: Option<String>,
    /// Path and query of the request, e.g. `/resource/4?filter=a`.
    pub resource: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Base64 payload hash.
    pub hash: Option<String>,
    pub ext: Option<String>,
    pub app: Option<String>,
    pub dlg: Option<String>,
    /// The MAC as sent in the header.  Not part of the normalized string.
    pub mac: Option<String>,
    /// Credentials id as sent in the header.  Not part of the normalized string.
    pub id: Option<String>,
}

impl Artifacts {
    pub(crate) fn ts_str(&self) -> String {
        match self.ts_text {
            Some(ref text) => text.clone(),
            None => self.ts.to_string(),
        }
    }

    /// The non-empty `ext`, if any.
    pub(crate) fn ext_str(&self) -> Option<&str> {
        match self.ext {
            Some(ref e) if !e.is_empty() => Some(e),
            _ => None,
        }
    }
}
