use crate::b64;
use crate::error::InvalidBewit;
use std::str;
use std::str::FromStr;

/// A Bewit is a piece of data attached to a GET request that functions in place of a Hawk
/// Authentication header.  It contains an id, an expiration time, a MAC, and an optional `ext`
/// value.  These are available using accessor functions.
#[derive(Clone, Debug, PartialEq)]
pub struct Bewit {
    id: String,
    exp: u64,
    mac: String,
    ext: Option<String>,
}

impl Bewit {
    /// Create a new Bewit with the given values.  `exp` is in seconds since the epoch and `mac`
    /// is the base64 bewit MAC.
    ///
    /// See `client::get_bewit` for an easier way to make a Bewit
    pub fn new<S: Into<String>>(id: S, exp: u64, mac: S, ext: Option<S>) -> Bewit {
        Bewit {
            id: id.into(),
            exp,
            mac: mac.into(),
            ext: ext.map(Into::into).filter(|e: &String| !e.is_empty()),
        }
    }

    /// Locate the `bewit` query parameter in a path-and-query URL.  Returns the raw (still
    /// encoded) bewit and the URL with the parameter removed, or `None` if the URL carries no
    /// bewit.  When several are present, the last one is used.
    pub fn strip_from_url(url: &str) -> Option<(&str, String)> {
        const PREFIX: &str = "bewit=";

        if !url.starts_with('/') {
            return None;
        }

        let mut search_end = url.len();
        while let Some(found) = url[..search_end].rfind(PREFIX) {
            search_end = found;

            if found < 2 {
                break;
            }
            let delimiter = url.as_bytes()[found - 1];
            if delimiter != b'?' && delimiter != b'&' {
                continue;
            }

            let value_start = found + PREFIX.len();
            let value_end = url[value_start..]
                .find(|c: char| c == '&' || c == '$')
                .map(|p| value_start + p)
                .unwrap_or_else(|| url.len());
            let rest = &url[value_end..];

            let base = &url[..found - 1];
            if rest.is_empty() {
                return Some((&url[value_start..value_end], base.to_string()));
            }
            if rest.len() > 1 && rest.starts_with('&') {
                return Some((
                    &url[value_start..value_end],
                    format!("{}{}{}", base, delimiter as char, &rest[1..]),
                ));
            }
        }

        None
    }

    /// Generate the fully-encoded string for this Bewit
    pub fn to_str(&self) -> String {
        let raw = format!(
            "{}\\{}\\{}\\{}",
            self.id,
            self.exp,
            self.mac,
            match self.ext {
                Some(ref ext) => ext.as_ref(),
                None => "",
            }
        );

        b64::base64url_encode(&raw)
    }

    /// Get the Bewit's client identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the expiration time of the bewit, in seconds since the epoch
    pub fn exp(&self) -> u64 {
        self.exp
    }

    /// Get the MAC included in the Bewit
    pub fn mac(&self) -> &str {
        &self.mac
    }

    /// Get the Bewit's `ext` field.
    pub fn ext(&self) -> Option<&str> {
        match self.ext {
            Some(ref ext) => Some(ext),
            None => None,
        }
    }
}

const BACKSLASH: u8 = b'\\';

impl FromStr for Bewit {
    type Err = InvalidBewit;
    fn from_str(bewit: &str) -> Result<Bewit, InvalidBewit> {
        let bewit = b64::base64url_decode(bewit).map_err(|_| InvalidBewit::Encoding)?;

        let parts: Vec<&[u8]> = bewit.split(|c| *c == BACKSLASH).collect();
        if parts.len() != 4 {
            return Err(InvalidBewit::Structure);
        }

        let parts: Vec<&str> = parts
            .into_iter()
            .map(str::from_utf8)
            .collect::<Result<_, _>>()
            .map_err(|_| InvalidBewit::Encoding)?;

        let (id, exp, mac, ext) = (parts[0], parts[1], parts[2], parts[3]);
        let exp = u64::from_str(exp).unwrap_or(0);
        if id.is_empty() || exp == 0 || mac.is_empty() {
            return Err(InvalidBewit::MissingAttributes);
        }

        Ok(Bewit::new(id, exp, mac, Some(ext)))
    }
}
