use crate::artifacts::Artifacts;
use crate::b64;
use crate::credentials::Credentials;
use crate::crypto::{self, CryptoError};
use crate::util;
use std::fmt::Write;
use url::Url;

/// The version of the Hawk protocol implemented here; it appears in every normalized string.
pub const HEADER_VERSION: &str = "1";

/// The kinds of MAC computed by Hawk.  The type is bound into the normalized string, so a MAC
/// computed for one purpose never validates for another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MacType {
    Header,
    Response,
    Bewit,
    Message,
}

impl MacType {
    pub fn as_str(self) -> &'static str {
        match self {
            MacType::Header => "header",
            MacType::Response => "response",
            MacType::Bewit => "bewit",
            MacType::Message => "message",
        }
    }
}

/// Build the canonical string that is signed for the given MAC type.
pub fn normalized_string(mac_type: MacType, artifacts: &Artifacts) -> String {
    let mut s = String::new();

    // writing to a String cannot fail
    let _ = write!(
        s,
        "hawk.{}.{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
        HEADER_VERSION,
        mac_type.as_str(),
        artifacts.ts_str(),
        artifacts.nonce,
        artifacts
            .method
            .as_ref()
            .map(|m| m.to_uppercase())
            .unwrap_or_default(),
        normalize_resource(artifacts.resource.as_ref().map(String::as_str).unwrap_or("")),
        artifacts
            .host
            .as_ref()
            .map(|h| h.to_lowercase())
            .unwrap_or_default(),
        artifacts.port.map(|p| p.to_string()).unwrap_or_default(),
        artifacts.hash.as_ref().map(String::as_str).unwrap_or(""),
    );

    if let Some(ext) = artifacts.ext_str() {
        s.push_str(&ext.replace('\\', "\\\\").replace('\n', "\\n"));
    }
    s.push('\n');

    if let Some(ref app) = artifacts.app {
        if !app.is_empty() {
            s.push_str(app);
            s.push('\n');
            s.push_str(artifacts.dlg.as_ref().map(String::as_str).unwrap_or(""));
            s.push('\n');
        }
    }

    s
}

/// Reduce a full URL to its path and (non-empty) query.  Anything already starting with `/`, or
/// not parseable as a URL, is used as-is.
fn normalize_resource(resource: &str) -> String {
    if resource.is_empty() || resource.starts_with('/') {
        return resource.to_string();
    }
    match Url::parse(resource) {
        Ok(url) => match url.query() {
            Some(q) if !q.is_empty() => format!("{}?{}", url.path(), q),
            _ => url.path().to_string(),
        },
        Err(_) => resource.to_string(),
    }
}

/// Compute the base64 MAC of the normalized string, keyed with the credentials.
pub fn calculate_mac(
    mac_type: MacType,
    credentials: &Credentials,
    artifacts: &Artifacts,
) -> Result<String, CryptoError> {
    let normalized = normalized_string(mac_type, artifacts);
    let key = crypto::new_key(credentials.algorithm, &credentials.key)?;
    Ok(b64::encode(&key.sign(normalized.as_bytes())?))
}

/// Compute the MAC of a bare timestamp, used to send the server's clock to the client.
pub fn calculate_ts_mac(ts: u64, credentials: &Credentials) -> Result<String, CryptoError> {
    let normalized = format!("hawk.{}.ts\n{}\n", HEADER_VERSION, ts);
    let key = crypto::new_key(credentials.algorithm, &credentials.key)?;
    Ok(b64::encode(&key.sign(normalized.as_bytes())?))
}

/// The server's current time together with its MAC.
#[derive(Clone, Debug, PartialEq)]
pub struct TimestampMessage {
    pub ts: u64,
    pub tsm: String,
}

/// Produce a signed timestamp, in seconds, that a client can use to correct its clock.
pub fn timestamp_message(
    credentials: &Credentials,
    localtime_offset_msec: i64,
) -> Result<TimestampMessage, CryptoError> {
    let ts = util::now_secs(localtime_offset_msec);
    let tsm = calculate_ts_mac(ts, credentials)?;
    Ok(TimestampMessage { ts, tsm })
}

#[cfg(all(test, any(feature = "use_ring", feature = "use_openssl")))]
mod test {
    use super::*;
    use crate::credentials::DigestAlgorithm;
    use pretty_assertions::assert_eq;

    const KEY: &str = "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn";

    fn base_artifacts() -> Artifacts {
        Artifacts {
            ts: 1357747017,
            nonce: "k3k4j5".to_string(),
            method: Some("GET".to_string()),
            resource: Some("/resource/something".to_string()),
            host: Some("example.com".to_string()),
            port: Some(8080),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalized_string_minimal() {
        assert_eq!(
            normalized_string(MacType::Header, &base_artifacts()),
            "hawk.1.header\n1357747017\nk3k4j5\nGET\n/resource/something\nexample.com\n8080\n\n\n"
        );
    }

    #[test]
    fn test_normalized_string_with_ext_and_hash() {
        let artifacts = Artifacts {
            hash: Some("U4MKKSmiVxk37JCCrAVIjV/OhB3y+NdwoCr6RShbVkE=".to_string()),
            ext: Some("this is some app data".to_string()),
            ..base_artifacts()
        };
        assert_eq!(
            normalized_string(MacType::Header, &artifacts),
            "hawk.1.header\n1357747017\nk3k4j5\nGET\n/resource/something\nexample.com\n8080\n\
             U4MKKSmiVxk37JCCrAVIjV/OhB3y+NdwoCr6RShbVkE=\nthis is some app data\n"
        );
    }

    #[test]
    fn test_normalized_string_ts_text() {
        let artifacts = Artifacts {
            ts_text: Some("01357747017".to_string()),
            ..base_artifacts()
        };
        assert!(normalized_string(MacType::Header, &artifacts)
            .starts_with("hawk.1.header\n01357747017\nk3k4j5\n"));
    }

    #[test]
    fn test_normalized_string_escapes_ext() {
        let artifacts = Artifacts {
            ext: Some("a\\b\nc".to_string()),
            ..base_artifacts()
        };
        assert!(normalized_string(MacType::Header, &artifacts).ends_with("\n\na\\\\b\\nc\n"));
    }

    #[test]
    fn test_normalized_string_app_dlg() {
        let artifacts = Artifacts {
            app: Some("app1".to_string()),
            dlg: Some("dlg1".to_string()),
            ..base_artifacts()
        };
        assert!(normalized_string(MacType::Header, &artifacts).ends_with("8080\n\n\napp1\ndlg1\n"));

        let artifacts = Artifacts {
            app: Some("app1".to_string()),
            ..base_artifacts()
        };
        assert!(normalized_string(MacType::Header, &artifacts).ends_with("8080\n\n\napp1\n\n"));

        // dlg alone is ignored
        let artifacts = Artifacts {
            dlg: Some("dlg1".to_string()),
            ..base_artifacts()
        };
        assert!(normalized_string(MacType::Header, &artifacts).ends_with("8080\n\n\n"));
    }

    #[test]
    fn test_normalized_string_case_folding() {
        let artifacts = Artifacts {
            method: Some("get".to_string()),
            host: Some("EXAMPLE.com".to_string()),
            ..base_artifacts()
        };
        assert_eq!(
            normalized_string(MacType::Response, &artifacts),
            "hawk.1.response\n1357747017\nk3k4j5\nGET\n/resource/something\nexample.com\n8080\n\n\n"
        );
    }

    #[test]
    fn test_normalized_string_full_url_resource() {
        let artifacts = Artifacts {
            resource: Some("http://example.com:8080/resource/something?x=1".to_string()),
            ..base_artifacts()
        };
        assert!(normalized_string(MacType::Header, &artifacts)
            .contains("\n/resource/something?x=1\n"));

        let artifacts = Artifacts {
            resource: Some("http://example.com/resource/something?".to_string()),
            ..base_artifacts()
        };
        assert!(normalized_string(MacType::Header, &artifacts).contains("\n/resource/something\n"));
    }

    #[test]
    fn test_normalized_string_message() {
        let artifacts = Artifacts {
            ts: 1353809207,
            nonce: "abc123".to_string(),
            host: Some("example.com".to_string()),
            port: Some(80),
            hash: Some("xyz=".to_string()),
            ..Default::default()
        };
        assert_eq!(
            normalized_string(MacType::Message, &artifacts),
            "hawk.1.message\n1353809207\nabc123\n\n\nexample.com\n80\nxyz=\n\n"
        );
    }

    #[test]
    fn test_calculate_mac_sha256() {
        let credentials = Credentials::new("123", KEY, DigestAlgorithm::Sha256);
        let artifacts = Artifacts {
            ts: 1353788437,
            nonce: "k3j4h2".to_string(),
            method: Some("GET".to_string()),
            resource: Some("/resource/4?filter=a".to_string()),
            host: Some("example.com".to_string()),
            port: Some(8080),
            ext: Some("hello".to_string()),
            ..Default::default()
        };
        assert_eq!(
            calculate_mac(MacType::Header, &credentials, &artifacts).unwrap(),
            "bXx7a7p1h9QYQNZ8x7QhvDQym8ACgab4m3lVSFn4DBw="
        );
    }

    #[test]
    fn test_calculate_mac_sha1() {
        let credentials = Credentials::new("1", KEY, DigestAlgorithm::Sha1);
        let artifacts = Artifacts {
            ts: 1353788437,
            nonce: "k3j4h2".to_string(),
            method: Some("GET".to_string()),
            resource: Some("/resource/4?filter=a".to_string()),
            host: Some("example.com".to_string()),
            port: Some(8080),
            ext: Some("hello".to_string()),
            ..Default::default()
        };
        assert_eq!(
            calculate_mac(MacType::Header, &credentials, &artifacts).unwrap(),
            "zy79QQ5/EYFmQqutVnYb73gAc/U="
        );
    }

    #[test]
    fn test_calculate_ts_mac() {
        let credentials = Credentials::new("123", KEY, DigestAlgorithm::Sha256);
        assert_eq!(
            calculate_ts_mac(1362346425875, &credentials).unwrap(),
            "ScFHLBxFd8NCCLN0Q8bP0uuitXM0Bo3J5IN/47JXWBo="
        );
    }

    #[test]
    fn test_timestamp_message() {
        let credentials = Credentials::new("123", KEY, DigestAlgorithm::Sha256);
        let msg = timestamp_message(&credentials, 0).unwrap();
        let now = util::now_secs(0);
        assert!(msg.ts <= now && msg.ts + 2 >= now);
        assert_eq!(msg.tsm, calculate_ts_mac(msg.ts, &credentials).unwrap());
    }
}
