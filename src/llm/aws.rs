//! AWS credentials and Signature Version 4 request signing.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use sha2::{Digest, Sha256};

use super::LlmError;

type HmacSha256 = Hmac<Sha256>;

/// Everything except the RFC 3986 unreserved characters
const URI_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Same as [`URI_ENCODE`] but keeps path separators
const PATH_ENCODE: &AsciiSet = &URI_ENCODE.remove(b'/');

/// Encode a single URL path segment (model ids contain `:`)
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, URI_ENCODE).to_string()
}

#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AwsCredentials {
    pub fn new(access_key_id: String, secret_access_key: String, session_token: Option<String>) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            session_token,
        }
    }

    /// Read the standard `AWS_*` environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| LlmError::Credentials("AWS_ACCESS_KEY_ID is not set".to_string()))?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| LlmError::Credentials("AWS_SECRET_ACCESS_KEY is not set".to_string()))?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok().filter(|t| !t.is_empty());

        Ok(Self::new(access_key_id, secret_access_key, session_token))
    }
}

/// Signs requests for a single AWS service in a single region
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: AwsCredentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(credentials: AwsCredentials, region: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Compute the headers to attach to a request.
    ///
    /// `headers` are extra headers (besides `host` and `x-amz-date`) that are
    /// sent with the request and must be covered by the signature. The
    /// returned list contains `x-amz-date`, the optional
    /// `x-amz-security-token` and `authorization`.
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &[(&str, &str)],
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Vec<(String, String)> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let mut signed: Vec<(String, String)> = headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
            .collect();
        signed.push(("host".to_string(), host_header(url)));
        signed.push(("x-amz-date".to_string(), amz_date.clone()));
        if let Some(token) = &self.credentials.session_token {
            signed.push(("x-amz-security-token".to_string(), token.clone()));
        }
        signed.sort_by(|a, b| a.0.cmp(&b.0));

        let canonical_headers: String = signed
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value))
            .collect();
        let signed_headers = signed
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method,
            canonical_uri(url),
            canonical_query(url),
            canonical_headers,
            signed_headers,
            hex::encode(Sha256::digest(payload)),
        );
        tracing::trace!("canonical request: {}", canonical_request);

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes())),
        );

        let signing_key = self.signing_key(&date);
        let signature = hex::encode(hmac(&signing_key, string_to_sign.as_bytes()));

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.credentials.access_key_id, scope, signed_headers, signature
        );

        let mut out = vec![("x-amz-date".to_string(), amz_date)];
        if let Some(token) = &self.credentials.session_token {
            out.push(("x-amz-security-token".to_string(), token.clone()));
        }
        out.push(("authorization".to_string(), authorization));
        out
    }

    fn signing_key(&self, date: &str) -> Vec<u8> {
        let secret = format!("AWS4{}", self.credentials.secret_access_key);
        let k_date = hmac(secret.as_bytes(), date.as_bytes());
        let k_region = hmac(&k_date, self.region.as_bytes());
        let k_service = hmac(&k_region, self.service.as_bytes());
        hmac(&k_service, b"aws4_request")
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

// Non-S3 services expect every path segment encoded twice; the URL path is
// already encoded once.
fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        return "/".to_string();
    }
    utf8_percent_encode(path, PATH_ENCODE).to_string()
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            (
                utf8_percent_encode(&k, URI_ENCODE).to_string(),
                utf8_percent_encode(&v, URI_ENCODE).to_string(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn example_signer(session_token: Option<String>) -> SigV4Signer {
        let credentials = AwsCredentials::new(
            "AKIDEXAMPLE".to_string(),
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            session_token,
        );
        SigV4Signer::new(credentials, "us-east-1", "service")
    }

    #[test]
    fn test_get_vanilla_vector() {
        let signer = example_signer(None);
        let url = Url::parse("https://example.amazonaws.com/").unwrap();
        let now = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();

        let headers = signer.sign("GET", &url, &[], b"", now);

        assert_eq!(headers[0], ("x-amz-date".to_string(), "20150830T123600Z".to_string()));
        assert_eq!(
            headers[1].1,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
    }

    #[test]
    fn test_session_token_is_signed() {
        let signer = example_signer(Some("token".to_string()));
        let url = Url::parse("https://example.amazonaws.com/").unwrap();
        let now = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();

        let headers = signer.sign("GET", &url, &[("Content-Type", "application/json")], b"", now);

        assert_eq!(headers[1], ("x-amz-security-token".to_string(), "token".to_string()));
        assert!(headers[2]
            .1
            .contains("SignedHeaders=content-type;host;x-amz-date;x-amz-security-token"));
    }

    #[test]
    fn test_model_id_path_is_double_encoded() {
        let segment = encode_path_segment("anthropic.claude-3-sonnet-20240229-v1:0");
        assert_eq!(segment, "anthropic.claude-3-sonnet-20240229-v1%3A0");

        let url = Url::parse(&format!("https://bedrock-runtime.us-east-1.amazonaws.com/model/{}/converse", segment)).unwrap();
        assert_eq!(
            canonical_uri(&url),
            "/model/anthropic.claude-3-sonnet-20240229-v1%253A0/converse"
        );
    }

    #[test]
    fn test_host_header_keeps_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8080/retrieveAndGenerate").unwrap();
        assert_eq!(host_header(&url), "127.0.0.1:8080");
    }
}
