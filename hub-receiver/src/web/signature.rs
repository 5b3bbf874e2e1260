//! Webhook payload signature verification.
//!
//! The platform signs the exact raw request body with the app secret and
//! sends the result as `<algorithm>=<hex digest>`, e.g.
//! `X-Hub-Signature-256: sha256=6f1c...`. Legacy deliveries carry
//! `X-Hub-Signature: sha1=...` instead.

use axum::http::HeaderMap;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use tracing::warn;

/// Preferred signature header.
pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";

/// Legacy signature header, consulted when the preferred one is absent.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Pick the signature header value from a request, preferring the SHA-256 one.
pub fn signature_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SIGNATURE_256_HEADER)
        .or_else(|| headers.get(SIGNATURE_HEADER))
        .and_then(|v| v.to_str().ok())
}

/// Verify that `body` was signed with `secret`.
///
/// Returns `false` on a missing or malformed header, an unsupported
/// algorithm, an empty secret, or a digest mismatch. The digest comparison
/// runs in constant time.
pub fn verify_signature(body: &[u8], signature_header: Option<&str>, secret: &[u8]) -> bool {
    let Some(header) = signature_header else {
        warn!("signature_header_missing");
        return false;
    };

    if secret.is_empty() {
        warn!("signature_secret_empty");
        return false;
    }

    let Some((algorithm, digest_hex)) = header.trim().split_once('=') else {
        warn!(header_length = header.len(), "signature_header_malformed");
        return false;
    };

    let expected = match hex::decode(digest_hex) {
        Ok(bytes) => bytes,
        Err(_) => {
            warn!(algorithm = %algorithm, "signature_digest_not_hex");
            return false;
        }
    };

    let valid = match algorithm {
        "sha1" => verify_mac::<HmacSha1>(secret, body, &expected),
        "sha256" => verify_mac::<HmacSha256>(secret, body, &expected),
        "sha512" => verify_mac::<HmacSha512>(secret, body, &expected),
        other => {
            warn!(algorithm = %other, "signature_algorithm_unsupported");
            return false;
        }
    };

    if !valid {
        warn!(
            algorithm = %algorithm,
            digest_length = expected.len(),
            body_length = body.len(),
            "signature_mismatch"
        );
    }

    valid
}

fn verify_mac<M: Mac + KeyInit>(secret: &[u8], body: &[u8], expected: &[u8]) -> bool {
    let mut mac = match <M as KeyInit>::new_from_slice(secret) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(expected).is_ok()
}

/// Compute the `sha256=<hex>` header value for `body`.
#[cfg(test)]
pub(crate) fn sign_sha256(body: &[u8], secret: &[u8]) -> String {
    let mut mac = <HmacSha256 as KeyInit>::new_from_slice(secret).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &[u8] = b"s3cr3t";
    const BODY: &[u8] = br#"{"field":"value"}"#;

    /// HMAC-SHA1 of `BODY` keyed with `SECRET`.
    const BODY_SHA1: &str = "sha1=0170e760d8fd6e965b094d9f0889c20056949372";

    #[test]
    fn test_verify_signature_valid() {
        let header = sign_sha256(BODY, SECRET);
        assert!(verify_signature(BODY, Some(&header), SECRET));
    }

    #[test]
    fn test_verify_signature_sha512() {
        let mut mac = <HmacSha512 as KeyInit>::new_from_slice(SECRET).unwrap();
        mac.update(BODY);
        let header = format!("sha512={}", hex::encode(mac.finalize().into_bytes()));

        assert!(verify_signature(BODY, Some(&header), SECRET));
    }

    #[test]
    fn test_verify_signature_sha1_known_vector() {
        assert!(verify_signature(BODY, Some(BODY_SHA1), SECRET));
        assert!(!verify_signature(BODY, Some(BODY_SHA1), b"other"));
        assert!(!verify_signature(br#"{"field":"other"}"#, Some(BODY_SHA1), SECRET));
    }

    #[test]
    fn test_verify_signature_is_deterministic() {
        let good = sign_sha256(BODY, SECRET);
        let bad = sign_sha256(BODY, b"other");

        for _ in 0..3 {
            assert!(verify_signature(BODY, Some(&good), SECRET));
            assert!(!verify_signature(BODY, Some(&bad), SECRET));
        }
    }

    #[test]
    fn test_verify_signature_rejects_tampered_body() {
        let header = sign_sha256(BODY, SECRET);
        assert!(!verify_signature(br#"{"field":"other"}"#, Some(&header), SECRET));
    }

    #[test]
    fn test_verify_signature_rejects_malformed_headers() {
        let digest = &sign_sha256(BODY, SECRET)["sha256=".len()..];

        assert!(!verify_signature(BODY, None, SECRET));
        assert!(!verify_signature(BODY, Some(""), SECRET));
        assert!(!verify_signature(BODY, Some(digest), SECRET));
        assert!(!verify_signature(BODY, Some("sha256=zzzz"), SECRET));
        assert!(!verify_signature(BODY, Some("sha256=abcd"), SECRET));
        assert!(!verify_signature(BODY, Some(&format!("md5={}", digest)), SECRET));
    }

    #[test]
    fn test_verify_signature_rejects_empty_secret() {
        let header = sign_sha256(BODY, b"");
        assert!(!verify_signature(BODY, Some(&header), b""));
    }

    #[test]
    fn test_signature_header_prefers_sha256() {
        let mut headers = HeaderMap::new();
        assert_eq!(signature_header(&headers), None);

        headers.insert(SIGNATURE_HEADER, HeaderValue::from_static("sha1=legacy"));
        assert_eq!(signature_header(&headers), Some("sha1=legacy"));

        headers.insert(SIGNATURE_256_HEADER, HeaderValue::from_static("sha256=modern"));
        assert_eq!(signature_header(&headers), Some("sha256=modern"));
    }
}
