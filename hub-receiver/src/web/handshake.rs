//! Subscription handshake validation.
//!
//! Before delivering events the platform issues
//! `GET <webhook>?hub.mode=subscribe&hub.verify_token=..&hub.challenge=..`
//! and expects the challenge echoed back when the token matches.

use subtle::ConstantTimeEq;
use thiserror::Error;

/// The only mode accepted by the handshake.
pub const SUBSCRIBE_MODE: &str = "subscribe";

const MODE_PARAM: &str = "hub.mode";
const VERIFY_TOKEN_PARAM: &str = "hub.verify_token";
const CHALLENGE_PARAM: &str = "hub.challenge";

/// Handshake query parameters. Absent parameters are empty strings.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HubQuery {
    pub mode: String,
    pub verify_token: String,
    pub challenge: String,
}

impl HubQuery {
    /// Parse a raw query string. A repeated parameter keeps its first value.
    pub fn parse(query: &str) -> Self {
        let (mut mode, mut verify_token, mut challenge) = (None, None, None);

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                MODE_PARAM => &mut mode,
                VERIFY_TOKEN_PARAM => &mut verify_token,
                CHALLENGE_PARAM => &mut challenge,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        HubQuery {
            mode: mode.unwrap_or_default(),
            verify_token: verify_token.unwrap_or_default(),
            challenge: challenge.unwrap_or_default(),
        }
    }
}

/// The handshake failed. Deliberately carries no detail about which check.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("subscription handshake rejected")]
pub struct HandshakeRejected;

/// Accept the handshake only for `mode == "subscribe"` with the exact expected token.
pub fn validate_handshake(
    mode: &str,
    token: &str,
    expected_token: &str,
) -> Result<(), HandshakeRejected> {
    let mode_ok = mode == SUBSCRIBE_MODE;
    let token_ok: bool = token.as_bytes().ct_eq(expected_token.as_bytes()).into();

    if mode_ok && token_ok {
        Ok(())
    } else {
        Err(HandshakeRejected)
    }
}
