//! Session tokens
//!
//! A token is the base64 form of a small JSON identity record:
//! `{"account":..,"cdKey":..,"loginTime":<unix ms>}`. Nothing is stored
//! server-side; whoever holds the cookie holds the session.
//!
//! The token is NOT tamper-evident. Anyone can mint a token for any account,
//! so it is only as good as the cookie flags and the transport protecting it.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard alphabet, padding optional on the way in.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The authenticated principal of a session.
///
/// `issued_at` has millisecond precision, the resolution the token carries,
/// so an identity survives an encode/decode round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identity {
    account: String,
    #[serde(rename = "cdKey")]
    cd_key: String,
    #[serde(rename = "loginTime", with = "chrono::serde::ts_milliseconds")]
    issued_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(account: impl Into<String>, cd_key: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            account: account.into(),
            cd_key: cd_key.into(),
            issued_at: issued_at.trunc_subsecs(3),
        }
    }

    /// Identity issued at the current time.
    pub fn issue(account: impl Into<String>, cd_key: impl Into<String>) -> Self {
        Self::new(account, cd_key, Utc::now())
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Secondary key of the account row (`tbl_user.CdKey`).
    pub fn cd_key(&self) -> &str {
        &self.cd_key
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Unix milliseconds, as carried in the token.
    pub fn login_time_ms(&self) -> i64 {
        self.issued_at.timestamp_millis()
    }
}

/// Opaque session token as carried by the cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// Tokens are bearer credentials; keep them out of debug output.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(<{} bytes>)", self.0.len())
    }
}

/// Encodes identities into tokens and back.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionCodec;

impl SessionCodec {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, identity: &Identity) -> Token {
        // Serializing a struct of strings and an integer cannot fail.
        let json = serde_json::to_vec(identity).unwrap_or_default();
        Token(TOKEN_ENGINE.encode(json))
    }

    /// Exact inverse of [`encode`](Self::encode). Anything that is not a
    /// well-formed token gives `None`; this never panics on client input.
    pub fn decode(&self, token: &str) -> Option<Identity> {
        let bytes = TOKEN_ENGINE.decode(token.trim()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}
