//! Legacy charset bridge
//!
//! Byte-level transcoding between the UTF-8 strings used at the web boundary
//! and the legacy charset the datastore speaks (GBK unless configured
//! otherwise). Both directions are total: characters outside the legacy
//! repertoire take the encoder's substitution, and an internal failure hands
//! the input back unchanged instead of failing the caller.
//!
//! The charset is injected at construction, so two bridges for two different
//! datastores can live side by side.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use encoding_rs::Encoding;

/// How a transcoding call produced its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every character mapped one-to-one.
    Exact,
    /// At least one character had no legacy mapping and was substituted
    /// (encoding_rs writes a `&#NNNN;` numeric character reference).
    Substituted,
    /// Transcoding failed; the input was passed through unchanged.
    Fallback,
}

/// A transcoded value together with its [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded<T> {
    pub value: T,
    pub outcome: Outcome,
}

/// Raw bytes in the legacy charset, exactly as stored in or sent to the datastore.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct LegacyBytes(Vec<u8>);

impl LegacyBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for LegacyBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for LegacyBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for LegacyBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for LegacyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LegacyBytes([")?;
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", b)?;
        }
        f.write_str("])")
    }
}

/// Snapshot of the bridge's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BridgeStats {
    pub substituted: u64,
    pub fallbacks: u64,
}

#[derive(Debug, Default)]
struct Counters {
    substituted: AtomicU64,
    fallbacks: AtomicU64,
}

/// Stateless transcoder between UTF-8 and one legacy charset.
///
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct CharsetBridge {
    encoding: &'static Encoding,
    counters: Arc<Counters>,
}

impl CharsetBridge {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Build a bridge from a WHATWG charset label (`"gbk"`, `"gb2312"`, ...).
    pub fn for_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes()).map(Self::new)
    }

    pub fn gbk() -> Self {
        Self::new(encoding_rs::GBK)
    }

    /// Canonical name of the legacy charset.
    pub fn charset(&self) -> &'static str {
        self.encoding.name()
    }

    /// UTF-8 text to legacy bytes. Never fails.
    pub fn to_legacy(&self, text: &str) -> LegacyBytes {
        self.encode(text).value
    }

    /// Legacy bytes to UTF-8 text. Never fails.
    pub fn to_unicode(&self, bytes: &[u8]) -> String {
        self.decode(bytes).value
    }

    /// Like [`to_legacy`](Self::to_legacy) but reports the outcome.
    pub fn encode(&self, text: &str) -> Transcoded<LegacyBytes> {
        // Encodings that encoding_rs cannot write (UTF-16, replacement) would
        // silently emit UTF-8 instead.
        if self.encoding.output_encoding() != self.encoding {
            return self.fallback(LegacyBytes(text.as_bytes().to_vec()), "encode");
        }

        let (bytes, _, unmappable) = self.encoding.encode(text);
        let value = LegacyBytes(bytes.into_owned());
        if unmappable {
            self.counters.substituted.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("[charset] [substituted] charset={}", self.encoding.name());
            Transcoded { value, outcome: Outcome::Substituted }
        } else {
            Transcoded { value, outcome: Outcome::Exact }
        }
    }

    /// Like [`to_unicode`](Self::to_unicode) but reports the outcome.
    ///
    /// Malformed input falls back to the bytes unchanged: if they already
    /// are valid UTF-8 they are returned as that string, otherwise each byte
    /// is carried as the code point of the same value (see [`carrier_bytes`]).
    pub fn decode(&self, bytes: &[u8]) -> Transcoded<String> {
        match self
            .encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
        {
            Some(text) => Transcoded {
                value: text.into_owned(),
                outcome: Outcome::Exact,
            },
            None => {
                let value = match std::str::from_utf8(bytes) {
                    Ok(text) => text.to_owned(),
                    Err(_) => latin1_carrier(bytes),
                };
                self.fallback(value, "decode")
            }
        }
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            substituted: self.counters.substituted.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
        }
    }

    fn fallback<T>(&self, value: T, direction: &'static str) -> Transcoded<T> {
        self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            "[charset] [fallback] direction={} charset={}",
            direction,
            self.encoding.name()
        );
        Transcoded { value, outcome: Outcome::Fallback }
    }
}

/// Carry raw bytes through a string: byte `b` becomes `char::from(b)`.
pub fn latin1_carrier(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Exact inverse of [`latin1_carrier`]. `None` if any char is above U+00FF.
pub fn carrier_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(c).ok()).collect()
}
