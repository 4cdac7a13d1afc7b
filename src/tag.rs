//! Keyed integrity tags over turn deltas.
//!
//! The tag is the protocol's sole authenticity boundary: only holders of the
//! shared secret can produce a tag that verifies, so a valid tag proves the
//! delta came from the other party (or from yourself). It is **not**
//! encryption — delta contents remain readable by anyone who obtains the
//! token — and it cannot stop a secret-holder from fabricating an alternate
//! history; it only rules out third-party tampering.
//!
//! Signing covers the delta's canonical bytes, produced by the same
//! [`canonical_json`](crate::checksum::canonical_json) convention the checksum
//! engine uses, so signer and verifier always agree on the byte-exact input.
//!
//! The secret is supplied by the embedding application through
//! [`ProtocolConfig`](crate::ProtocolConfig) at construction time. This crate
//! never generates, stores, or embeds one.

use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;
use std::fmt;

use crate::error::SyncError;

type HmacSha256 = Hmac<Sha256>;

/// The shared secret both parties hold.
///
/// Any byte string works as a key; HMAC imposes no length requirement.
/// `Debug` is deliberately redacted so the secret cannot leak through logs.
#[derive(Clone)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wraps raw secret bytes supplied by the embedding application's
    /// configuration.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// A keyed message-authentication code over a delta's canonical bytes.
///
/// Opaque hex string, equality-comparable only. Verification goes through
/// [`verify`], which compares in constant time; never compare tags with `==`
/// on an untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// The tag as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps a raw tag string. Only useful for tests and for reconstructing
    /// values received over the wire.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signs canonical delta bytes with the shared secret.
///
/// Returns the HMAC-SHA256 tag as lowercase hex. The message must be the
/// delta's fields *except* the tag itself, canonicalized exactly as the
/// receiver will canonicalize them.
pub fn sign(secret: &Secret, message: &[u8]) -> Result<Tag, SyncError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SyncError::serialization(format!("mac key rejected: {e}")))?;
    mac.update(message);
    Ok(Tag(hex::encode(mac.finalize().into_bytes())))
}

/// Verifies a tag against canonical delta bytes and the shared secret.
///
/// Returns `true` iff the tag was produced by [`sign`] over byte-identical
/// input with the same secret. The comparison is constant-time. A tag that is
/// not valid hex, or a key the MAC rejects, verifies as `false` rather than
/// erroring — from the caller's perspective both are simply "not authentic".
#[must_use]
pub fn verify(secret: &Secret, message: &[u8], tag: &Tag) -> bool {
    let Ok(tag_bytes) = hex::decode(tag.as_str()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(&tag_bytes).is_ok()
}

// =============================================================================
// Unit Tests
// =============================================================================


// =============================================================================
// Property-Based Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: sign then verify succeeds for any message and secret.
        #[test]
        fn prop_sign_verify_roundtrip(
            key in any::<Vec<u8>>(),
            message in any::<Vec<u8>>(),
        ) {
            let secret = Secret::new(key);
            let tag = sign(&secret, &message).unwrap();
            prop_assert!(verify(&secret, &message, &tag));
        }

        /// Property: flipping any single bit of the message invalidates the
        /// tag.
        #[test]
        fn prop_bit_flip_invalidates(
            message in proptest::collection::vec(any::<u8>(), 1..128),
            byte_index in any::<proptest::sample::Index>(),
            bit in 0u8..8,
        ) {
            let secret = Secret::new(*b"prop-secret");
            let tag = sign(&secret, &message).unwrap();

            let mut flipped = message.clone();
            let index = byte_index.index(flipped.len());
            flipped[index] ^= 1 << bit;

            prop_assert!(!verify(&secret, &flipped, &tag));
        }

        /// Property: tags from different secrets never cross-verify.
        #[test]
        fn prop_secrets_do_not_cross_verify(
            key_a in proptest::collection::vec(any::<u8>(), 1..64),
            key_b in proptest::collection::vec(any::<u8>(), 1..64),
            message in any::<Vec<u8>>(),
        ) {
            prop_assume!(key_a != key_b);
            let tag = sign(&Secret::new(key_a), &message).unwrap();
            prop_assert!(!verify(&Secret::new(key_b), &message, &tag));
        }
    }
}
