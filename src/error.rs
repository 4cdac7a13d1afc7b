//! Error types for the synchronization protocol.

use std::error::Error;
use std::fmt;
use std::fmt::Display;

use crate::checksum::Checksum;
use crate::token::TokenKind;

/// This enum contains all error messages this library can return. Most API
/// functions will generally return a [`Result<T, SyncError>`].
///
/// The variants map one-to-one onto the protocol's failure taxonomy: a token
/// that cannot be unpacked, a payload with the wrong shape, an authenticity
/// failure, the two flavors of checksum disagreement, a legacy token the
/// active game variant refuses to decode, and a move the rule engine rejects.
///
/// None of these are recovered from internally; the expected remediation
/// (usually: request a fresh full-state token from the other party) is a
/// caller-level decision.
///
/// [`Result<T, SyncError>`]: std::result::Result
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyncError {
    /// The token could not be unpacked back into structured data.
    DecompressionFailure {
        /// The structured reason for the unpack failure.
        reason: DecompressReason,
    },
    /// The decoded payload does not match the expected shape.
    SchemaViolation {
        /// A description of what failed to deserialize.
        context: String,
    },
    /// The delta's authenticity tag does not match its contents. The delta
    /// was not produced by a holder of the shared secret, or was altered in
    /// transit. It must be discarded unapplied.
    TamperDetected,
    /// The delta's previous-state checksum does not match the locally held
    /// state. The two parties' local copies have diverged; this is not
    /// tampering. The caller should request a fresh full-state token rather
    /// than retry.
    StateMismatch {
        /// The checksum the delta expected the local state to have.
        expected: Checksum,
        /// The checksum the local state actually has.
        actual: Checksum,
    },
    /// Applying the delta's move locally produced a state whose checksum
    /// differs from the one the mover declared. Either the mover's own state
    /// construction is buggy, or a secret-holder sent malformed data.
    ApplicationFailure {
        /// The post-move checksum the mover declared.
        declared: Checksum,
        /// The checksum computed from actually applying the move.
        computed: Checksum,
    },
    /// The token uses the oldest wire shape (bare payload, no envelope) and
    /// the active game variant's policy rejects that shape for deltas.
    UnsupportedLegacyFormat,
    /// The rule engine rejected the move (occupied cell, out of range, out of
    /// sequence, game already finished).
    RuleViolation {
        /// Why the move was rejected.
        context: String,
    },
    /// Serializing data for hashing, signing, or encoding failed.
    Serialization {
        /// A description of what failed to serialize.
        context: String,
    },
}

impl SyncError {
    /// Creates a [`SyncError::SchemaViolation`] with the given context.
    pub fn schema(context: impl Into<String>) -> Self {
        Self::SchemaViolation {
            context: context.into(),
        }
    }

    /// Creates a [`SyncError::RuleViolation`] with the given context.
    pub fn rule(context: impl Into<String>) -> Self {
        Self::RuleViolation {
            context: context.into(),
        }
    }

    /// Creates a [`SyncError::Serialization`] with the given context.
    pub fn serialization(context: impl Into<String>) -> Self {
        Self::Serialization {
            context: context.into(),
        }
    }
}

impl From<DecompressReason> for SyncError {
    fn from(reason: DecompressReason) -> Self {
        Self::DecompressionFailure { reason }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::DecompressionFailure { reason } => {
                write!(f, "token unreadable: {}", reason)
            }
            SyncError::SchemaViolation { context } => {
                write!(f, "decoded payload has an invalid shape: {}", context)
            }
            SyncError::TamperDetected => {
                write!(
                    f,
                    "delta authenticity tag mismatch, discarding the delta unapplied"
                )
            }
            SyncError::StateMismatch { expected, actual } => {
                write!(
                    f,
                    "local state diverged from the delta's starting point (expected checksum {}, local is {})",
                    expected, actual
                )
            }
            SyncError::ApplicationFailure { declared, computed } => {
                write!(
                    f,
                    "applying the move yielded checksum {} but the mover declared {}",
                    computed, declared
                )
            }
            SyncError::UnsupportedLegacyFormat => {
                write!(f, "bare legacy delta tokens are not supported by this game")
            }
            SyncError::RuleViolation { context } => {
                write!(f, "move rejected by the rules: {}", context)
            }
            SyncError::Serialization { context } => {
                write!(f, "serialization error: {}", context)
            }
        }
    }
}

impl Error for SyncError {}

/// Structured reasons for a [`SyncError::DecompressionFailure`].
///
/// Using structured data instead of strings lets callers (and tests) inspect
/// exactly which stage of unpacking rejected the token.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecompressReason {
    /// The fragment carried no `s=` or `d=` marker.
    MissingMarker,
    /// The fragment marker is not one this library produces.
    UnknownMarker {
        /// The marker that was found.
        found: String,
    },
    /// A token of one kind was handed to the other kind's decoder.
    WrongKind {
        /// The kind the decoder expected.
        expected: TokenKind,
        /// The kind the token actually carries.
        found: TokenKind,
    },
    /// The token body is not valid URL-safe base64.
    InvalidBase64,
    /// The compressed payload is corrupt and cannot be decompressed.
    CorruptPayload,
    /// The decompressed payload exceeds the configured size guard.
    OversizedPayload {
        /// The configured maximum decompressed size in bytes.
        limit: usize,
    },
    /// The decompressed bytes are not structured data.
    MalformedJson,
}

impl Display for DecompressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecompressReason::MissingMarker => write!(f, "fragment has no token marker"),
            DecompressReason::UnknownMarker { found } => {
                write!(f, "unknown token marker `{}`", found)
            }
            DecompressReason::WrongKind { expected, found } => {
                write!(f, "expected a {} token, got a {} token", expected, found)
            }
            DecompressReason::InvalidBase64 => write!(f, "token body is not valid base64"),
            DecompressReason::CorruptPayload => write!(f, "compressed payload is corrupt"),
            DecompressReason::OversizedPayload { limit } => {
                write!(f, "decompressed payload exceeds the {} byte limit", limit)
            }
            DecompressReason::MalformedJson => {
                write!(f, "decompressed payload is not structured data")
            }
        }
    }
}
