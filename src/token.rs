//! Typed URL-fragment tokens.
//!
//! A token travels as a URL fragment: `#s=<body>` for a full-state snapshot,
//! `#d=<body>` for a turn delta. The single-letter marker is the type
//! discriminator that routes a received fragment to the right decoder before
//! anything is decompressed.

use std::fmt;

use crate::error::DecompressReason;
use crate::error::SyncError;

/// Soft ceiling for rendered fragment length. Browsers commonly start
/// misbehaving around 2000-character URLs; exceeding this is logged, not
/// rejected, since the receiving side may tolerate more.
pub const URL_LENGTH_BUDGET: usize = 2000;

/// Which of the two wire encodings a token carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A complete game state, used to (re)establish a shared baseline.
    Snapshot,
    /// A single turn's authenticated delta.
    Delta,
}

impl TokenKind {
    /// The fragment marker for this kind.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            TokenKind::Snapshot => "s",
            TokenKind::Delta => "d",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Snapshot => write!(f, "snapshot"),
            TokenKind::Delta => write!(f, "delta"),
        }
    }
}

/// A one-shot, write-once/read-once wire artifact: a kind marker plus a
/// URL-safe compressed body.
///
/// `Display` renders the fragment form (`#s=...` / `#d=...`); [`Token::parse`]
/// reverses it. Once decoded and applied, a token is discarded — persistence
/// of the resulting state is the store collaborator's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    body: String,
}

impl Token {
    /// Assembles a token from a kind and an already-packed body.
    #[must_use]
    pub fn new(kind: TokenKind, body: String) -> Self {
        let token = Self { kind, body };
        let rendered_len = token.to_string().len();
        if rendered_len > URL_LENGTH_BUDGET {
            tracing::warn!(
                len = rendered_len,
                budget = URL_LENGTH_BUDGET,
                kind = %kind,
                "token exceeds the URL length budget"
            );
        }
        token
    }

    /// Parses a URL fragment (with or without the leading `#`) into a token.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::DecompressionFailure`] when the fragment has no
    /// `marker=body` structure or the marker is unknown.
    pub fn parse(fragment: &str) -> Result<Self, SyncError> {
        let trimmed = fragment.strip_prefix('#').unwrap_or(fragment);
        let (marker, body) = trimmed
            .split_once('=')
            .ok_or(DecompressReason::MissingMarker)?;

        let kind = match marker {
            "s" => TokenKind::Snapshot,
            "d" => TokenKind::Delta,
            other => {
                return Err(DecompressReason::UnknownMarker {
                    found: other.to_string(),
                }
                .into())
            }
        };

        Ok(Self {
            kind,
            body: body.to_string(),
        })
    }

    /// The wire encoding this token carries.
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The packed, URL-safe body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Checks the token against the kind a decoder expects.
    pub(crate) fn expect_kind(&self, expected: TokenKind) -> Result<(), SyncError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(DecompressReason::WrongKind {
                expected,
                found: self.kind,
            }
            .into())
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}={}", self.kind.marker(), self.body)
    }
}
