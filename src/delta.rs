//! Turn deltas and the delta codec.
//!
//! A delta is the authenticated description of one turn: "applying this move
//! to the state whose checksum is `prev_checksum` must yield a state whose
//! checksum is `new_checksum`". It is created once by the mover, is
//! immutable, and is consumed exactly once by the receiver's applier —
//! re-application fails because the receiver's local checksum has already
//! advanced past `prev_checksum`.
//!
//! The codec here only wraps and unwraps; the tag must already be present
//! before encoding ([`create_delta`] signs it) and verification happens in
//! the applier, never here.

use serde::Deserialize;
use serde::Serialize;

use crate::checksum;
use crate::checksum::Checksum;
use crate::compress;
use crate::envelope;
use crate::envelope::Target;
use crate::error::DecompressReason;
use crate::error::SyncError;
use crate::state::GameId;
use crate::state::GameState;
use crate::tag;
use crate::tag::Secret;
use crate::tag::Tag;
use crate::token::Token;
use crate::token::TokenKind;
use crate::GameSpec;
use crate::LegacyDeltaPolicy;
use crate::Role;

/// One move, tagged with the acting role and the turn number it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TurnMove<G: GameSpec> {
    /// The role that made the move.
    pub role: Role,
    /// The turn counter value of the state this move produces.
    pub turn: u32,
    /// The game-specific move payload. Opaque to the protocol: it is
    /// authenticated and sequenced here, validated for legality by the rule
    /// engine.
    pub action: G::Move,
}

/// An authenticated single-turn transition between two checksums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Delta<G: GameSpec> {
    /// The game this delta belongs to.
    pub game_id: GameId,
    /// The move, with acting role and produced turn number.
    pub mv: TurnMove<G>,
    /// Checksum of the state the move applies to.
    pub prev_checksum: Checksum,
    /// Checksum the mover declares for the resulting state.
    pub new_checksum: Checksum,
    /// Keyed authenticity tag over all fields above.
    pub tag: Tag,
}

/// Canonical view of a delta's signed fields: everything except the tag, in
/// stable declaration order, canonicalized identically on both sides.
#[derive(Serialize)]
#[serde(bound = "")]
struct SignedFields<'a, G: GameSpec> {
    game_id: &'a GameId,
    mv: &'a TurnMove<G>,
    prev_checksum: &'a Checksum,
    new_checksum: &'a Checksum,
}

/// The canonical bytes a delta's tag covers.
pub(crate) fn signed_bytes<G: GameSpec>(
    game_id: &GameId,
    mv: &TurnMove<G>,
    prev_checksum: &Checksum,
    new_checksum: &Checksum,
) -> Result<Vec<u8>, SyncError> {
    checksum::canonical_json(&SignedFields::<'_, G> {
        game_id,
        mv,
        prev_checksum,
        new_checksum,
    })
}

/// Assembles and signs the delta describing the transition from `prev` to
/// `next` via `mv`.
///
/// Both states must already carry correct checksums (the mover builds `next`
/// itself, typically through [`SyncProtocol::advance`]). The turn numbers are
/// cross-checked so a mis-assembled delta fails at creation rather than at
/// the receiver.
///
/// [`SyncProtocol::advance`]: crate::SyncProtocol::advance
pub fn create_delta<G: GameSpec>(
    secret: &Secret,
    prev: &GameState<G>,
    next: &GameState<G>,
    mv: TurnMove<G>,
) -> Result<Delta<G>, SyncError> {
    if prev.game_id != next.game_id {
        return Err(SyncError::rule("states belong to different games"));
    }
    if prev.turn.checked_add(1) != Some(next.turn) || mv.turn != next.turn {
        return Err(SyncError::rule(format!(
            "delta turn numbers are inconsistent (prev {}, next {}, move {})",
            prev.turn, next.turn, mv.turn
        )));
    }

    let message = signed_bytes::<G>(&prev.game_id, &mv, &prev.checksum, &next.checksum)?;
    let tag = tag::sign(secret, &message)?;

    Ok(Delta {
        game_id: prev.game_id.clone(),
        mv,
        prev_checksum: prev.checksum.clone(),
        new_checksum: next.checksum.clone(),
        tag,
    })
}

/// Encodes a delta into a `#d=` token addressed to `target`.
///
/// The delta's tag must already be present; this function never signs.
pub fn encode_delta<G: GameSpec>(delta: &Delta<G>, target: &Target) -> Result<Token, SyncError> {
    let payload =
        serde_json::to_value(delta).map_err(|e| SyncError::serialization(e.to_string()))?;
    let wrapped = envelope::wrap(payload, target);
    let bytes = checksum::canonical_json(&wrapped)?;
    let body = compress::pack(&bytes)?;
    let token = Token::new(TokenKind::Delta, body);
    tracing::debug!(len = token.body().len(), game_id = %delta.game_id, "encoded delta token");
    Ok(token)
}

/// Decodes a `#d=` token back into a delta and its target.
///
/// Legacy handling is per game variant: a bare (oldest-shape) delta either
/// has its target inferred — the acting role's opponent receives the delta —
/// or is rejected with [`SyncError::UnsupportedLegacyFormat`], according to
/// [`GameSpec::LEGACY_DELTA_POLICY`]. Role-addressed envelopes stay
/// role-addressed: a delta carries no player table to translate with.
pub fn decode_delta<G: GameSpec>(
    token: &Token,
    max_payload_len: usize,
) -> Result<(Delta<G>, Target), SyncError> {
    token.expect_kind(TokenKind::Delta)?;
    let bytes = compress::unpack(token.body(), max_payload_len)?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|_| DecompressReason::MalformedJson)?;

    let resolved = envelope::resolve(value)?;
    tracing::trace!(shape = ?resolved.shape, "resolved delta envelope");
    let delta: Delta<G> = serde_json::from_value(resolved.payload)
        .map_err(|e| SyncError::schema(format!("delta: {e}")))?;

    let target = match resolved.target {
        Some(target) => target,
        None => match G::LEGACY_DELTA_POLICY {
            LegacyDeltaPolicy::InferTarget => {
                let inferred = delta.mv.role.opponent();
                tracing::warn!(
                    game_id = %delta.game_id,
                    target = ?inferred,
                    "bare legacy delta token, inferring target from the mover"
                );
                Target::Role(inferred)
            }
            LegacyDeltaPolicy::Reject => return Err(SyncError::UnsupportedLegacyFormat),
        },
    };

    Ok((delta, target))
}
