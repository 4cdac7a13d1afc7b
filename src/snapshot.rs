//! Full-state snapshot codec.
//!
//! A snapshot token carries a complete game state. It is how a game starts
//! (the host sends the initial state to the guest), how a new device gets its
//! baseline, and how the parties recover after a divergence that deltas can
//! no longer bridge.
//!
//! Decoding is deliberately shallow about trust: it validates the *shape* of
//! the state (typed deserialization is the schema validator) but does not
//! re-verify the carried checksum against the content. Call
//! [`GameState::verify_checksum`] before adopting a decoded state as a
//! synchronization baseline.

use crate::checksum;
use crate::compress;
use crate::envelope;
use crate::envelope::Target;
use crate::error::DecompressReason;
use crate::error::SyncError;
use crate::state::GameState;
use crate::token::Token;
use crate::token::TokenKind;
use crate::GameSpec;
use crate::Role;

/// Encodes a complete state into a `#s=` token addressed to `target`.
///
/// No validation beyond what the caller already guarantees: the state must
/// already carry a correct checksum.
pub fn encode_full_state<G: GameSpec>(
    state: &GameState<G>,
    target: &Target,
) -> Result<Token, SyncError> {
    let payload =
        serde_json::to_value(state).map_err(|e| SyncError::serialization(e.to_string()))?;
    let wrapped = envelope::wrap(payload, target);
    let bytes = checksum::canonical_json(&wrapped)?;
    let body = compress::pack(&bytes)?;
    let token = Token::new(TokenKind::Snapshot, body);
    tracing::debug!(len = token.body().len(), game_id = %state.game_id, "encoded snapshot token");
    Ok(token)
}

/// Decodes a `#s=` token back into a state and its target.
///
/// Total over all three historical envelope shapes: a current envelope's target is
/// taken as-is, a legacy role number is translated to the persistent identity
/// recorded in the decoded state for that role, and a bare state's target is
/// inferred as the current-turn role. Where the addressed role's slot is
/// unset (guest not yet joined) the target stays role-based.
pub fn decode_full_state<G: GameSpec>(
    token: &Token,
    max_payload_len: usize,
) -> Result<(GameState<G>, Target), SyncError> {
    token.expect_kind(TokenKind::Snapshot)?;
    let bytes = compress::unpack(token.body(), max_payload_len)?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|_| DecompressReason::MalformedJson)?;

    let resolved = envelope::resolve(value)?;
    tracing::trace!(shape = ?resolved.shape, "resolved snapshot envelope");
    let state: GameState<G> = serde_json::from_value(resolved.payload)
        .map_err(|e| SyncError::schema(format!("game state: {e}")))?;

    let target = match resolved.target {
        Some(Target::Identity(id)) => Target::Identity(id),
        Some(Target::Role(role)) => translate_role(&state, role),
        None => {
            let role = state.current_role();
            tracing::debug!(game_id = %state.game_id, role = ?role, "bare legacy snapshot, inferring current-turn role as target");
            translate_role(&state, role)
        }
    };

    Ok((state, target))
}

/// Translates a role-addressed target to the identity recorded for that role,
/// keeping it role-based when the slot is unset.
fn translate_role<G: GameSpec>(state: &GameState<G>, role: Role) -> Target {
    match state.players.for_role(role) {
        Some(participant) => Target::Identity(participant.id.clone()),
        None => {
            tracing::warn!(game_id = %state.game_id, role = ?role, "no participant recorded for the addressed role, keeping a role target");
            Target::Role(role)
        }
    }
}
