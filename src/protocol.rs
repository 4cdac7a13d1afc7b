//! The per-game protocol facade.
//!
//! [`SyncProtocol`] bundles the shared secret and the decoding limits with
//! the generic engine and exposes the operations an embedding application
//! calls: checksum a state, produce a turn (move + delta), encode and decode
//! both token kinds, and apply a received delta. One instance per game
//! variant; the variant is the type parameter.

use std::marker::PhantomData;

use crate::apply;
use crate::checksum::Checksum;
use crate::delta;
use crate::delta::Delta;
use crate::delta::TurnMove;
use crate::envelope::Target;
use crate::error::SyncError;
use crate::snapshot;
use crate::state::checksum_of_parts;
use crate::state::GameState;
use crate::tag::Secret;
use crate::token::Token;
use crate::GameSpec;
use crate::GameStatus;

/// Default decompressed-payload guard: generous for any realistic state,
/// small enough that a hostile token cannot balloon memory.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 256 * 1024;

/// Configuration for a [`SyncProtocol`].
///
/// The secret is deliberately a required constructor argument: it comes from
/// the embedding application's configuration at process start and is never a
/// literal inside this crate.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// The shared secret both parties hold.
    pub secret: Secret,
    /// Upper bound on a token's decompressed payload size in bytes.
    pub max_payload_len: usize,
}

impl ProtocolConfig {
    /// Builds a config with the given secret and default limits.
    #[must_use]
    pub fn new(secret: Secret) -> Self {
        Self {
            secret,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

/// The state-synchronization protocol, specialized to one game variant.
pub struct SyncProtocol<G: GameSpec> {
    config: ProtocolConfig,
    _game: PhantomData<G>,
}

impl<G: GameSpec> SyncProtocol<G> {
    /// Creates a protocol instance from external configuration.
    #[must_use]
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            _game: PhantomData,
        }
    }

    /// Recomputes the checksum `state` should carry.
    pub fn calculate_checksum(&self, state: &GameState<G>) -> Result<Checksum, SyncError> {
        state.calculate_checksum()
    }

    /// Plays one turn as the mover: applies `action` through the rule engine,
    /// builds the resulting state with a fresh checksum and status, and signs
    /// the delta describing the transition.
    ///
    /// The acting role is the state's current-turn role; the protocol is
    /// strictly alternating.
    pub fn advance(
        &self,
        state: &GameState<G>,
        action: G::Move,
    ) -> Result<(GameState<G>, Delta<G>), SyncError> {
        if state.status != GameStatus::InProgress {
            return Err(SyncError::rule("game is already finished"));
        }

        let role = state.current_role();
        let board = G::apply_move(&state.board, role, &action)?;
        let status = apply::next_status::<G>(&board);
        // A decoded state can carry any turn value its checksum happens to
        // cover; an exhausted counter must fail, not wrap or panic.
        let turn = state
            .turn
            .checked_add(1)
            .ok_or_else(|| SyncError::rule("turn counter exhausted"))?;
        let checksum =
            checksum_of_parts::<G>(&state.game_id, turn, &state.players, &status, &board)?;

        let next = GameState {
            game_id: state.game_id.clone(),
            turn,
            players: state.players.clone(),
            status,
            board,
            checksum,
        };

        let mv = TurnMove {
            role,
            turn,
            action,
        };
        let delta = delta::create_delta(&self.config.secret, state, &next, mv)?;
        Ok((next, delta))
    }

    /// Assembles and signs a delta for an externally constructed transition.
    /// [`advance`](Self::advance) is the usual entry point; this exists for
    /// embedders that run the rule engine themselves.
    pub fn create_delta(
        &self,
        prev: &GameState<G>,
        next: &GameState<G>,
        mv: TurnMove<G>,
    ) -> Result<Delta<G>, SyncError> {
        delta::create_delta(&self.config.secret, prev, next, mv)
    }

    /// Encodes a delta into a `#d=` token for `target`.
    pub fn encode_delta(&self, delta: &Delta<G>, target: &Target) -> Result<Token, SyncError> {
        delta::encode_delta(delta, target)
    }

    /// Decodes a `#d=` token into a delta and its target.
    pub fn decode_delta(&self, token: &Token) -> Result<(Delta<G>, Target), SyncError> {
        delta::decode_delta(token, self.config.max_payload_len)
    }

    /// Verifies a received delta against the local state and produces the
    /// next state. See [`apply_delta`](crate::apply::apply_delta) for the
    /// ordered checks and their failure modes.
    pub fn apply_delta(
        &self,
        local: &GameState<G>,
        delta: &Delta<G>,
    ) -> Result<GameState<G>, SyncError> {
        apply::apply_delta(&self.config.secret, local, delta)
    }

    /// Encodes a complete state into a `#s=` token for `target`.
    pub fn encode_full_state(
        &self,
        state: &GameState<G>,
        target: &Target,
    ) -> Result<Token, SyncError> {
        snapshot::encode_full_state(state, target)
    }

    /// Decodes a `#s=` token into a state and its target. Remember to call
    /// [`GameState::verify_checksum`] before trusting the result.
    pub fn decode_full_state(&self, token: &Token) -> Result<(GameState<G>, Target), SyncError> {
        snapshot::decode_full_state(token, self.config.max_payload_len)
    }
}
