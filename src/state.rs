//! Game state value types.
//!
//! Everything here is a plain value with no shared mutable ownership. A state
//! always carries its own checksum as the trailing field; the invariant is
//! that the checksum equals the digest of the canonical serialization of all
//! the other fields. Any state held locally or decoded from a token that
//! violates this must be treated as corrupt.

use serde::Deserialize;
use serde::Serialize;
use std::fmt;

use crate::checksum;
use crate::checksum::Checksum;
use crate::error::SyncError;
use crate::GameSpec;
use crate::GameStatus;
use crate::Role;

/// Stable, unique identifier of one game instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    /// Wraps an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persistent identity of one participant, stable across games and devices.
/// This is what current-shape routing envelopes address tokens by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wraps an identity string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One participant: persistent identity plus display name.
///
/// Display-name sanitization is the embedding application's job; the protocol
/// treats the name as opaque (it is still game-relevant data and therefore
/// checksummed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Persistent identity.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
}

impl Participant {
    /// Builds a participant from an identity and a display name.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::new(id),
            name: name.into(),
        }
    }
}

/// The role-to-identity mapping for the two participants.
///
/// The host starts the game and is always present; the guest slot stays empty
/// until the second party joins via the first full-state token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    /// The participant who created the game and moves first.
    pub host: Participant,
    /// The second participant, unset until they join.
    pub guest: Option<Participant>,
}

impl Players {
    /// The participant holding `role`, if that slot is filled.
    #[must_use]
    pub fn for_role(&self, role: Role) -> Option<&Participant> {
        match role {
            Role::Host => Some(&self.host),
            Role::Guest => self.guest.as_ref(),
        }
    }

    /// The role held by the participant with `id`, if any.
    #[must_use]
    pub fn role_of(&self, id: &ParticipantId) -> Option<Role> {
        if self.host.id == *id {
            return Some(Role::Host);
        }
        match &self.guest {
            Some(guest) if guest.id == *id => Some(Role::Guest),
            _ => None,
        }
    }
}

/// Canonical view of a state's game-relevant fields, in stable declaration
/// order and explicitly excluding the checksum. This is the exact byte layout
/// the checksum engine digests.
#[derive(Serialize)]
#[serde(bound = "")]
struct CanonicalState<'a, G: GameSpec> {
    game_id: &'a GameId,
    turn: u32,
    players: &'a Players,
    status: &'a GameStatus,
    board: &'a G::Board,
}

/// Computes the checksum a state with these parts must carry.
///
/// Exists separately from [`GameState::calculate_checksum`] so callers can
/// digest a candidate state before constructing it.
pub(crate) fn checksum_of_parts<G: GameSpec>(
    game_id: &GameId,
    turn: u32,
    players: &Players,
    status: &GameStatus,
    board: &G::Board,
) -> Result<Checksum, SyncError> {
    let canonical = checksum::canonical_json(&CanonicalState::<'_, G> {
        game_id,
        turn,
        players,
        status,
        board,
    })?;
    Ok(checksum::digest(&canonical))
}

/// Complete state of one game instance.
///
/// The board type and move semantics come from the [`GameSpec`] parameter;
/// the protocol itself never inspects the board beyond serializing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct GameState<G: GameSpec> {
    /// Stable, unique game instance identifier.
    pub game_id: GameId,
    /// Number of completed moves.
    pub turn: u32,
    /// Role-to-identity mapping.
    pub players: Players,
    /// Whether the game is running, won, or drawn.
    pub status: GameStatus,
    /// Game-specific board data.
    pub board: G::Board,
    /// Digest of every field above, in canonical order. Trailing by
    /// convention; never included in its own input.
    pub checksum: Checksum,
}

impl<G: GameSpec> GameState<G> {
    /// Creates a fresh game with an empty default board, the host as the only
    /// participant, and a correct checksum.
    pub fn new(game_id: GameId, host: Participant) -> Result<Self, SyncError> {
        let players = Players { host, guest: None };
        let status = GameStatus::InProgress;
        let board = G::Board::default();
        let checksum = checksum_of_parts::<G>(&game_id, 0, &players, &status, &board)?;
        Ok(Self {
            game_id,
            turn: 0,
            players,
            status,
            board,
            checksum,
        })
    }

    /// Fills the guest slot and refreshes the checksum.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError::RuleViolation`] if a different guest already
    /// joined.
    pub fn with_guest(mut self, guest: Participant) -> Result<Self, SyncError> {
        if let Some(existing) = &self.players.guest {
            if existing.id != guest.id {
                return Err(SyncError::rule("a different guest already joined"));
            }
        }
        self.players.guest = Some(guest);
        self.checksum = self.calculate_checksum()?;
        Ok(self)
    }

    /// Recomputes the checksum this state should carry from its current
    /// field values.
    pub fn calculate_checksum(&self) -> Result<Checksum, SyncError> {
        checksum_of_parts::<G>(
            &self.game_id,
            self.turn,
            &self.players,
            &self.status,
            &self.board,
        )
    }

    /// Whether the carried checksum matches the state's content.
    ///
    /// Snapshot decoding deliberately does not do this; call it before
    /// trusting a decoded state as a synchronization baseline.
    pub fn verify_checksum(&self) -> Result<bool, SyncError> {
        Ok(self.calculate_checksum()? == self.checksum)
    }

    /// The role whose turn it is to move next.
    #[must_use]
    pub fn current_role(&self) -> Role {
        Role::for_turn(self.turn)
    }
}
