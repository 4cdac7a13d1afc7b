//! # Turnlink
//!
//! Turnlink is a serverless state-synchronization protocol for two-player
//! turn-based games. There is no server and no network layer: each turn, the
//! mover encodes the resulting game update into a compact, tamper-evident
//! token embedded in a URL fragment, and the other party decodes and applies
//! it locally. The transport is whatever carries the URL — a chat message, an
//! email, a QR code.
//!
//! The protocol rests on three primitives:
//!
//! - **checksums** ([`checksum`]) — every state carries a digest of its
//!   game-relevant content, so the parties can detect divergence between
//!   their local copies;
//! - **integrity tags** ([`tag`]) — every turn delta is authenticated with a
//!   keyed MAC under a shared secret, so a third party cannot forge or alter
//!   a turn;
//! - **URL-safe tokens** ([`compress`], [`token`]) — updates travel as
//!   `#s=...` (full-state snapshot) and `#d=...` (turn delta) fragments,
//!   compressed to stay well inside browser URL limits.
//!
//! A [`SyncProtocol`] instance ties these together for one game variant; the
//! variant itself is a [`GameSpec`] implementation supplying the board type,
//! the move type, and the rule engine. The protocol logic is written once and
//! shared by every variant.
//!
//! ## Example
//!
//! ```
//! use turnlink::games::grid::{GridGame, PlaceAt};
//! use turnlink::{
//!     GameId, GameState, Participant, ProtocolConfig, Secret, SyncProtocol, Target, Token,
//! };
//!
//! # fn main() -> Result<(), turnlink::SyncError> {
//! let protocol = SyncProtocol::<GridGame>::new(ProtocolConfig::new(Secret::new(
//!     *b"secret from your app's config",
//! )));
//!
//! // Host starts a game and plays the first move.
//! let state = GameState::new(GameId::new("game-1"), Participant::new("id-ada", "Ada"))?
//!     .with_guest(Participant::new("id-grace", "Grace"))?;
//! let (next, delta) = protocol.advance(&state, PlaceAt { cell: 4 })?;
//!
//! // The delta travels to Grace as a URL fragment...
//! let target = Target::Identity(next.players.guest.as_ref().map(|g| g.id.clone()).unwrap());
//! let fragment = protocol.encode_delta(&delta, &target)?.to_string();
//!
//! // ...and Grace applies it to her own copy of the state.
//! let token = Token::parse(&fragment)?;
//! let (received, _target) = protocol.decode_delta(&token)?;
//! let grace_next = protocol.apply_delta(&state, &received)?;
//! assert_eq!(grace_next.checksum, next.checksum);
//! # Ok(())
//! # }
//! ```
//!
//! ## What the protocol does and does not guarantee
//!
//! A verified delta was produced by someone holding the shared secret and is
//! self-consistent; a checksum mismatch reliably surfaces divergence. There
//! is no third-party arbiter: a determined secret-holder can fabricate an
//! entire alternate history, and the protocol detects — but cannot prevent —
//! state divergence. Tokens are authenticated, not encrypted.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;

pub mod apply;
pub mod checksum;
pub mod compress;
pub mod delta;
pub mod envelope;
pub mod error;
pub mod games;
pub mod prelude;
pub mod protocol;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod tag;
pub mod token;

pub use checksum::Checksum;
pub use delta::{Delta, TurnMove};
pub use envelope::Target;
pub use error::{DecompressReason, SyncError};
pub use protocol::{ProtocolConfig, SyncProtocol, DEFAULT_MAX_PAYLOAD_LEN};
pub use state::{GameId, GameState, Participant, ParticipantId, Players};
pub use store::{MemoryStore, StateStore};
pub use tag::{Secret, Tag};
pub use token::{Token, TokenKind, URL_LENGTH_BUDGET};

/// Compile-time parameterization of the protocol by a game variant.
///
/// Implementors are typically fieldless marker types (see
/// [`games::chain::ChainGame`] and [`games::grid::GridGame`]) deriving the
/// usual value traits. The protocol treats the board and move as opaque
/// serializable data; the three functions are the rule-engine collaborator:
/// legality, win detection, draw detection.
pub trait GameSpec: 'static + Debug + Clone + PartialEq {
    /// The move payload transmitted between parties. Opaque to the protocol,
    /// which authenticates and sequences it but never inspects it.
    type Move: Clone + Debug + PartialEq + Serialize + DeserializeOwned;

    /// The game-specific board data. `Default` is the empty starting board.
    type Board: Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned;

    /// Short name distinguishing this variant in logs.
    const KIND: &'static str;

    /// How this variant treats bare (envelope-less) legacy delta tokens.
    const LEGACY_DELTA_POLICY: LegacyDeltaPolicy;

    /// Applies a move, returning the new board or a
    /// [`SyncError::RuleViolation`]. Must not mutate the input.
    fn apply_move(
        board: &Self::Board,
        role: Role,
        action: &Self::Move,
    ) -> Result<Self::Board, SyncError>;

    /// The winning role, if the board is won.
    fn winner(board: &Self::Board) -> Option<Role>;

    /// Whether the board is drawn. Only consulted when there is no winner.
    fn is_draw(board: &Self::Board) -> bool;
}

/// The two seats of a game. The host creates the game and moves first; turns
/// then alternate strictly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The participant who created the game.
    Host,
    /// The participant who joined.
    Guest,
}

impl Role {
    /// The other seat.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }

    /// Who moves next after `turn` completed moves. Host moves on even
    /// counts, guest on odd.
    #[must_use]
    pub const fn for_turn(turn: u32) -> Self {
        if turn % 2 == 0 {
            Role::Host
        } else {
            Role::Guest
        }
    }

    /// The wire role number used by legacy envelopes.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Role::Host => 0,
            Role::Guest => 1,
        }
    }

    /// The role for a wire role number, if it is in range.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Role::Host),
            1 => Some(Role::Guest),
            _ => None,
        }
    }
}

/// Whether a game is running or how it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// The game is still being played.
    InProgress,
    /// The game was won by this role.
    Won(Role),
    /// The game ended without a winner.
    Drawn,
}

/// Per-variant policy for bare (oldest-shape) legacy delta tokens.
///
/// The two shipped game variants genuinely disagree here and the divergence
/// is preserved rather than harmonized: the chain variant has bare deltas in
/// the wild and infers their target, the grid variant never shipped them and
/// rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyDeltaPolicy {
    /// Infer the target: the acting role's opponent receives the delta.
    InferTarget,
    /// Refuse with [`SyncError::UnsupportedLegacyFormat`].
    Reject,
}
