//! The chain variant: players take turns appending one symbol to a shared
//! chain. Cooperative — there is no winner; the game draws when the chain
//! reaches its cap.
//!
//! This is the older variant and bare (envelope-less) delta tokens for it
//! exist in the wild, so its legacy policy is to infer the target from the
//! declared mover.

use serde::Deserialize;
use serde::Serialize;

use crate::error::SyncError;
use crate::GameSpec;
use crate::LegacyDeltaPolicy;
use crate::Role;

/// Maximum chain length; reaching it ends the game as drawn.
pub const CHAIN_CAP: usize = 64;

/// Marker type for the chain variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainGame;

/// The shared symbol chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainBoard {
    /// Appended symbols, oldest first.
    pub symbols: Vec<char>,
}

/// Appends one symbol to the end of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendSymbol {
    /// The symbol to append.
    pub symbol: char,
}

impl GameSpec for ChainGame {
    type Move = AppendSymbol;
    type Board = ChainBoard;

    const KIND: &'static str = "chain";
    const LEGACY_DELTA_POLICY: LegacyDeltaPolicy = LegacyDeltaPolicy::InferTarget;

    fn apply_move(
        board: &Self::Board,
        _role: Role,
        action: &Self::Move,
    ) -> Result<Self::Board, SyncError> {
        if board.symbols.len() >= CHAIN_CAP {
            return Err(SyncError::rule("chain is already at its cap"));
        }
        let mut next = board.clone();
        next.symbols.push(action.symbol);
        Ok(next)
    }

    fn winner(_board: &Self::Board) -> Option<Role> {
        None
    }

    fn is_draw(board: &Self::Board) -> bool {
        board.symbols.len() >= CHAIN_CAP
    }
}
