//! The game variants that specialize the generic protocol.
//!
//! Each variant is a fieldless marker type implementing
//! [`GameSpec`](crate::GameSpec): it supplies the board and move types, the
//! rule engine (apply/win/draw), and the variant's legacy-token policy. The
//! protocol itself is implemented once; everything game-specific lives here.

pub mod chain;
pub mod grid;
