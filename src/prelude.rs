//! Convenient re-exports for common usage.
//!
//! ```rust
//! use turnlink::prelude::*;
//! ```

// Protocol entry points
pub use crate::protocol::{ProtocolConfig, SyncProtocol};

// Core trait and fundamental enums
pub use crate::{GameSpec, GameStatus, LegacyDeltaPolicy, Role};

// State and participant types
pub use crate::state::{GameId, GameState, Participant, ParticipantId, Players};

// Wire artifacts
pub use crate::delta::{Delta, TurnMove};
pub use crate::envelope::Target;
pub use crate::token::{Token, TokenKind};

// Opaque digests
pub use crate::checksum::Checksum;
pub use crate::tag::{Secret, Tag};

// Error handling
pub use crate::error::{DecompressReason, SyncError};

// Store collaborator contract
pub use crate::store::{MemoryStore, StateStore};
