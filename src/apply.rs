//! Applying a received delta to the locally held state.
//!
//! Three ordered checks, each a distinct failure mode, each short-circuiting
//! the rest:
//!
//! 1. **Authenticity** — recompute the tag over the delta's non-tag fields
//!    with the shared secret. Mismatch is [`SyncError::TamperDetected`] and
//!    the delta is discarded unapplied.
//! 2. **Continuity** — the local state's checksum must equal the delta's
//!    `prev_checksum`. Mismatch is [`SyncError::StateMismatch`]: the parties
//!    have diverged (or this delta was already applied); the remedy is a
//!    fresh snapshot, not a retry.
//! 3. **Consistency** — apply the move through the rule engine, rebuild the
//!    candidate state, and digest it. A result that differs from the mover's
//!    declared `new_checksum` is [`SyncError::ApplicationFailure`]: the
//!    mover's own declared outcome was internally inconsistent.
//!
//! Only when all three pass is the next state returned, with the mover's
//! declared checksum adopted as the carried value — the two copies are then
//! verified byte-identical.

use crate::delta::signed_bytes;
use crate::delta::Delta;
use crate::error::SyncError;
use crate::state::checksum_of_parts;
use crate::state::GameState;
use crate::tag;
use crate::tag::Secret;
use crate::GameSpec;
use crate::GameStatus;

/// Verifies `delta` against `local` and produces the next state.
///
/// Sequencing belongs to the rule check: a delta whose move names the wrong
/// role or turn for the local state is a [`SyncError::RuleViolation`] even
/// when its tag and previous checksum hold (a secret-holder can produce such
/// a delta; a third party cannot).
pub fn apply_delta<G: GameSpec>(
    secret: &Secret,
    local: &GameState<G>,
    delta: &Delta<G>,
) -> Result<GameState<G>, SyncError> {
    // Check 1: authenticity.
    let message = signed_bytes::<G>(
        &delta.game_id,
        &delta.mv,
        &delta.prev_checksum,
        &delta.new_checksum,
    )?;
    if !tag::verify(secret, &message, &delta.tag) {
        return Err(SyncError::TamperDetected);
    }

    // Check 2: continuity with the local copy.
    let local_checksum = local.calculate_checksum()?;
    if local_checksum != delta.prev_checksum {
        return Err(SyncError::StateMismatch {
            expected: delta.prev_checksum.clone(),
            actual: local_checksum,
        });
    }

    // Check 3: the declared result must match what actually happens.
    if local.status != GameStatus::InProgress {
        return Err(SyncError::rule("game is already finished"));
    }
    if delta.mv.role != local.current_role() {
        return Err(SyncError::rule(format!(
            "move out of sequence: {:?} moved but it is {:?}'s turn",
            delta.mv.role,
            local.current_role()
        )));
    }
    let Some(turn) = local.turn.checked_add(1) else {
        return Err(SyncError::rule("turn counter exhausted"));
    };
    if delta.mv.turn != turn {
        return Err(SyncError::rule(format!(
            "move out of sequence: produces turn {} but local turn is {}",
            delta.mv.turn, local.turn
        )));
    }

    let board = G::apply_move(&local.board, delta.mv.role, &delta.mv.action)?;
    let status = next_status::<G>(&board);
    let computed =
        checksum_of_parts::<G>(&local.game_id, turn, &local.players, &status, &board)?;

    if computed != delta.new_checksum {
        return Err(SyncError::ApplicationFailure {
            declared: delta.new_checksum.clone(),
            computed,
        });
    }

    Ok(GameState {
        game_id: local.game_id.clone(),
        turn,
        players: local.players.clone(),
        status,
        board,
        // The declared checksum just compared equal to the recomputed one;
        // adopt it rather than digesting a second time.
        checksum: delta.new_checksum.clone(),
    })
}

/// Status of a board after a move, per the rule engine's win/draw detection.
pub(crate) fn next_status<G: GameSpec>(board: &G::Board) -> GameStatus {
    if let Some(winner) = G::winner(board) {
        GameStatus::Won(winner)
    } else if G::is_draw(board) {
        GameStatus::Drawn
    } else {
        GameStatus::InProgress
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::checksum::Checksum;
    use crate::delta::create_delta;
    use crate::delta::TurnMove;
    use crate::games::chain::AppendSymbol;
    use crate::games::chain::ChainGame;
    use crate::state::GameId;
    use crate::state::Participant;
    use crate::tag::Tag;
    use crate::Role;

    fn secret() -> Secret {
        Secret::new(*b"apply-test-secret")
    }

    fn base_state() -> GameState<ChainGame> {
        GameState::<ChainGame>::new(GameId::new("g-apply"), Participant::new("p1", "A"))
            .unwrap()
            .with_guest(Participant::new("p2", "B"))
            .unwrap()
    }

    fn valid_delta(prev: &GameState<ChainGame>) -> (GameState<ChainGame>, Delta<ChainGame>) {
        let mut next = prev.clone();
        next.turn = prev.turn + 1;
        next.board.symbols.push('q');
        next.checksum = next.calculate_checksum().unwrap();
        let mv = TurnMove {
            role: prev.current_role(),
            turn: next.turn,
            action: AppendSymbol { symbol: 'q' },
        };
        let delta = create_delta(&secret(), prev, &next, mv).unwrap();
        (next, delta)
    }

    #[test]
    fn valid_delta_applies_cleanly() {
        let prev = base_state();
        let (expected_next, delta) = valid_delta(&prev);

        let next = apply_delta(&secret(), &prev, &delta).unwrap();
        assert_eq!(next, expected_next);
        assert_eq!(next.board.symbols, vec!['q']);
        assert!(next.verify_checksum().unwrap());
    }

    #[test]
    fn tampered_tag_is_rejected_first() {
        let prev = base_state();
        let (_, mut delta) = valid_delta(&prev);
        delta.tag = Tag::from_raw("00".repeat(32));

        assert_eq!(
            apply_delta(&secret(), &prev, &delta).unwrap_err(),
            SyncError::TamperDetected
        );
    }

    #[test]
    fn tampered_move_invalidates_the_tag() {
        let prev = base_state();
        let (_, mut delta) = valid_delta(&prev);
        // The tag still matches the original fields; altering the move must
        // trip the authenticity check, not a later one.
        delta.mv.action = AppendSymbol { symbol: 'z' };

        assert_eq!(
            apply_delta(&secret(), &prev, &delta).unwrap_err(),
            SyncError::TamperDetected
        );
    }

    #[test]
    fn diverged_local_state_is_a_state_mismatch() {
        let prev = base_state();
        let (_, delta) = valid_delta(&prev);

        let mut diverged = prev.clone();
        diverged.board.symbols.push('w');
        diverged.turn = 1;
        diverged.checksum = diverged.calculate_checksum().unwrap();

        assert!(matches!(
            apply_delta(&secret(), &diverged, &delta).unwrap_err(),
            SyncError::StateMismatch { .. }
        ));
    }

    #[test]
    fn reapplying_a_consumed_delta_is_a_state_mismatch() {
        let prev = base_state();
        let (_, delta) = valid_delta(&prev);
        let next = apply_delta(&secret(), &prev, &delta).unwrap();

        // The local checksum has advanced; the same delta no longer applies.
        assert!(matches!(
            apply_delta(&secret(), &next, &delta).unwrap_err(),
            SyncError::StateMismatch { .. }
        ));
    }

    #[test]
    fn wrong_declared_checksum_is_an_application_failure() {
        let prev = base_state();

        // A correctly signed delta whose declared result does not match what
        // applying the move produces: sign it over a bogus new checksum.
        let mv = TurnMove::<ChainGame> {
            role: Role::Host,
            turn: 1,
            action: AppendSymbol { symbol: 'q' },
        };
        let bogus = Checksum::from_raw("ab".repeat(32));
        let message =
            signed_bytes::<ChainGame>(&prev.game_id, &mv, &prev.checksum, &bogus).unwrap();
        let delta = Delta {
            game_id: prev.game_id.clone(),
            mv,
            prev_checksum: prev.checksum.clone(),
            new_checksum: bogus,
            tag: crate::tag::sign(&secret(), &message).unwrap(),
        };

        assert!(matches!(
            apply_delta(&secret(), &prev, &delta).unwrap_err(),
            SyncError::ApplicationFailure { .. }
        ));
    }

    #[test]
    fn an_exhausted_turn_counter_is_a_rule_violation() {
        let mut local = base_state();
        local.turn = u32::MAX;
        local.checksum = local.calculate_checksum().unwrap();
        assert!(local.verify_checksum().unwrap());

        // Correctly signed and baseline-matched against the saturated state,
        // so only the turn arithmetic can reject it. It must do so as an
        // error, not a wrap or an overflow panic.
        let mv = TurnMove::<ChainGame> {
            role: local.current_role(),
            turn: 0,
            action: AppendSymbol { symbol: 'q' },
        };
        let declared = Checksum::from_raw("cd".repeat(32));
        let message =
            signed_bytes::<ChainGame>(&local.game_id, &mv, &local.checksum, &declared).unwrap();
        let delta = Delta {
            game_id: local.game_id.clone(),
            mv,
            prev_checksum: local.checksum.clone(),
            new_checksum: declared,
            tag: crate::tag::sign(&secret(), &message).unwrap(),
        };

        assert!(matches!(
            apply_delta(&secret(), &local, &delta).unwrap_err(),
            SyncError::RuleViolation { .. }
        ));
    }

    #[test]
    fn out_of_sequence_role_is_a_rule_violation() {
        let prev = base_state();
        let mut next = prev.clone();
        next.turn = 1;
        next.board.symbols.push('q');
        next.checksum = next.calculate_checksum().unwrap();
        // Guest claims the move although it is the host's turn.
        let mv = TurnMove {
            role: Role::Guest,
            turn: 1,
            action: AppendSymbol { symbol: 'q' },
        };
        let delta = create_delta(&secret(), &prev, &next, mv).unwrap();

        assert!(matches!(
            apply_delta(&secret(), &prev, &delta).unwrap_err(),
            SyncError::RuleViolation { .. }
        ));
    }
}
