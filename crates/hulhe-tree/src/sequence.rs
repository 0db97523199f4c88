use hulhe_core::Chips;

use crate::action::{legal_actions, resolve_action, Action, ActionOutcome};
use crate::node::Player;

/// How a one-street betting sequence ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceEnd {
    Fold,
    /// The street's betting round closed without a fold; the tree builder
    /// either starts the next street or, on the river, marks a showdown.
    NextStreet,
}

/// One legal, complete one-street action sequence (spec.md §3).
#[derive(Debug, Clone)]
pub struct BetSequence {
    pub actions: Vec<Action>,
    pub invested: [Chips; 2],
    pub end: SequenceEnd,
}

impl BetSequence {
    pub fn final_pot(&self) -> Chips {
        self.invested[0] + self.invested[1]
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.end, SequenceEnd::Fold)
    }
}

/// Enumerate every legal one-street betting sequence from a starting state.
///
/// `allow_fold_when_not_facing` and `entry_cost` exist only for the preflop
/// street's first action: the small blind, though nominally "not facing a
/// bet", may still fold, and its opening call ("completing" to the big
/// blind) costs `entry_cost` rather than the street's normal bet size. Every
/// other street passes `allow_fold_when_not_facing = false, entry_cost = 0`.
pub fn enumerate_sequences(
    invested: [Chips; 2],
    facing_bet: bool,
    raises_this_street: usize,
    to_act: Player,
    cap: usize,
    bet_size: Chips,
    allow_fold_when_not_facing: bool,
    entry_cost: Chips,
) -> Vec<BetSequence> {
    let mut out = Vec::new();
    let mut acc = Vec::new();
    step(
        invested,
        facing_bet,
        raises_this_street,
        to_act,
        cap,
        bet_size,
        allow_fold_when_not_facing,
        entry_cost,
        &mut acc,
        &mut out,
    );
    out
}

#[allow(clippy::too_many_arguments)]
fn step(
    invested: [Chips; 2],
    facing_bet: bool,
    raises_this_street: usize,
    to_act: Player,
    cap: usize,
    bet_size: Chips,
    allow_fold_when_not_facing: bool,
    entry_cost: Chips,
    acc: &mut Vec<Action>,
    out: &mut Vec<BetSequence>,
) {
    let is_street_root = acc.is_empty();
    let actions = if is_street_root && !facing_bet && allow_fold_when_not_facing {
        vec![Action::Fold, Action::CheckCall, Action::Raise]
    } else {
        legal_actions(facing_bet, raises_this_street, cap)
    };

    for action in actions {
        let mut invested = invested;
        let new_facing_bet;
        let new_raises_this_street;
        let closes;

        match resolve_action(
            action,
            facing_bet,
            raises_this_street,
            is_street_root,
            bet_size,
            entry_cost,
        ) {
            ActionOutcome::Fold => {
                acc.push(action);
                out.push(BetSequence {
                    actions: acc.clone(),
                    invested,
                    end: SequenceEnd::Fold,
                });
                acc.pop();
                continue;
            }
            ActionOutcome::Continue {
                cost,
                facing_bet: f,
                raises_this_street: r,
            } => {
                invested[to_act.index()] += cost;
                new_facing_bet = f;
                new_raises_this_street = r;
                closes = false;
            }
            ActionOutcome::ClosesStreet { cost } => {
                invested[to_act.index()] += cost;
                new_facing_bet = false;
                new_raises_this_street = raises_this_street;
                closes = true;
            }
        }

        let raises_this_street = new_raises_this_street;
        acc.push(action);
        if closes {
            out.push(BetSequence {
                actions: acc.clone(),
                invested,
                end: SequenceEnd::NextStreet,
            });
        } else {
            step(
                invested,
                new_facing_bet,
                raises_this_street,
                to_act.opponent(),
                cap,
                bet_size,
                allow_fold_when_not_facing,
                entry_cost,
                acc,
                out,
            );
        }
        acc.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflop_sequence_count_in_expected_range() {
        // SB=1, BB=2, cap=4: spec.md §4.1's sanity check is [15, 35].
        let sequences = enumerate_sequences([1, 2], false, 0, Player::P0, 4, 2, true, 1);
        assert!(
            (15..=35).contains(&sequences.len()),
            "expected 15..=35 preflop sequences, got {}",
            sequences.len()
        );
    }

    #[test]
    fn sb_fold_is_available_and_loses_the_small_blind() {
        let sequences = enumerate_sequences([1, 2], false, 0, Player::P0, 4, 2, true, 1);
        let fold = sequences
            .iter()
            .find(|s| s.actions == vec![Action::Fold])
            .expect("SB fold sequence must exist");
        assert_eq!(fold.invested, [1, 2]);
        assert!(fold.is_terminal());
    }

    #[test]
    fn limp_check_closes_the_preflop_round() {
        let sequences = enumerate_sequences([1, 2], false, 0, Player::P0, 4, 2, true, 1);
        let limp = sequences
            .iter()
            .find(|s| s.actions == vec![Action::CheckCall, Action::CheckCall])
            .expect("limp-check sequence must exist");
        assert_eq!(limp.invested, [2, 2]);
        assert_eq!(limp.end, SequenceEnd::NextStreet);
    }

    #[test]
    fn postflop_sequence_counts_match_across_streets() {
        let flop = enumerate_sequences([0, 0], false, 0, Player::P1, 4, 1, false, 0);
        let turn = enumerate_sequences([0, 0], false, 0, Player::P1, 4, 2, false, 0);
        assert_eq!(flop.len(), turn.len());
    }
}
