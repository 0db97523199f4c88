/// One betting action. `CheckCall` covers both "check" (not facing a bet)
/// and "call" (facing a bet) since the betting-history alphabet (spec.md §3)
/// does not distinguish them: both write `c`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Action {
    Fold,
    CheckCall,
    Raise,
}

impl Action {
    pub const fn history_char(&self) -> char {
        match self {
            Action::Fold => 'f',
            Action::CheckCall => 'c',
            Action::Raise => 'r',
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.history_char())
    }
}

use hulhe_core::Chips;

/// Chip and control-flow consequence of taking one action, computed once and
/// shared by the sequence enumerator and the tree builder so the two can
/// never disagree about pot accounting or round-closing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Fold,
    /// The street's betting round is still open; play continues.
    Continue {
        cost: Chips,
        facing_bet: bool,
        raises_this_street: usize,
    },
    /// This action closed the betting round (spec.md §4.1 termination
    /// rules (b) and (c), including the preflop limp-check exception).
    ClosesStreet { cost: Chips },
}

/// Resolve one action's chip cost and whether it closes the betting round.
///
/// `is_street_root` and `entry_cost` exist only for the preflop small
/// blind's opening action: nominally "not facing a bet", it may still fold,
/// and its call ("completing" to the big blind) costs `entry_cost` rather
/// than the street's normal bet size. Every other call site passes
/// `entry_cost = 0`.
pub fn resolve_action(
    action: Action,
    facing_bet: bool,
    raises_this_street: usize,
    is_street_root: bool,
    bet_size: Chips,
    entry_cost: Chips,
) -> ActionOutcome {
    match action {
        Action::Fold => ActionOutcome::Fold,
        Action::CheckCall => {
            let cost = if is_street_root && entry_cost != 0 {
                entry_cost
            } else if raises_this_street >= 1 {
                bet_size
            } else {
                0
            };
            if raises_this_street >= 1 || !is_street_root {
                ActionOutcome::ClosesStreet { cost }
            } else {
                ActionOutcome::Continue {
                    cost,
                    facing_bet: false,
                    raises_this_street,
                }
            }
        }
        Action::Raise => {
            let cost = if facing_bet { 2 * bet_size } else { bet_size };
            ActionOutcome::Continue {
                cost,
                facing_bet: true,
                raises_this_street: raises_this_street + 1,
            }
        }
    }
}

/// Valid actions at a decision point, per spec.md §4.1:
/// - facing a bet with raises remaining: fold, call, raise
/// - facing a bet with the raise cap reached: fold, call
/// - not facing a bet: check, raise
pub fn legal_actions(facing_bet: bool, raises_this_street: usize, cap: usize) -> Vec<Action> {
    if facing_bet {
        if raises_this_street < cap {
            vec![Action::Fold, Action::CheckCall, Action::Raise]
        } else {
            vec![Action::Fold, Action::CheckCall]
        }
    } else {
        vec![Action::CheckCall, Action::Raise]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capped_street_drops_raise() {
        let actions = legal_actions(true, 4, 4);
        assert_eq!(actions, vec![Action::Fold, Action::CheckCall]);
    }

    #[test]
    fn not_facing_never_offers_fold() {
        let actions = legal_actions(false, 0, 4);
        assert!(!actions.contains(&Action::Fold));
    }
}
