use hulhe_cards::Street;
use hulhe_tree::{GameNode, Player};

/// Build the canonical infoset id string for `node`:
/// `P{player}|{STREET}|{cardToken?}|{boardToken?}|{bettingHistory}`, with
/// card/board segments omitted entirely when absent.
///
/// `hole_token` and `board_token` are supplied by the caller (the solver
/// core never inspects card identity itself; see `hulhe_cards::HoleCards`
/// and `hulhe_cards::Board` for how those tokens are produced).
pub fn canonical_infoset_id(
    node: &GameNode,
    hole_token: Option<&str>,
    board_token: Option<&str>,
) -> String {
    let player = node
        .to_act
        .unwrap_or(Player::P0)
        .index();
    let street_str = street_token(node.street);
    let mut id = format!("P{player}|{street_str}");
    if let Some(hole) = hole_token {
        id.push('|');
        id.push_str(hole);
    }
    if let Some(board) = board_token {
        id.push_str("|B:");
        id.push_str(board);
    }
    id.push('|');
    id.push_str(&node.history);
    id
}

fn street_token(street: Street) -> &'static str {
    match street {
        Street::Preflop => "PRE",
        Street::Flop => "FLOP",
        Street::Turn => "TURN",
        Street::River => "RIVER",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hulhe_core::GameParams;
    use hulhe_tree::build_game_tree;

    #[test]
    fn id_omits_card_segments_when_absent() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let id = canonical_infoset_id(tree.root(), None, None);
        assert_eq!(id, "P0|PRE|");
    }

    #[test]
    fn id_includes_hole_and_board_tokens_when_present() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let id = canonical_infoset_id(tree.root(), Some("AKs"), Some("QJT"));
        assert_eq!(id, "P0|PRE|AKs|B:QJT|");
    }
}
