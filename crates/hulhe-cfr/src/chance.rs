use hulhe_cards::{Board, Card, Rank, Suit};
use hulhe_core::Probability;
use rand::seq::SliceRandom;
use rand::Rng;

/// One possible chance outcome: the cards it reveals and its prior
/// probability among sibling outcomes at the same chance node.
#[derive(Debug, Clone)]
pub struct ChanceOutcome {
    pub cards: Vec<Card>,
    pub prior: Probability,
}

/// Enumerates the legal next-street card reveals given what has already
/// been dealt. Deck management and suit-isomorphism precomputation live
/// outside this crate; this is the minimal boundary the traversal engine
/// needs from that collaborator.
///
/// [`FullDeckChance`] below is the obvious composition of
/// `Rank::all() x Suit::all()` the `hulhe-cards` docs point callers at; a
/// production deployment would swap in a precomputed isomorphism-reduced
/// provider behind the same trait.
pub trait ChanceProvider {
    fn outcomes(&self, n_cards: usize, dead: &[Card]) -> Vec<ChanceOutcome>;
}

/// Reference [`ChanceProvider`]: every `n_cards`-combination of the
/// standard 52-card deck not already dealt, each equally likely.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullDeckChance;

impl ChanceProvider for FullDeckChance {
    fn outcomes(&self, n_cards: usize, dead: &[Card]) -> Vec<ChanceOutcome> {
        let available: Vec<Card> = full_deck().into_iter().filter(|c| !dead.contains(c)).collect();
        let combos = combinations(&available, n_cards);
        let prior = 1.0 / combos.len().max(1) as Probability;
        combos
            .into_iter()
            .map(|cards| ChanceOutcome { cards, prior })
            .collect()
    }
}

fn full_deck() -> Vec<Card> {
    Rank::all()
        .into_iter()
        .flat_map(|r| Suit::all().into_iter().map(move |s| Card::new(r, s)))
        .collect()
}

fn combinations(items: &[Card], k: usize) -> Vec<Vec<Card>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    if items.len() < k {
        return Vec::new();
    }
    let mut out = Vec::new();
    for (i, &item) in items.iter().enumerate() {
        for mut rest in combinations(&items[i + 1..], k - 1) {
            rest.insert(0, item);
            out.push(rest);
        }
    }
    out
}

/// Dealt cards so far, carried down a traversal path so showdown resolution
/// and chance enumeration know what is already accounted for.
#[derive(Debug, Clone, Default)]
pub struct Deal {
    pub hole: [Vec<Card>; 2],
    pub board: Board,
}

impl Deal {
    pub fn dead_cards(&self) -> Vec<Card> {
        let mut dead: Vec<Card> = self.board.cards().to_vec();
        dead.extend_from_slice(&self.hole[0]);
        dead.extend_from_slice(&self.hole[1]);
        dead
    }
}

/// Shuffle a fresh deck and deal two hole cards to each player. Used by the
/// single-threaded trainer to vary the dealt hands iteration to iteration;
/// kept separate from [`ChanceProvider`] since hole cards, unlike board
/// cards, are never branched over inside a single traversal.
pub fn deal_hole_cards(rng: &mut impl Rng) -> Deal {
    let mut deck = full_deck();
    deck.shuffle(rng);
    Deal {
        hole: [vec![deck[0], deck[1]], vec![deck[2], deck[3]]],
        board: Board::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn full_deck_flop_has_c_52_3_outcomes() {
        let provider = FullDeckChance;
        let outcomes = provider.outcomes(3, &[]);
        assert_eq!(outcomes.len(), 22_100); // C(52, 3)
    }

    #[test]
    fn priors_sum_to_one() {
        let provider = FullDeckChance;
        let outcomes = provider.outcomes(1, &[]);
        let total: Probability = outcomes.iter().map(|o| o.prior).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn dead_cards_are_excluded() {
        let provider = FullDeckChance;
        let dead = vec![Card::new(Rank::Ace, Suit::Spades)];
        let outcomes = provider.outcomes(1, &dead);
        assert!(outcomes.iter().all(|o| !o.cards.contains(&dead[0])));
    }

    #[test]
    fn dealt_hole_cards_never_collide() {
        let mut rng = SmallRng::seed_from_u64(1);
        let deal = deal_hole_cards(&mut rng);
        assert_ne!(deal.hole[0], deal.hole[1]);
        let mut all = deal.hole[0].clone();
        all.extend(deal.hole[1].clone());
        all.sort_by_key(|c| (c.rank() as u8, c.suit() as u8));
        all.dedup();
        assert_eq!(all.len(), 4);
    }
}
