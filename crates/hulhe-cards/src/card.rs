use std::fmt::{Display, Formatter, Result};

use crate::rank::Rank;
use crate::suit::Suit;

/// One playing card: a (rank, suit) pair.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub const fn rank(&self) -> Rank {
        self.rank
    }

    pub const fn suit(&self) -> Suit {
        self.suit
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl hulhe_core::Arbitrary for Card {
    fn random() -> Self {
        use hulhe_core::Arbitrary;
        Self {
            rank: Rank::random(),
            suit: Suit::random(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_rank_then_suit() {
        let card = Card::new(Rank::Ace, Suit::Spades);
        assert_eq!(card.to_string(), "As");
    }
}
