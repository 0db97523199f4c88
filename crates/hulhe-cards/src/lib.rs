//! Card, suit, street, and suit-isomorphic canonicalization types for the
//! HU-LHE solver.
//!
//! The solver's core never inspects a card's identity beyond what it needs
//! to build a [`HoleCards::canonical_token`] / [`Board::canonical_token`] or
//! to hand seven cards to a [`HandEvaluator`]. Deck enumeration and a
//! precomputed isomorphism table are not provided here; a caller that wants
//! full-deck enumeration composes it out of [`Rank::all`] x [`Suit::all`].

mod board;
mod card;
mod evaluator;
mod hole;
mod rank;
mod street;
mod suit;

pub use board::Board;
pub use board::BoardTexture;
pub use board::SuitTexture;
pub use card::Card;
pub use evaluator::HandEvaluator;
pub use hole::HoleCards;
pub use rank::Rank;
pub use street::Street;
pub use suit::Suit;
