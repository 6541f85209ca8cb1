//! 52-card deck with a uniform Fisher-Yates shuffle behind a CSPRNG bound.

use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng};

use super::{Card, Rank, Suit};

/// Ordered sequence of not-yet-dealt cards. The shuffle permutation depends
/// only on the RNG handed in, so a seeded run of a hand is replayable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// The full 52-card deck in suit-major order.
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(52);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    /// A deck with a fixed order, for replaying known hands.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// A freshly shuffled deck. The `CryptoRng` bound keeps non-crypto
    /// sources out at compile time; fairness depends on it.
    pub fn shuffled<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle(rng);
        deck
    }

    pub fn shuffle<R: Rng + CryptoRng>(&mut self, rng: &mut R) {
        // SliceRandom::shuffle is the uniform Fisher-Yates walk.
        self.cards.shuffle(rng);
    }

    /// Remove and return the first `n` cards, or `None` when fewer remain.
    pub fn draw(&mut self, n: usize) -> Option<Vec<Card>> {
        if self.cards.len() < n {
            return None;
        }
        Some(self.cards.drain(..n).collect())
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}
