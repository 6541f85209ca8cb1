//! Best-five hand evaluation with a totally ordered packed score.
//!
//! Any 5..=7 cards go in; the best 5-card hand comes out as a category plus
//! a packed base-16 score. `score(a) > score(b)` exactly when hand `a` beats
//! hand `b` under standard hold'em ranking with kickers.

use serde::Serialize;
use thiserror::Error;

use super::{sort_desc, Card, Rank, Suit};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandCategory {
    HighCard = 0,
    Pair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
    /// Ace-high straight flush.
    RoyalFlush = 9,
}

impl HandCategory {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Evaluated hand: category, canonical best five, and the packed score the
/// engine compares at showdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HandRanking {
    pub category: HandCategory,
    pub score: u32,
    pub best_five: [Card; 5],
}

impl HandRanking {
    pub fn beats(&self, other: &HandRanking) -> bool {
        self.score > other.score
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("hand evaluation requires at least five cards, got {0}")]
    TooFewCards(usize),
}

/// Pack (category, five tie-break digits) into one ordered u32. Digits are
/// ranks 0..=14, so each fits a nibble.
fn pack_score(category: HandCategory, digits: [u8; 5]) -> u32 {
    (category.as_u8() as u32) << 20
        | (digits[0] as u32) << 16
        | (digits[1] as u32) << 12
        | (digits[2] as u32) << 8
        | (digits[3] as u32) << 4
        | (digits[4] as u32)
}

/// Rank digits of a canonical 5-card layout, sorted desc.
fn ranks_of(hand: &[Card; 5]) -> [u8; 5] {
    [
        hand[0].rank.value(),
        hand[1].rank.value(),
        hand[2].rank.value(),
        hand[3].rank.value(),
        hand[4].rank.value(),
    ]
}

/// A-2-3-4-5 in desc rank order. The straight's high card is the 5.
fn is_wheel(r: &[u8; 5]) -> bool {
    *r == [14, 5, 4, 3, 2]
}

fn is_run_desc(r: &[u8; 5]) -> bool {
    r[0] == r[1] + 1 && r[1] == r[2] + 1 && r[2] == r[3] + 1 && r[3] == r[4] + 1
}

/// Category-specific tie-break digits from a canonical 5-card hand.
/// Straights collapse to their high card (a wheel's high card is 5);
/// paired categories lead with the group ranks, then kickers.
fn tiebreak_digits(category: HandCategory, hand: &[Card; 5]) -> [u8; 5] {
    let r = ranks_of(hand);
    match category {
        HandCategory::StraightFlush | HandCategory::RoyalFlush | HandCategory::Straight => {
            let high = if is_wheel(&r) { 5 } else { r[0] };
            [high, 0, 0, 0, 0]
        }
        HandCategory::FourOfAKind => [r[0], r[4], 0, 0, 0],
        HandCategory::FullHouse => [r[0], r[3], 0, 0, 0],
        HandCategory::Flush | HandCategory::HighCard => r,
        HandCategory::ThreeOfAKind => [r[0], r[3], r[4], 0, 0],
        HandCategory::TwoPair => [r[0], r[2], r[4], 0, 0],
        HandCategory::Pair => [r[0], r[2], r[3], r[4], 0],
    }
}

/// Classify 5 cards and lay them out canonically: grouped ranks first,
/// kickers desc, straights from the high card down (wheel ends on the ace).
fn classify_five(hand: [Card; 5]) -> (HandCategory, [Card; 5]) {
    let mut s = hand;
    sort_desc(&mut s);

    let mut count_by_rank = [0u8; 15];
    for card in &s {
        count_by_rank[card.rank.value() as usize] += 1;
    }
    let same_suit = s.iter().all(|c| c.suit == s[0].suit);

    let mut uniq: Vec<u8> = s.iter().map(|c| c.rank.value()).collect();
    uniq.dedup();

    let straight_ranks: Option<[u8; 5]> = if uniq.len() == 5 {
        let r = [uniq[0], uniq[1], uniq[2], uniq[3], uniq[4]];
        if is_run_desc(&r) {
            Some(r)
        } else if is_wheel(&r) {
            Some([5, 4, 3, 2, 14])
        } else {
            None
        }
    } else {
        None
    };

    let card_of = |rank: u8, pick_suit: Option<Suit>| -> Card {
        s.iter()
            .filter(|c| c.rank.value() == rank)
            .filter(|c| pick_suit.map_or(true, |suit| c.suit == suit))
            .max_by_key(|c| c.suit)
            .copied()
            .expect("rank present in hand")
    };

    if let Some(run) = straight_ranks {
        if same_suit {
            let suit = s[0].suit;
            let k = std::array::from_fn(|i| card_of(run[i], Some(suit)));
            return (HandCategory::StraightFlush, k);
        }
    }

    if let Some(quad_rank) = (2..=14).rev().find(|&r| count_by_rank[r as usize] == 4) {
        let mut quads: Vec<Card> = s.iter().filter(|c| c.rank.value() == quad_rank).copied().collect();
        let kicker = s
            .iter()
            .find(|c| c.rank.value() != quad_rank)
            .copied()
            .expect("kicker present");
        quads.push(kicker);
        return (
            HandCategory::FourOfAKind,
            [quads[0], quads[1], quads[2], quads[3], quads[4]],
        );
    }

    let trip_rank = (2..=14).rev().find(|&r| count_by_rank[r as usize] == 3);
    if let Some(t) = trip_rank {
        if let Some(p) = (2..=14)
            .rev()
            .find(|&r| r != t && count_by_rank[r as usize] >= 2)
        {
            let trips: Vec<Card> = s.iter().filter(|c| c.rank.value() == t).copied().collect();
            let pair: Vec<Card> = s.iter().filter(|c| c.rank.value() == p).copied().collect();
            return (
                HandCategory::FullHouse,
                [trips[0], trips[1], trips[2], pair[0], pair[1]],
            );
        }
    }

    if same_suit {
        return (HandCategory::Flush, s);
    }

    if let Some(run) = straight_ranks {
        let k = std::array::from_fn(|i| card_of(run[i], None));
        return (HandCategory::Straight, k);
    }

    if let Some(t) = trip_rank {
        let trips: Vec<Card> = s.iter().filter(|c| c.rank.value() == t).copied().collect();
        let kickers: Vec<Card> = s.iter().filter(|c| c.rank.value() != t).copied().collect();
        return (
            HandCategory::ThreeOfAKind,
            [trips[0], trips[1], trips[2], kickers[0], kickers[1]],
        );
    }

    let pair_ranks: Vec<u8> = (2..=14)
        .rev()
        .filter(|&r| count_by_rank[r as usize] == 2)
        .collect();
    if pair_ranks.len() >= 2 {
        let high: Vec<Card> = s
            .iter()
            .filter(|c| c.rank.value() == pair_ranks[0])
            .copied()
            .collect();
        let low: Vec<Card> = s
            .iter()
            .filter(|c| c.rank.value() == pair_ranks[1])
            .copied()
            .collect();
        let kicker = s
            .iter()
            .find(|c| c.rank.value() != pair_ranks[0] && c.rank.value() != pair_ranks[1])
            .copied()
            .expect("kicker present");
        return (
            HandCategory::TwoPair,
            [high[0], high[1], low[0], low[1], kicker],
        );
    }
    if let Some(&p) = pair_ranks.first() {
        let pair: Vec<Card> = s.iter().filter(|c| c.rank.value() == p).copied().collect();
        let kickers: Vec<Card> = s.iter().filter(|c| c.rank.value() != p).copied().collect();
        return (
            HandCategory::Pair,
            [pair[0], pair[1], kickers[0], kickers[1], kickers[2]],
        );
    }

    (HandCategory::HighCard, s)
}

/// Score exactly 5 cards.
pub fn rank_five(hand: [Card; 5]) -> HandRanking {
    let (mut category, canonical) = classify_five(hand);
    if category == HandCategory::StraightFlush && canonical[0].rank == Rank::Ace {
        category = HandCategory::RoyalFlush;
    }
    let digits = tiebreak_digits(category, &canonical);
    HandRanking {
        category,
        score: pack_score(category, digits),
        best_five: canonical,
    }
}

/// Score the best 5-card hand among all C(n,5) subsets of 5..=7 cards.
/// Stable under input permutation: the canonical layout and the packed
/// score depend only on the card set.
pub fn rank_cards(cards: &[Card]) -> Result<HandRanking, EvalError> {
    let n = cards.len();
    if n < 5 {
        return Err(EvalError::TooFewCards(n));
    }
    let mut best: Option<HandRanking> = None;
    for a in 0..n - 4 {
        for b in a + 1..n - 3 {
            for c in b + 1..n - 2 {
                for d in c + 1..n - 1 {
                    for e in d + 1..n {
                        let ranking =
                            rank_five([cards[a], cards[b], cards[c], cards[d], cards[e]]);
                        if best.map_or(true, |cur| ranking.score > cur.score) {
                            best = Some(ranking);
                        }
                    }
                }
            }
        }
    }
    Ok(best.expect("at least one 5-card subset"))
}
