//! Per-seat view materialization.
//!
//! Every outbound snapshot is rendered per recipient: public fields for
//! all seats, `my_cards` only for the recipient's own seat. No other
//! seat's hole cards ever enter a view; showdown reveals travel in the
//! hand-complete payload instead.

use serde::Serialize;

use crate::cards::Card;
use crate::engine::nl::{Chips, HandState, Phase, PlayerStatus, SeatId};

use super::seat::SeatStatus;
use super::Room;

/// Public lobby summary of a room.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_id: String,
    pub name: String,
    pub seat_count: usize,
    pub max_seats: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub hand_in_progress: bool,
    pub players: Vec<String>,
}

pub fn room_info(room: &Room) -> RoomInfo {
    RoomInfo {
        room_id: room.id.clone(),
        name: room.name.clone(),
        seat_count: room.seats.len(),
        max_seats: room.max_seats,
        small_blind: room.stakes.small_blind,
        big_blind: room.stakes.big_blind,
        hand_in_progress: room.hand_in_progress(),
        players: room.seats.iter().map(|s| s.name.clone()).collect(),
    }
}

/// Public per-seat fields. `card_count` stands in for the hidden cards.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub seat_id: String,
    pub player_name: String,
    pub chips: Chips,
    pub bet: Chips,
    pub status: SeatStatus,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    pub card_count: u8,
    pub away: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub room_id: String,
    pub hand_number: u64,
    pub phase: Phase,
    pub community_cards: Vec<Card>,
    pub pot: Chips,
    pub current_bet: Chips,
    pub min_raise: Chips,
    pub current_seat_id: Option<String>,
    pub seats: Vec<SeatView>,
    pub my_seat_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_cards: Option<[Card; 2]>,
}

fn engine_status(status: PlayerStatus) -> SeatStatus {
    match status {
        PlayerStatus::Active => SeatStatus::Active,
        PlayerStatus::Folded => SeatStatus::Folded,
        PlayerStatus::AllIn => SeatStatus::AllIn,
    }
}

/// Render the room + hand as seen by `viewer` (a seat id, or `None` for a
/// recipient without a seat in this hand).
pub fn game_view(room: &Room, hand: &HandState, viewer: Option<&str>) -> GameView {
    let seats = room
        .seats
        .iter()
        .enumerate()
        .map(|(index, seat)| {
            let in_hand = hand.player(index as SeatId);
            let (chips, bet, status, card_count) = match in_hand {
                Some(p) => (
                    p.stack,
                    p.round_bet,
                    engine_status(p.status),
                    if p.is_live() { 2 } else { 0 },
                ),
                None => (seat.chips, 0, seat.status, 0),
            };
            SeatView {
                seat_id: seat.id.clone(),
                player_name: seat.name.clone(),
                chips,
                bet,
                status,
                is_dealer: seat.is_dealer,
                is_small_blind: seat.is_small_blind,
                is_big_blind: seat.is_big_blind,
                card_count,
                away: seat.away,
            }
        })
        .collect();

    let my_cards = viewer
        .and_then(|id| room.seat_index(id))
        .and_then(|index| hand.player(index as SeatId))
        .map(|p| p.hole_cards);

    GameView {
        room_id: room.id.clone(),
        hand_number: room.hand_number,
        phase: hand.phase,
        community_cards: hand.community.clone(),
        pot: hand.pot,
        current_bet: hand.current_bet,
        min_raise: hand.min_raise,
        current_seat_id: hand
            .to_act_seat()
            .and_then(|s| room.seats.get(s as usize))
            .map(|seat| seat.id.clone()),
        seats,
        my_seat_id: viewer.map(str::to_owned),
        my_cards,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::cards::Deck;
    use crate::engine::nl::{HandConfig, HandEngine, HandEngineNL, HandSeat, TableStakes};
    use crate::room::seat::Seat;

    use super::*;

    fn test_room() -> Room {
        let seats = vec![
            Seat::new("alpha0001".into(), "ada".into(), 1000),
            Seat::new("bravo0002".into(), "ben".into(), 1000),
        ];
        let mut rng = StdRng::seed_from_u64(9);
        let (hand, _) = HandEngine::start_hand(
            HandConfig {
                stakes: TableStakes {
                    small_blind: 10,
                    big_blind: 20,
                },
                button: 0,
            },
            &[
                HandSeat { seat: 0, stack: 1000 },
                HandSeat { seat: 1, stack: 1000 },
            ],
            Deck::shuffled(&mut rng),
        )
        .unwrap();
        Room {
            id: "room00001".into(),
            name: "table one".into(),
            seats,
            max_seats: 6,
            stakes: TableStakes {
                small_blind: 10,
                big_blind: 20,
            },
            hand: Some(hand),
            hand_number: 1,
            dealer_seat: Some("alpha0001".into()),
        }
    }

    #[test]
    fn views_reveal_only_the_recipients_cards() {
        let room = test_room();
        let hand = room.hand.as_ref().unwrap();

        let for_ada = game_view(&room, hand, Some("alpha0001"));
        let for_ben = game_view(&room, hand, Some("bravo0002"));
        let ada_cards = hand.player(0).unwrap().hole_cards;
        let ben_cards = hand.player(1).unwrap().hole_cards;
        assert_eq!(for_ada.my_cards, Some(ada_cards));
        assert_eq!(for_ben.my_cards, Some(ben_cards));

        // The serialized view for ada must not contain ben's cards.
        let json = serde_json::to_string(&for_ada).unwrap();
        for card in ben_cards {
            let fragment = format!(
                "{{\"rank\":{},\"suit\":\"{}\"}}",
                card.rank.value(),
                format!("{:?}", card.suit).to_lowercase()
            );
            assert!(!json.contains(&fragment), "opponent card leaked into the view");
        }
    }

    #[test]
    fn spectator_views_have_no_cards_at_all() {
        let room = test_room();
        let hand = room.hand.as_ref().unwrap();
        let view = game_view(&room, hand, None);
        assert_eq!(view.my_cards, None);
        assert!(view.seats.iter().all(|s| s.card_count == 2));
    }

    #[test]
    fn public_seat_fields_track_the_engine() {
        let room = test_room();
        let hand = room.hand.as_ref().unwrap();
        let view = game_view(&room, hand, None);
        // Heads-up: dealer posted the small blind of 10.
        assert_eq!(view.seats[0].bet, 10);
        assert_eq!(view.seats[1].bet, 20);
        assert_eq!(view.pot, 30);
        assert_eq!(view.current_seat_id.as_deref(), Some("alpha0001"));
    }
}
