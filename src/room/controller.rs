//! Room controller: one actor task per room.
//!
//! All hand mutations and view rendering for a room happen serially on its
//! task; the command inbox is the single writer entrance. Turn timers,
//! run-out pacing and the inter-hand delay are deadlines folded into the
//! same select loop, so nothing races the hand state.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cards::Deck;
use crate::config::TableConfig;
use crate::engine::nl::{
    legal_actions, ActionError, HandConfig, HandEngine, HandEngineNL, HandResult, HandSeat,
    PhaseAdvance, PlayerAction, SeatId, StateError, Transition,
};
use crate::net::protocol::{
    LegalActionEntry, SeatSummary, ServerMessage, ShowdownSeat, WinnerInfo,
};
use crate::net::ConnId;
use crate::tokio_tools::spawn_named;

use super::registry::random_id;
use super::seat::{Seat, SeatStatus};
use super::view::{game_view, room_info, GameView, RoomInfo};
use super::Room;

const LOG_TARGET: &str = "room::controller";
const INBOX_CAPACITY: usize = 64;

pub type EventSender = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("room is full")]
    RoomFull,
    #[error("cannot join while a hand is in progress")]
    HandInProgress,
    #[error("connection is already seated in this room")]
    AlreadySeated,
    #[error("seat not found")]
    UnknownSeat,
    #[error("seat does not belong to this connection")]
    NotYourSeat,
    #[error("no hand in progress")]
    NoHand,
    #[error("a hand is already running")]
    HandAlreadyRunning,
    #[error("need at least two seats with chips to start")]
    NotEnoughPlayers,
    #[error("room is closed")]
    Closed,
    #[error(transparent)]
    Action(#[from] ActionError),
}

pub struct JoinOutcome {
    pub seat_id: String,
    pub room: RoomInfo,
}

pub enum RoomCommand {
    Join {
        conn: ConnId,
        player_name: String,
        events: EventSender,
        reply: oneshot::Sender<Result<JoinOutcome, RoomError>>,
    },
    Leave {
        conn: ConnId,
        seat_id: String,
    },
    StartGame {
        conn: ConnId,
    },
    Action {
        conn: ConnId,
        seat_id: String,
        action: PlayerAction,
    },
    Disconnect {
        conn: ConnId,
    },
    Describe {
        reply: oneshot::Sender<RoomInfo>,
    },
}

/// Cheap cloneable address of a room's controller task.
#[derive(Clone)]
pub struct RoomHandle {
    pub room_id: String,
    tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.tx.send(cmd).await.map_err(|_| RoomError::Closed)
    }
}

struct TurnTimer {
    at: Instant,
    seat: SeatId,
}

pub struct RoomController {
    room: Room,
    cfg: TableConfig,
    inbox: mpsc::Receiver<RoomCommand>,
    cancel: CancellationToken,
    rng: StdRng,

    conns: HashMap<ConnId, EventSender>,
    seat_conn: HashMap<String, ConnId>,
    conn_seat: HashMap<ConnId, String>,

    turn_timer: Option<TurnTimer>,
    runout_at: Option<Instant>,
    next_hand_at: Option<Instant>,
}

fn deadline_or_far(at: Option<Instant>) -> Instant {
    at.unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400))
}

fn epoch_ms(from_now: Duration) -> u64 {
    SystemTime::now()
        .checked_add(from_now)
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl RoomController {
    /// Spawn a controller for a fresh room and return its handle plus the
    /// task handle the registry uses to notice the room dissolving.
    pub fn spawn(
        room_id: String,
        name: String,
        cfg: TableConfig,
        cancel: CancellationToken,
    ) -> (RoomHandle, JoinHandle<()>) {
        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let controller = RoomController {
            room: Room {
                id: room_id.clone(),
                name,
                seats: Vec::new(),
                max_seats: cfg.max_seats,
                stakes: cfg.stakes,
                hand: None,
                hand_number: 0,
                dealer_seat: None,
            },
            cfg,
            inbox,
            cancel,
            rng: StdRng::from_entropy(),
            conns: HashMap::new(),
            seat_conn: HashMap::new(),
            conn_seat: HashMap::new(),
            turn_timer: None,
            runout_at: None,
            next_hand_at: None,
        };
        let task = spawn_named(format!("room-{room_id}"), controller.run());
        (
            RoomHandle { room_id, tx },
            task,
        )
    }

    async fn run(mut self) {
        info!(target = LOG_TARGET, room_id = %self.room.id, "room opened");
        loop {
            let turn_at = deadline_or_far(self.turn_timer.as_ref().map(|t| t.at));
            let pace_at = deadline_or_far(self.runout_at);
            let hand_at = deadline_or_far(self.next_hand_at);
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!(target = LOG_TARGET, room_id = %self.room.id, "shutdown requested");
                    break;
                }
                cmd = self.inbox.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = sleep_until(turn_at) => self.on_turn_timeout(),
                _ = sleep_until(pace_at) => self.advance_streets(),
                _ = sleep_until(hand_at) => self.on_inter_hand_elapsed(),
            }
            if self.room.seats.is_empty() && !self.room.hand_in_progress() {
                break;
            }
        }
        info!(target = LOG_TARGET, room_id = %self.room.id, "room dissolved");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                conn,
                player_name,
                events,
                reply,
            } => {
                let outcome = self.handle_join(conn, player_name, events);
                let _ = reply.send(outcome);
            }
            RoomCommand::Leave { conn, seat_id } => self.handle_leave(conn, &seat_id),
            RoomCommand::StartGame { conn } => self.handle_start(conn),
            RoomCommand::Action {
                conn,
                seat_id,
                action,
            } => self.handle_action(conn, &seat_id, action),
            RoomCommand::Disconnect { conn } => self.handle_disconnect(conn),
            RoomCommand::Describe { reply } => {
                let _ = reply.send(room_info(&self.room));
            }
        }
    }

    // ─── intents ────────────────────────────────────────────────────────

    fn handle_join(
        &mut self,
        conn: ConnId,
        player_name: String,
        events: EventSender,
    ) -> Result<JoinOutcome, RoomError> {
        if self.room.hand_in_progress() {
            return Err(RoomError::HandInProgress);
        }
        if self.room.seats.len() >= self.room.max_seats {
            return Err(RoomError::RoomFull);
        }
        if self.conn_seat.contains_key(&conn) {
            return Err(RoomError::AlreadySeated);
        }

        let seat_id = loop {
            let id = random_id(&mut self.rng);
            if self.room.seat(&id).is_none() {
                break id;
            }
        };
        self.room.seats.push(Seat::new(
            seat_id.clone(),
            player_name.clone(),
            self.cfg.starting_stack,
        ));
        self.conns.insert(conn, events);
        self.seat_conn.insert(seat_id.clone(), conn);
        self.conn_seat.insert(conn, seat_id.clone());
        info!(
            target = LOG_TARGET,
            room_id = %self.room.id,
            seat_id = %seat_id,
            player = %player_name,
            "player joined"
        );

        let info = room_info(&self.room);
        self.broadcast_except(
            conn,
            ServerMessage::PlayerJoined {
                room_id: self.room.id.clone(),
                seat_id: seat_id.clone(),
                player_name,
                room: info.clone(),
            },
        );
        Ok(JoinOutcome {
            seat_id,
            room: info,
        })
    }

    fn handle_leave(&mut self, conn: ConnId, seat_id: &str) {
        let Some(index) = self.room.seat_index(seat_id) else {
            self.send_error(conn, RoomError::UnknownSeat);
            return;
        };
        if self.seat_conn.get(seat_id) != Some(&conn) {
            self.send_error(conn, RoomError::NotYourSeat);
            return;
        }

        let in_hand = self
            .room
            .hand
            .as_ref()
            .and_then(|h| h.player(index as SeatId))
            .is_some();
        if in_hand {
            // Forced fold; the seat leaves for real at the hand boundary.
            {
                let seat = &mut self.room.seats[index];
                seat.leaving = true;
                seat.away = true;
            }
            self.unbind(conn, seat_id);
            self.force_fold_seat(index as SeatId);
        } else {
            self.unbind(conn, seat_id);
            self.remove_seat(seat_id);
        }
    }

    fn handle_start(&mut self, conn: ConnId) {
        if self.room.hand_in_progress() {
            self.send_error(conn, RoomError::HandAlreadyRunning);
            return;
        }
        if self.next_hand_at.is_some() {
            // Inter-hand pacing: start intents are ignored during the delay.
            debug!(target = LOG_TARGET, room_id = %self.room.id, "start ignored during pacing");
            return;
        }
        if let Err(err) = self.start_hand_now() {
            self.send_error(conn, err);
        }
    }

    fn handle_action(&mut self, conn: ConnId, seat_id: &str, action: PlayerAction) {
        if self.room.hand.is_none() {
            self.send_error(conn, RoomError::NoHand);
            return;
        }
        let Some(index) = self.room.seat_index(seat_id) else {
            self.send_error(conn, RoomError::UnknownSeat);
            return;
        };
        if self.seat_conn.get(seat_id) != Some(&conn) {
            self.send_error(conn, RoomError::NotYourSeat);
            return;
        }
        self.apply_seat_action(index as SeatId, action, Some(conn));
    }

    fn handle_disconnect(&mut self, conn: ConnId) {
        self.conns.remove(&conn);
        let Some(seat_id) = self.conn_seat.remove(&conn) else {
            return;
        };
        self.seat_conn.remove(&seat_id);
        let Some(index) = self.room.seat_index(&seat_id) else {
            return;
        };

        let in_hand = self
            .room
            .hand
            .as_ref()
            .and_then(|h| h.player(index as SeatId))
            .is_some();
        if in_hand {
            // Mid-hand: flag away, let the turn policy fold it when due.
            self.room.seats[index].away = true;
            debug!(
                target = LOG_TARGET,
                room_id = %self.room.id,
                seat_id = %seat_id,
                "seat away mid-hand"
            );
            let due = self
                .room
                .hand
                .as_ref()
                .and_then(|h| h.to_act_seat())
                == Some(index as SeatId);
            if due {
                self.turn_timer = None;
                self.auto_act(index as SeatId);
            }
        } else {
            // Between hands a disconnect is a leave.
            self.remove_seat(&seat_id);
        }
    }

    // ─── hand lifecycle ─────────────────────────────────────────────────

    fn start_hand_now(&mut self) -> Result<(), RoomError> {
        let eligible = self.room.eligible_indexes();
        if eligible.len() < 2 {
            return Err(RoomError::NotEnoughPlayers);
        }

        let button = self.next_button(&eligible);
        let entrants: Vec<HandSeat> = eligible
            .iter()
            .map(|&i| HandSeat {
                seat: i as SeatId,
                stack: self.room.seats[i].chips,
            })
            .collect();
        let deck = Deck::shuffled(&mut self.rng);
        let (state, _blinds) = HandEngine::start_hand(
            HandConfig {
                stakes: self.room.stakes,
                button,
            },
            &entrants,
            deck,
        )
        .map_err(ActionError::from)?;

        self.room.hand_number += 1;
        self.room.dealer_seat = Some(self.room.seats[button as usize].id.clone());
        for (i, seat) in self.room.seats.iter_mut().enumerate() {
            let idx = i as SeatId;
            seat.is_dealer = idx == button;
            seat.is_small_blind = idx == state.small_blind_seat;
            seat.is_big_blind = idx == state.big_blind_seat;
            if eligible.contains(&i) {
                seat.status = SeatStatus::Active;
            }
        }
        info!(
            target = LOG_TARGET,
            room_id = %self.room.id,
            hand_number = self.room.hand_number,
            players = entrants.len(),
            "hand started"
        );

        let first = state.to_act_seat();
        self.room.hand = Some(state);
        self.broadcast_views(|view| ServerMessage::GameStarted { game_view: view });
        match first {
            Some(seat) => self.request_action(seat),
            // Blinds already consumed every stack: run the board out.
            None => self.runout_at = Some(Instant::now() + self.cfg.runout_step),
        }
        Ok(())
    }

    /// Next dealer: the first eligible seat clockwise after the previous
    /// dealer's seat, falling back to the first eligible seat.
    fn next_button(&self, eligible: &[usize]) -> SeatId {
        let previous = self
            .room
            .dealer_seat
            .as_deref()
            .and_then(|id| self.room.seat_index(id));
        let button = match previous {
            Some(prev) => {
                let n = self.room.seats.len();
                (1..=n)
                    .map(|step| (prev + step) % n)
                    .find(|i| eligible.contains(i))
                    .unwrap_or(eligible[0])
            }
            None => eligible[0],
        };
        button as SeatId
    }

    fn apply_seat_action(&mut self, seat: SeatId, action: PlayerAction, origin: Option<ConnId>) {
        let Some(hand) = self.room.hand.as_mut() else {
            return;
        };
        match HandEngine::apply_action(hand, seat, action) {
            Err(ActionError::State(err)) => self.abort_hand(err),
            Err(err) => {
                if let Some(conn) = origin {
                    self.send_error(conn, RoomError::Action(err));
                } else {
                    warn!(
                        target = LOG_TARGET,
                        room_id = %self.room.id,
                        seat,
                        error = %err,
                        "synthesized action rejected"
                    );
                }
            }
            Ok(transition) => {
                self.turn_timer = None;
                self.after_transition(transition);
            }
        }
    }

    fn force_fold_seat(&mut self, seat: SeatId) {
        let Some(hand) = self.room.hand.as_mut() else {
            return;
        };
        match HandEngine::force_fold(hand, seat) {
            Err(ActionError::State(err)) => self.abort_hand(err),
            Err(err) => {
                // Folding an all-in or already folded seat is a no-op.
                debug!(
                    target = LOG_TARGET,
                    room_id = %self.room.id,
                    seat,
                    error = %err,
                    "forced fold skipped"
                );
            }
            Ok(Some(transition)) => {
                self.turn_timer = None;
                self.after_transition(transition);
            }
            Ok(None) => {
                self.broadcast_views(|view| ServerMessage::GameUpdated { game_view: view });
            }
        }
    }

    fn after_transition(&mut self, transition: Transition) {
        match transition {
            Transition::Continued { next_to_act, .. } => {
                self.broadcast_views(|view| ServerMessage::GameUpdated { game_view: view });
                self.request_action(next_to_act);
            }
            Transition::StreetEnd { .. } => {
                self.broadcast_views(|view| ServerMessage::GameUpdated { game_view: view });
                self.advance_streets();
            }
            Transition::HandEnd { result, .. } => self.finish_hand(result),
        }
    }

    fn advance_streets(&mut self) {
        self.runout_at = None;
        let Some(hand) = self.room.hand.as_mut() else {
            return;
        };
        match HandEngine::advance_phase(hand) {
            Err(err) => self.abort_hand(err),
            Ok(PhaseAdvance::Betting { next_to_act, .. }) => {
                self.broadcast_views(|view| ServerMessage::GameUpdated { game_view: view });
                self.request_action(next_to_act);
            }
            Ok(PhaseAdvance::RunOut { .. }) => {
                self.broadcast_views(|view| ServerMessage::GameUpdated { game_view: view });
                self.runout_at = Some(Instant::now() + self.cfg.runout_step);
            }
            Ok(PhaseAdvance::Showdown { result }) => self.finish_hand(result),
        }
    }

    fn request_action(&mut self, seat: SeatId) {
        let index = seat as usize;
        if self.room.seats.get(index).map_or(false, |s| s.away) {
            // Nobody is behind that seat; apply the auto-action now.
            self.auto_act(seat);
            return;
        }
        let Some(hand) = self.room.hand.as_ref() else {
            return;
        };
        let legals = legal_actions(hand, seat);
        let seat_id = self.room.seats[index].id.clone();
        self.turn_timer = Some(TurnTimer {
            at: Instant::now() + self.cfg.turn_timeout,
            seat,
        });
        self.broadcast(ServerMessage::ActionRequired {
            seat_id,
            legal_actions: LegalActionEntry::list(&legals),
            turn_deadline: epoch_ms(self.cfg.turn_timeout),
        });
    }

    fn on_turn_timeout(&mut self) {
        let Some(timer) = self.turn_timer.take() else {
            return;
        };
        let due = self
            .room
            .hand
            .as_ref()
            .and_then(|h| h.to_act_seat())
            == Some(timer.seat);
        if !due {
            return;
        }
        info!(
            target = LOG_TARGET,
            room_id = %self.room.id,
            seat = timer.seat,
            "turn timer expired, applying auto-action"
        );
        self.auto_act(timer.seat);
    }

    /// Auto-action policy for timeouts and away seats: check when legal,
    /// fold otherwise. Applied exactly as if the seat had sent it.
    fn auto_act(&mut self, seat: SeatId) {
        let Some(hand) = self.room.hand.as_ref() else {
            return;
        };
        let action = if legal_actions(hand, seat).check {
            PlayerAction::Check
        } else {
            PlayerAction::Fold
        };
        self.apply_seat_action(seat, action, None);
    }

    fn finish_hand(&mut self, result: HandResult) {
        self.turn_timer = None;
        self.runout_at = None;
        let Some(hand) = self.room.hand.take() else {
            return;
        };

        // Engine stacks become the durable chip counts.
        for p in &hand.players {
            if let Some(seat) = self.room.seats.get_mut(p.seat as usize) {
                seat.chips = p.stack;
            }
        }

        let seat_label = |seat: SeatId| -> (String, String) {
            self.room
                .seats
                .get(seat as usize)
                .map(|s| (s.id.clone(), s.name.clone()))
                .unwrap_or_default()
        };
        let winners: Vec<WinnerInfo> = result
            .winners
            .iter()
            .map(|w| {
                let (seat_id, player_name) = seat_label(w.seat);
                WinnerInfo {
                    seat_id,
                    player_name,
                    amount: w.amount,
                    category: w.ranking.map(|r| r.category),
                    best_five: w.ranking.map(|r| r.best_five),
                }
            })
            .collect();
        let players: Vec<ShowdownSeat> = hand
            .players
            .iter()
            .map(|p| {
                let (seat_id, player_name) = seat_label(p.seat);
                ShowdownSeat {
                    seat_id,
                    player_name,
                    chips: p.stack,
                    hole_cards: (result.showdown && p.is_live()).then_some(p.hole_cards),
                    folded: !p.is_live(),
                }
            })
            .collect();
        self.broadcast(ServerMessage::HandComplete {
            winners,
            players,
            community_cards: hand.community.clone(),
            pot: result.pot,
            is_showdown: result.showdown,
        });
        info!(
            target = LOG_TARGET,
            room_id = %self.room.id,
            hand_number = self.room.hand_number,
            pot = result.pot,
            showdown = result.showdown,
            "hand complete"
        );

        // Hand boundary: busted seats go out, the rest wait; deferred
        // leaves and disconnects take effect now.
        for seat in self.room.seats.iter_mut() {
            seat.status = if seat.chips == 0 {
                SeatStatus::Out
            } else {
                SeatStatus::Waiting
            };
        }
        let parted: Vec<String> = self
            .room
            .seats
            .iter()
            .filter(|s| s.leaving || s.away)
            .map(|s| s.id.clone())
            .collect();
        for seat_id in parted {
            if let Some(conn) = self.seat_conn.remove(&seat_id) {
                self.conn_seat.remove(&conn);
                self.conns.remove(&conn);
            }
            self.remove_seat(&seat_id);
        }

        self.next_hand_at = Some(Instant::now() + self.cfg.inter_hand_delay);
    }

    fn on_inter_hand_elapsed(&mut self) {
        self.next_hand_at = None;
        if self.room.hand_in_progress() {
            return;
        }
        let with_chips: Vec<&Seat> = self.room.seats.iter().filter(|s| s.chips > 0).collect();
        match with_chips.len() {
            0 => {
                self.broadcast(ServerMessage::GameOver {
                    winner: None,
                    final_standings: self.standings(),
                });
            }
            1 => {
                let summary = SeatSummary {
                    seat_id: with_chips[0].id.clone(),
                    player_name: with_chips[0].name.clone(),
                    chips: with_chips[0].chips,
                };
                info!(
                    target = LOG_TARGET,
                    room_id = %self.room.id,
                    winner = %summary.player_name,
                    "game over"
                );
                self.broadcast(ServerMessage::GameOver {
                    winner: Some(summary),
                    final_standings: self.standings(),
                });
            }
            _ => {
                if let Err(err) = self.start_hand_now() {
                    warn!(
                        target = LOG_TARGET,
                        room_id = %self.room.id,
                        error = %err,
                        "could not start next hand"
                    );
                }
            }
        }
    }

    /// Refund the hand and carry on; invariant violations never distribute
    /// a corrupt pot.
    fn abort_hand(&mut self, err: StateError) {
        error!(
            target = LOG_TARGET,
            room_id = %self.room.id,
            error = %err,
            "hand aborted on invariant violation"
        );
        self.turn_timer = None;
        self.runout_at = None;
        if let Some(hand) = self.room.hand.take() {
            for p in &hand.players {
                if let Some(seat) = self.room.seats.get_mut(p.seat as usize) {
                    seat.chips = p.stack + p.contributed;
                }
            }
        }
        for seat in self.room.seats.iter_mut() {
            seat.status = if seat.chips == 0 {
                SeatStatus::Out
            } else {
                SeatStatus::Waiting
            };
        }
        self.broadcast(ServerMessage::Error {
            message: "hand aborted; all contributions refunded".into(),
        });
        self.next_hand_at = Some(Instant::now() + self.cfg.inter_hand_delay);
    }

    // ─── seats & fan-out ────────────────────────────────────────────────

    fn unbind(&mut self, conn: ConnId, seat_id: &str) {
        self.seat_conn.remove(seat_id);
        self.conn_seat.remove(&conn);
        self.conns.remove(&conn);
    }

    fn remove_seat(&mut self, seat_id: &str) {
        let Some(index) = self.room.seat_index(seat_id) else {
            return;
        };
        let seat = self.room.seats.remove(index);
        info!(
            target = LOG_TARGET,
            room_id = %self.room.id,
            seat_id = %seat.id,
            player = %seat.name,
            "player left"
        );
        self.broadcast(ServerMessage::PlayerLeft {
            room_id: self.room.id.clone(),
            seat_id: seat.id,
            room: room_info(&self.room),
        });
    }

    fn standings(&self) -> Vec<SeatSummary> {
        let mut standings: Vec<SeatSummary> = self
            .room
            .seats
            .iter()
            .map(|s| SeatSummary {
                seat_id: s.id.clone(),
                player_name: s.name.clone(),
                chips: s.chips,
            })
            .collect();
        standings.sort_by(|a, b| b.chips.cmp(&a.chips));
        standings
    }

    fn send_error(&self, conn: ConnId, err: RoomError) {
        if let Some(tx) = self.conns.get(&conn) {
            let _ = tx.send(ServerMessage::Error {
                message: err.to_string(),
            });
        }
    }

    /// Deliver one event to every connection. Failures mean the socket is
    /// gone; the event is dropped for that recipient only.
    fn broadcast(&self, message: ServerMessage) {
        for tx in self.conns.values() {
            let _ = tx.send(message.clone());
        }
    }

    fn broadcast_except(&self, skip: ConnId, message: ServerMessage) {
        for (conn, tx) in &self.conns {
            if *conn != skip {
                let _ = tx.send(message.clone());
            }
        }
    }

    /// Render and deliver a personalized snapshot to every connection.
    fn broadcast_views(&self, wrap: impl Fn(GameView) -> ServerMessage) {
        let Some(hand) = self.room.hand.as_ref() else {
            return;
        };
        for (conn, tx) in &self.conns {
            let viewer = self.conn_seat.get(conn).map(String::as_str);
            let view = game_view(&self.room, hand, viewer);
            let _ = tx.send(wrap(view));
        }
    }
}
