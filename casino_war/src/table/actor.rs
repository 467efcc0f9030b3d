//! Table actor with async message handling.
//!
//! The actor is the single owner of the game state: every mutation flows
//! through its inbox and is applied atomically, and the resulting events
//! are pushed to every subscriber before the next message is processed,
//! so all clients observe the same event order.

use std::collections::HashMap;

use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};

use super::{
    config::TableConfig,
    messages::{ClientId, TableMessage},
};
use crate::{
    game::{GameError, GameEvent, WarState, entities::GameSnapshot},
    net::messages::ClientAction,
};

/// Handle for sending messages to a running table.
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
}

impl TableHandle {
    pub fn new(sender: mpsc::Sender<TableMessage>) -> Self {
        Self { sender }
    }

    /// Send a raw message to the table.
    pub async fn send(&self, message: TableMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Table is closed".to_string())
    }

    /// Apply a client action. The outer error means the table is gone;
    /// the inner result is the engine's verdict.
    pub async fn apply(&self, action: ClientAction) -> Result<Result<(), GameError>, String> {
        let (tx, rx) = oneshot::channel();
        self.send(TableMessage::Apply {
            action,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| "Table dropped the request".to_string())
    }

    pub async fn snapshot(&self) -> Result<GameSnapshot, String> {
        let (tx, rx) = oneshot::channel();
        self.send(TableMessage::GetSnapshot { response: tx }).await?;
        rx.await.map_err(|_| "Table dropped the request".to_string())
    }

    pub async fn subscribe(
        &self,
        client_id: ClientId,
        sender: mpsc::Sender<GameEvent>,
    ) -> Result<(), String> {
        self.send(TableMessage::Subscribe { client_id, sender })
            .await
    }

    pub async fn unsubscribe(&self, client_id: ClientId) -> Result<(), String> {
        self.send(TableMessage::Unsubscribe { client_id }).await
    }
}

/// Actor owning a single Casino War table.
pub struct TableActor {
    /// Table configuration.
    config: TableConfig,

    /// The authoritative game state.
    state: WarState,

    /// Message inbox.
    inbox: mpsc::Receiver<TableMessage>,

    /// Broadcast subscribers, keyed by connection.
    subscribers: HashMap<ClientId, mpsc::Sender<GameEvent>>,

    /// Set once a Close message arrives.
    is_closed: bool,
}

impl TableActor {
    /// Create the actor and a handle for talking to it.
    pub fn new(config: TableConfig) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(128);
        let state = WarState::new(config.settings);
        let actor = Self {
            config,
            state,
            inbox,
            subscribers: HashMap::new(),
            is_closed: false,
        };
        (actor, TableHandle::new(sender))
    }

    /// Run the table event loop until every handle is dropped or a Close
    /// message arrives.
    pub async fn run(mut self) {
        info!("table '{}' starting", self.config.name);
        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
            if self.is_closed {
                break;
            }
        }
        info!("table '{}' closed", self.config.name);
    }

    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Apply { action, response } => {
                debug!("applying: {action}");
                match self.apply(action) {
                    Ok(events) => {
                        for event in events {
                            self.broadcast(event);
                        }
                        let _ = response.send(Ok(()));
                    }
                    Err(error) => {
                        debug!("rejected: {error}");
                        let _ = response.send(Err(error));
                    }
                }
            }

            TableMessage::GetSnapshot { response } => {
                let _ = response.send(self.state.snapshot());
            }

            TableMessage::Subscribe { client_id, sender } => {
                self.subscribers.insert(client_id, sender);
                debug!("client {client_id} subscribed to table events");
            }

            TableMessage::Unsubscribe { client_id } => {
                self.subscribers.remove(&client_id);
                debug!("client {client_id} unsubscribed from table events");
            }

            TableMessage::Close => {
                self.is_closed = true;
            }
        }
    }

    /// Dispatch one action to the engine. Registration actions never get
    /// this far; the gateway answers them itself.
    fn apply(&mut self, action: ClientAction) -> Result<Vec<GameEvent>, GameError> {
        match action {
            ClientAction::RegisterDealer | ClientAction::RegisterPlayer { .. } => {
                Err(GameError::ConnectionAction)
            }
            ClientAction::AddPlayer { player_id } => self.state.add_player(player_id),
            ClientAction::RemovePlayer { player_id } => self.state.remove_player(player_id),
            ClientAction::ShuffleDeck => self.state.shuffle_deck(),
            ClientAction::BurnCard => self.state.burn_card(),
            ClientAction::SetGameMode { mode } => self.state.set_game_mode(mode),
            ClientAction::DealCards => self.state.deal_cards(),
            ClientAction::StartAutoRound => self.state.start_auto_round(),
            ClientAction::ManualDealCard {
                target,
                card,
                player_id,
            } => self.state.manual_deal_card(target, card, player_id),
            ClientAction::EvaluateRound => self.state.evaluate_round(),
            ClientAction::PlayerChoice { player_id, choice } => {
                self.state.player_choice(player_id, choice)
            }
            ClientAction::AssignWarCard {
                target,
                card,
                player_id,
            } => self.state.assign_war_card(target, card, player_id),
            ClientAction::EvaluateWarRound => self.state.evaluate_war_round(),
            ClientAction::UndoLastCard => self.state.undo_last_card(),
            ClientAction::ManualAssignResult { player_id, result } => {
                self.state.manual_assign_result(player_id, result)
            }
            ClientAction::ClearRound => self.state.clear_round(),
            ClientAction::ResetGame => self.state.reset_game(),
            ClientAction::ChangeBets { min_bet, max_bet } => {
                self.state.change_bets(min_bet, max_bet)
            }
            ClientAction::ChangeTable { table_number } => self.state.change_table(table_number),
            ClientAction::GetGameState => self.state.game_state(),
            ClientAction::GetAllPlayerStats => self.state.all_player_stats(),
            ClientAction::ClearAllStats => self.state.clear_all_stats(),
        }
    }

    /// Push one event to every subscriber. A full channel drops the event
    /// for that subscriber rather than stalling the table; a closed
    /// channel removes the subscriber.
    fn broadcast(&mut self, event: GameEvent) {
        self.subscribers.retain(|client_id, sender| {
            match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("client {client_id} event channel full, dropping event");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("client {client_id} disconnected, removing subscriber");
                    false
                }
            }
        });
    }
}
