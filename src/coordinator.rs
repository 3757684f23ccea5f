use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::messages::{ClientMessage, ServerMessage};
use crate::registry::Registry;
use crate::router;
use crate::types::{OutboundMessage, Participant, ParticipantId};

/// Commands sent to the session coordinator actor
pub(crate) enum Command {
    Connect {
        id: ParticipantId,
        tx: mpsc::UnboundedSender<OutboundMessage>,
    },
    Message {
        id: ParticipantId,
        msg: ClientMessage,
    },
    Disconnect {
        id: ParticipantId,
    },
}

/// Single consumer of the command channel; processes one event to
/// completion at a time, so registry mutations never interleave.
pub(crate) async fn coordinator_actor(mut rx: mpsc::Receiver<Command>) {
    let mut coordinator = Coordinator::new();

    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Connect { id, tx } => coordinator.connect(id, tx),
            Command::Message { id, msg } => coordinator.handle_message(id, msg),
            Command::Disconnect { id } => coordinator.disconnect(id),
        }
    }
}

#[derive(Default)]
pub(crate) struct Coordinator {
    registry: Registry,
    participants: HashMap<ParticipantId, Participant>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, id: ParticipantId, tx: mpsc::UnboundedSender<OutboundMessage>) {
        self.participants.insert(id, Participant::new(tx));
    }

    pub fn handle_message(&mut self, id: ParticipantId, msg: ClientMessage) {
        match msg {
            ClientMessage::Join { room } => self.join(id, room),
            ClientMessage::Signal { room, payload } => self.signal(id, room, payload),
            ClientMessage::Leave { room } => self.leave(id, room),
        }
    }

    fn join(&mut self, id: ParticipantId, room: String) {
        match self.participants.get(&id) {
            Some(p) if p.room.is_none() => {}
            Some(_) => {
                debug!("Join from {} ignored: already in a room", id);
                return;
            }
            None => return,
        }
        if room.is_empty() {
            debug!("Join from {} ignored: empty room name", id);
            return;
        }

        let role = match self.registry.add_occupant(&room, id) {
            Ok(role) => role,
            Err(_) => {
                info!("Room {} full, rejecting {}", room, id);
                if let Some(p) = self.participants.get(&id) {
                    router::send_to(p, &ServerMessage::RoomFull { room });
                }
                return;
            }
        };

        if let Some(p) = self.participants.get_mut(&id) {
            p.room = Some(room.clone());
            p.role = Some(role);
        }
        info!("{} joined room {} as {}", id, room, role);

        let occupants = self.registry.occupants_of(&room);
        if let Some(p) = self.participants.get(&id) {
            router::send_to(
                p,
                &ServerMessage::Joined {
                    room: room.clone(),
                    role,
                },
            );
        }
        router::notify_others(
            &self.participants,
            &occupants,
            id,
            &ServerMessage::PeerJoined { room: room.clone() },
        );

        // Both slots taken: nudge the initiator to open the handshake
        if occupants.len() == 2 {
            if let Some(initiator) = occupants.first().and_then(|p| self.participants.get(p)) {
                router::send_to(initiator, &ServerMessage::StartNegotiation { room });
            }
        }
    }

    fn signal(&mut self, id: ParticipantId, room: String, payload: Value) {
        if !self.is_in_room(id, &room) {
            debug!("Signal from {} for room {} ignored: not an occupant", id, room);
            return;
        }
        router::deliver(
            &self.participants,
            &self.registry,
            &room,
            id,
            &ServerMessage::Signal { payload },
        );
    }

    fn leave(&mut self, id: ParticipantId, room: String) {
        if !self.is_in_room(id, &room) {
            debug!("Leave from {} for room {} ignored: not an occupant", id, room);
            return;
        }
        self.registry.remove_occupant(&room, id);
        if let Some(p) = self.participants.get_mut(&id) {
            p.room = None;
            p.role = None;
        }
        info!("{} left room {}", id, room);

        let occupants = self.registry.occupants_of(&room);
        router::notify_others(
            &self.participants,
            &occupants,
            id,
            &ServerMessage::PeerLeft { room },
        );
    }

    pub fn disconnect(&mut self, id: ParticipantId) {
        let Some(participant) = self.participants.remove(&id) else {
            return;
        };
        if let Some(room) = participant.room {
            self.registry.remove_occupant(&room, id);
            let occupants = self.registry.occupants_of(&room);
            router::notify_others(
                &self.participants,
                &occupants,
                id,
                &ServerMessage::PeerLeft { room: room.clone() },
            );
            info!("{} disconnected, left room {}", id, room);
        }
    }

    fn is_in_room(&self, id: ParticipantId, room: &str) -> bool {
        self.participants
            .get(&id)
            .is_some_and(|p| p.room.as_deref() == Some(room))
    }
}

/// Handle to communicate with the coordinator actor
#[derive(Clone)]
pub struct CoordinatorHandle {
    pub(crate) tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    /// Register a participant record before any message is read
    pub async fn connect(&self, id: ParticipantId, tx: mpsc::UnboundedSender<OutboundMessage>) {
        let _ = self.tx.send(Command::Connect { id, tx }).await;
    }

    pub async fn handle_message(&self, id: ParticipantId, msg: ClientMessage) {
        let _ = self.tx.send(Command::Message { id, msg }).await;
    }

    /// The connection-closed transition
    pub async fn disconnect(&self, id: ParticipantId) {
        let _ = self.tx.send(Command::Disconnect { id }).await;
    }
}
