//! Fire-and-forget delivery over an immutable occupant snapshot.
//!
//! Messages are serialized once per fan-out; closed channels mean the
//! connection is already gone and the send result is ignored.

use std::collections::HashMap;

use tracing::debug;

use crate::messages::ServerMessage;
use crate::registry::Registry;
use crate::types::{OutboundMessage, Participant, ParticipantId};

pub(crate) fn encode(msg: &ServerMessage) -> OutboundMessage {
    let json =
        serde_json::to_string(msg).expect("ServerMessage serialization should never fail");
    OutboundMessage::from(json)
}

pub(crate) fn send_to(participant: &Participant, msg: &ServerMessage) {
    let _ = participant.tx.send(encode(msg));
}

/// Deliver to the occupant of `room` that is not `sender`; dropped
/// silently when there is no reachable peer.
pub(crate) fn deliver(
    participants: &HashMap<ParticipantId, Participant>,
    registry: &Registry,
    room: &str,
    sender: ParticipantId,
    msg: &ServerMessage,
) {
    let Some(other) = registry.other_occupant(room, sender) else {
        debug!("No peer for {} in room {}, dropping message", sender, room);
        return;
    };
    if let Some(participant) = participants.get(&other) {
        let _ = participant.tx.send(encode(msg));
    }
}

/// Deliver to every occupant except `sender`. Equivalent to `deliver`
/// under the two-occupant cap, expressed generally.
pub(crate) fn notify_others(
    participants: &HashMap<ParticipantId, Participant>,
    occupants: &[ParticipantId],
    sender: ParticipantId,
    msg: &ServerMessage,
) {
    let encoded = encode(msg);
    for id in occupants.iter().copied().filter(|&p| p != sender) {
        if let Some(participant) = participants.get(&id) {
            let _ = participant.tx.send(encoded.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn participant() -> (Participant, UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Participant::new(tx), rx)
    }

    #[test]
    fn deliver_reaches_only_the_other_occupant() {
        let (a, mut rx_a) = participant();
        let (b, mut rx_b) = participant();
        let (id_a, id_b) = (ParticipantId::from("conn_0000000a"), ParticipantId::from("conn_0000000b"));
        let participants = HashMap::from([(id_a, a), (id_b, b)]);
        let mut registry = Registry::new();
        registry.add_occupant("r", id_a).unwrap();
        registry.add_occupant("r", id_b).unwrap();

        deliver(&participants, &registry, "r", id_a, &ServerMessage::PeerLeft { room: "r".into() });

        assert!(rx_b.try_recv().is_ok());
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn deliver_with_no_peer_is_a_silent_drop() {
        let (a, mut rx_a) = participant();
        let id_a = ParticipantId::from("conn_0000000a");
        let participants = HashMap::from([(id_a, a)]);
        let mut registry = Registry::new();
        registry.add_occupant("r", id_a).unwrap();

        deliver(&participants, &registry, "r", id_a, &ServerMessage::PeerLeft { room: "r".into() });
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn deliver_to_closed_channel_does_not_panic() {
        let (a, _) = participant();
        let (b, rx_b) = participant();
        let (id_a, id_b) = (ParticipantId::from("conn_0000000a"), ParticipantId::from("conn_0000000b"));
        drop(rx_b);
        let participants = HashMap::from([(id_a, a), (id_b, b)]);
        let mut registry = Registry::new();
        registry.add_occupant("r", id_a).unwrap();
        registry.add_occupant("r", id_b).unwrap();

        deliver(&participants, &registry, "r", id_a, &ServerMessage::PeerLeft { room: "r".into() });
    }

    #[test]
    fn notify_others_excludes_the_sender() {
        let (a, mut rx_a) = participant();
        let (b, mut rx_b) = participant();
        let (id_a, id_b) = (ParticipantId::from("conn_0000000a"), ParticipantId::from("conn_0000000b"));
        let participants = HashMap::from([(id_a, a), (id_b, b)]);

        notify_others(
            &participants,
            &[id_a, id_b],
            id_b,
            &ServerMessage::PeerJoined { room: "r".into() },
        );

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }
}
