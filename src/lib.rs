//! Rendezvous relay: two participants meet under a shared room name and
//! exchange opaque negotiation payloads over WebSocket

mod coordinator;
mod messages;
mod registry;
mod router;
mod server;
mod types;

pub use coordinator::CoordinatorHandle;
pub use messages::{ClientMessage, ServerMessage};
pub use server::{DEFAULT_PORT, SignalingServer};
pub use types::{OutboundMessage, ParticipantId, Role, SignalingError};
