use actix::*;
use actix_web::web;
use actix_web_actors::ws;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::MutexGuard;

use crate::coordinator::Outbound;
use crate::models::{AppState, ChessWebSocketMessage, ClientMessage, ServerMessage};

/// WebSocket handler for chess rooms
pub struct ChessWebSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
}

impl ChessWebSocket {
    pub fn new(id: String, app_state: web::Data<AppState>) -> Self {
        ChessWebSocket { id, app_state }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Addr<ChessWebSocket>>> {
        self.app_state
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        // Register the actor with the application state
        let addr = ctx.address();
        let total_sessions = {
            let mut sessions = self.sessions();
            sessions.insert(self.id.clone(), addr);
            sessions.len()
        };

        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", total_sessions);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        // Unsubscribe from the room before the address disappears
        self.app_state.coordinator.disconnect(&self.id);

        let total_sessions = {
            let mut sessions = self.sessions();
            sessions.remove(&self.id);
            sessions.len()
        };
        info!("WebSocket connection closed: {}", self.id);
        info!("Total active sessions: {}", total_sessions);

        Running::Stop
    }
}

impl Handler<ChessWebSocketMessage> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: ChessWebSocketMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => {
                        info!("{} sent {}", self.id, client_msg.event_name());
                        let outbound = self.app_state.coordinator.handle(&self.id, client_msg);
                        self.deliver(outbound, ctx);
                    }
                    Err(e) => {
                        warn!("Error parsing client message from {}: {}", self.id, e);
                        self.send_to_self(
                            &ServerMessage::error(format!("Invalid message format: {}", e)),
                            ctx,
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send_to_self(&ServerMessage::error("Binary messages are not supported"), ctx);
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

impl ChessWebSocket {
    fn send_to_self(&self, message: &ServerMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Failed to serialize response: {}", e),
        }
    }

    /// Send each outbound event to its recipients. Frames for this
    /// connection go straight to the context, the rest through the
    /// registered actor addresses.
    pub fn deliver(&self, outbound: Vec<Outbound>, ctx: &mut ws::WebsocketContext<Self>) {
        for Outbound { recipients, message } in outbound {
            let msg_str = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to serialize {:?}: {}", message, e);
                    continue;
                }
            };

            // Clone the addresses so the lock is not held while sending
            let addrs: Vec<(String, Option<Addr<ChessWebSocket>>)> = {
                let sessions = self.sessions();
                recipients
                    .into_iter()
                    .map(|id| {
                        let addr = sessions.get(&id).cloned();
                        (id, addr)
                    })
                    .collect()
            };

            for (connection_id, addr) in addrs {
                if connection_id == self.id {
                    ctx.text(msg_str.clone());
                } else if let Some(addr) = addr {
                    addr.do_send(ChessWebSocketMessage(msg_str.clone()));
                } else {
                    info!("Player {} not found in sessions", connection_id);
                }
            }
        }
    }
}
