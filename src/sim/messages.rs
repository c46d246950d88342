//! Per-handler output aggregation.
//!
//! A handler never writes to the transport directly. It fills a
//! [`MessageQueue`] and the scheduler flushes that queue after the handler
//! returns successfully, so a handler that fails halfway emits nothing.

use log::debug;
use tokio::sync::mpsc::UnboundedSender;

use crate::world::types::{Actor, RoomId, UserId};
use crate::world::World;

/// Text leaving the simulation for the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    ToUser { user_id: UserId, text: String },
    Broadcast { text: String },
}

impl Outbound {
    pub fn text(&self) -> &str {
        match self {
            Outbound::ToUser { text, .. } | Outbound::Broadcast { text } => text,
        }
    }
}

#[derive(Debug, Clone)]
enum Envelope {
    Actor(Actor, String),
    Room {
        room_id: RoomId,
        text: String,
        exclude: Vec<Actor>,
    },
    Broadcast(String),
}

fn terminate(text: &str, newline: bool) -> String {
    if newline {
        format!("{}\n", text)
    } else {
        text.to_string()
    }
}

#[derive(Debug, Default)]
pub struct MessageQueue {
    envelopes: Vec<Envelope>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_actor(&mut self, actor: Actor, text: &str, newline: bool) {
        self.envelopes
            .push(Envelope::Actor(actor, terminate(text, newline)));
    }

    /// Everyone in `room_id` except the listed actors.
    pub fn to_room(&mut self, room_id: RoomId, text: &str, newline: bool, exclude: &[Actor]) {
        self.envelopes.push(Envelope::Room {
            room_id,
            text: terminate(text, newline),
            exclude: exclude.to_vec(),
        });
    }

    /// Every connected user. Reserved for the scheduler and admin notices.
    pub fn broadcast(&mut self, text: &str) {
        self.envelopes.push(Envelope::Broadcast(terminate(text, true)));
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// Resolve recipients against the world as it is now and send everything.
    ///
    /// Messages to mobs and the system actor are dropped. Returns the number
    /// of outbound messages sent.
    pub fn flush(self, world: &World, sender: &UnboundedSender<Outbound>) -> usize {
        let mut sent = 0;
        let mut send = |out: Outbound| {
            if sender.send(out).is_ok() {
                sent += 1;
            } else {
                debug!("outbound channel closed; dropping message");
            }
        };
        for envelope in self.envelopes {
            match envelope {
                Envelope::Actor(Actor::User(user_id), text) => {
                    if world.users.get(&user_id).is_some_and(|u| u.online) {
                        send(Outbound::ToUser { user_id, text });
                    }
                }
                Envelope::Actor(_, _) => {}
                Envelope::Room {
                    room_id,
                    text,
                    exclude,
                } => {
                    for user_id in world.users_in_room(room_id) {
                        if exclude.contains(&Actor::User(user_id)) {
                            continue;
                        }
                        send(Outbound::ToUser {
                            user_id,
                            text: text.clone(),
                        });
                    }
                }
                Envelope::Broadcast(text) => send(Outbound::Broadcast { text }),
            }
        }
        sent
    }
}
