use thiserror::Error;

use crate::world::types::{Actor, BuffId, ItemId, MobInstanceId, RoomId, UserId};

/// Errors raised while a handler works against the world.
///
/// All of these are expected at runtime: a delayed command can fire after
/// its target logged off or despawned. The scheduler logs and drops them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("mob instance {0} not found")]
    MobNotFound(MobInstanceId),

    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("buff {0} not found")]
    BuffNotFound(BuffId),

    /// The actor kind has no character (the system actor).
    #[error("actor {0} not found")]
    ActorNotFound(Actor),

    /// Privileged command issued by an actor without the level for it.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("internal error: {0}")]
    Internal(String),
}
