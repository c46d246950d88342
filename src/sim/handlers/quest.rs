use log::debug;

use super::{CommandContext, HandlerResult};
use crate::world::quest_id_of;
use crate::world::types::Actor;

/// Record a quest progress token on the target user. Each token is recorded
/// once; repeats are ignored. Mobs do not track quests.
pub fn trigger(ctx: &mut CommandContext<'_>, token: &str) -> HandlerResult {
    let Actor::User(user_id) = ctx.actor else {
        debug!("ignoring quest token {} for {}", token, ctx.actor);
        return Ok(());
    };
    let user = ctx.world.user_mut(user_id)?;
    if !user.character.quest_tokens.insert(token.to_string()) {
        return Ok(());
    }
    let name = quest_id_of(token)
        .and_then(|id| ctx.world.quests.get(&id))
        .map(|q| q.name.clone());
    let text = match name {
        Some(name) => format!("Quest updated: {}", name),
        None => "Quest updated.".to_string(),
    };
    ctx.messages.to_actor(ctx.actor, &text, true);
    Ok(())
}
