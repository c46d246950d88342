use super::{CommandContext, HandlerResult};
use crate::world::buffs::ActiveBuff;
use crate::world::types::BuffId;

/// Install a buff from the catalog on the target, or restart it if already active.
pub fn apply(ctx: &mut CommandContext<'_>, buff_id: BuffId) -> HandlerResult {
    let spec = ctx.world.buff_spec(buff_id)?.clone();
    let character = ctx.world.character_mut(ctx.actor)?;
    let fresh = ActiveBuff::from_spec(&spec);
    match character.buffs.iter_mut().find(|b| b.buff_id == buff_id) {
        Some(active) => *active = fresh,
        None => character.buffs.push(fresh),
    }
    if let Some(text) = &spec.start_message {
        ctx.messages.to_actor(ctx.actor, text, true);
    }
    Ok(())
}
