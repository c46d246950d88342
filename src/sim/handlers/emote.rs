use super::{CommandContext, HandlerResult};

/// `emote <text>`: narrate an action to the actor's room.
pub fn handle(ctx: &mut CommandContext<'_>, args: &str) -> HandlerResult {
    if args.trim().is_empty() {
        ctx.reply("Emote what?");
        return Ok(());
    }
    narrate(ctx, args)
}

/// Show `<name> <text>` to everyone in the actor's room, the actor included.
pub fn narrate(ctx: &mut CommandContext<'_>, text: &str) -> HandlerResult {
    let room_id = ctx.world.character(ctx.actor)?.room_id;
    let line = format!("{} {}", ctx.world.actor_name(ctx.actor), text.trim());
    ctx.messages.to_room(room_id, &line, true, &[]);
    Ok(())
}
