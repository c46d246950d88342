//! Operator commands on the privileged text channel.
//!
//! Lines starting with `/` from an admin-level user are parsed here instead of
//! being queued as game commands:
//!
//! * `/shutdown [seconds]` starts (or restarts) the countdown
//! * `/shutdown cancel` stops it
//! * `/where` lists online users and where they are
//! * `/adminhelp [command]`

use log::{info, warn};
use thiserror::Error;

use crate::roles::{is_admin, role_name};
use crate::sim::scheduler::SimulationHandle;
use crate::world::types::{RoomId, UserId};
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Shutdown(Option<u64>),
    CancelShutdown,
    Where,
    Help(Option<String>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("not an admin command")]
    NotAdminCommand,
    #[error("unknown admin command: /{0}")]
    UnknownCommand(String),
    #[error("invalid argument for /{command}: {value}")]
    InvalidArgument { command: &'static str, value: String },
    #[error("permission denied")]
    PermissionDenied,
    #[error("simulation is not running")]
    NotRunning,
}

const HELP_TOPICS: &[(&str, &str, &str)] = &[
    (
        "shutdown",
        "/shutdown [seconds|cancel]",
        "Count down and stop the world. Defaults to the configured delay. A new request restarts the countdown.",
    ),
    (
        "where",
        "/where",
        "List online users with their character, zone and room.",
    ),
    (
        "adminhelp",
        "/adminhelp [command]",
        "Show admin commands, or details for one.",
    ),
];

pub fn parse_admin(line: &str) -> Result<AdminCommand, AdminError> {
    let line = line.trim();
    let body = line.strip_prefix('/').ok_or(AdminError::NotAdminCommand)?;
    let mut words = body.split_whitespace();
    let verb = words.next().unwrap_or("").to_lowercase();
    let arg = words.next();
    match verb.as_str() {
        "shutdown" => match arg {
            None => Ok(AdminCommand::Shutdown(None)),
            Some(a) if a.eq_ignore_ascii_case("cancel") => Ok(AdminCommand::CancelShutdown),
            Some(a) => a
                .parse::<u64>()
                .map(|s| AdminCommand::Shutdown(Some(s)))
                .map_err(|_| AdminError::InvalidArgument {
                    command: "shutdown",
                    value: a.to_string(),
                }),
        },
        "where" => Ok(AdminCommand::Where),
        "adminhelp" => Ok(AdminCommand::Help(arg.map(|a| {
            a.trim_start_matches('/').to_lowercase()
        }))),
        other => Err(AdminError::UnknownCommand(other.to_string())),
    }
}

pub fn help_text(topic: Option<&str>) -> String {
    match topic {
        None => {
            let mut out = String::from("Admin commands:\n");
            for (_, usage, _) in HELP_TOPICS {
                out.push_str("  ");
                out.push_str(usage);
                out.push('\n');
            }
            out
        }
        Some(topic) => HELP_TOPICS
            .iter()
            .find(|(name, _, _)| *name == topic)
            .map(|(_, usage, detail)| format!("{}\n  {}\n", usage, detail))
            .unwrap_or_else(|| format!("No help for '{}'.\n", topic)),
    }
}

/// One row of the `/where` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereEntry {
    pub user_id: UserId,
    pub username: String,
    pub character: String,
    pub zone: String,
    pub room_id: RoomId,
    pub room_title: String,
    pub role: u8,
}

pub fn where_entries(world: &World) -> Vec<WhereEntry> {
    world
        .online_users()
        .map(|u| {
            let room = world.rooms.get(&u.character.room_id);
            WhereEntry {
                user_id: u.user_id,
                username: u.username.clone(),
                character: u.character.name.clone(),
                zone: room.map(|r| r.zone.clone()).unwrap_or_default(),
                room_id: u.character.room_id,
                room_title: room.map(|r| r.title.clone()).unwrap_or_else(|| "?".into()),
                role: u.role,
            }
        })
        .collect()
}

pub fn render_where(entries: &[WhereEntry]) -> String {
    let mut out = format!(
        "{:<5} {:<12} {:<12} {:<10} {:<24} {}\n",
        "ID", "User", "Character", "Zone", "Room", "Role"
    );
    for e in entries {
        out.push_str(&format!(
            "{:<5} {:<12} {:<12} {:<10} {:<24} {}\n",
            e.user_id,
            e.username,
            e.character,
            e.zone,
            format!("{} ({})", e.room_title, e.room_id),
            role_name(e.role)
        ));
    }
    out.push_str(&format!("{} online\n", entries.len()));
    out
}

/// Run an admin line for a user at `level` and return the reply text.
pub async fn execute(
    handle: &SimulationHandle,
    user_id: UserId,
    level: u8,
    line: &str,
) -> Result<String, AdminError> {
    let command = parse_admin(line)?;
    if !is_admin(level) {
        warn!(target: "security", "user {} attempted admin command: {}", user_id, line.trim());
        return Err(AdminError::PermissionDenied);
    }
    info!(target: "security", "user {} ran admin command: {}", user_id, line.trim());
    match command {
        AdminCommand::Shutdown(seconds) => {
            let used = handle.shutdown(seconds).await.ok_or(AdminError::NotRunning)?;
            Ok(format!("Shutdown in {} seconds.\n", used))
        }
        AdminCommand::CancelShutdown => {
            let cancelled = handle
                .cancel_shutdown()
                .await
                .ok_or(AdminError::NotRunning)?;
            Ok(if cancelled {
                "Shutdown cancelled.\n".to_string()
            } else {
                "No shutdown is pending.\n".to_string()
            })
        }
        AdminCommand::Where => {
            let entries = handle.where_online().await.ok_or(AdminError::NotRunning)?;
            Ok(render_where(&entries))
        }
        AdminCommand::Help(topic) => Ok(help_text(topic.as_deref())),
    }
}
