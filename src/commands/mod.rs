//! Bot commands.

mod attendance;
mod perscom_sync;

use crate::{BotError, Data};

/// Convenient type alias for [poise::Command].
pub type Command = poise::Command<Data, BotError>;

/// Lists all the implemented commands
pub fn list() -> Vec<Command> {
    vec![attendance::attendance(), perscom_sync::perscom_sync()]
}
