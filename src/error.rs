//! Error types used throughout the bot.
//!
//! [BotError] is the error type handed to [poise]. Errors that are the user's
//! fault live in [UserError] and are shown to them without being logged as errors.

use std::time::Duration;

use serenity::Permissions;
use thiserror::Error;

use crate::serenity;

/// Every error the bot can run into.
#[derive(Error, Debug)]
pub enum BotError {
    #[error(transparent)]
    UserError(#[from] UserError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Attendance data is unavailable: {reason}")]
    AttendanceUnavailable { reason: String },

    #[error("Could not list guild members: {reason}")]
    MembersUnavailable { reason: String },

    #[error("PERSCOM returned {status} for {endpoint}")]
    PerscomStatus {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("Check failed: {}", .reason.as_deref().unwrap_or("no reason given"))]
    CheckFailed { reason: Option<String> },

    #[error("Command panicked: {}", .payload.as_deref().unwrap_or("<no payload>"))]
    Panic { payload: Option<String> },

    #[error("Command structure mismatch: {description}")]
    CommandStructureMismatch { description: String },
}

/// Errors caused by user input or user state.
/// The message is shown to the user as is.
#[derive(Error, Debug)]
pub enum UserError {
    #[error("`{input}` is not a valid date. Use the `MM/YYYY` format, e.g. `03/2024`.")]
    MalformedDate { input: String },

    #[error("Month `{month}` doesn't exist. Months go from 1 to 12.")]
    InvalidMonth { month: u32 },

    #[error("Attendance tracking began on {tracking_start}, pick a later month.")]
    BeforeTracking { tracking_start: String },

    #[error("That month hasn't happened yet.")]
    FutureDate,

    #[error("This command only works in a server.")]
    GuildOnly,

    #[error("This command only works in DMs.")]
    DmOnly,

    #[error("This command only works in NSFW channels.")]
    NsfwOnly,

    #[error("Only bot owners can use this command.")]
    NotOwner,

    #[error("Couldn't understand `{}`.", .input.as_deref().unwrap_or("the arguments"))]
    BadArgs { input: Option<String> },

    #[error("Pick one of the subcommands: {subcmds}.")]
    MissingSubcommand { subcmds: String },

    #[error("Slow down! Try again in {} seconds.", .remaining_cooldown.as_secs().max(1))]
    OnCooldown { remaining_cooldown: Duration },

    #[error("I'm missing these permissions: {missing_permissions}")]
    MissingBotPermissions { missing_permissions: Permissions },

    #[error("You're missing these permissions: {}", .missing_permissions.map_or("unknown".to_string(), |p| p.to_string()))]
    MissingUserPermissions {
        missing_permissions: Option<Permissions>,
    },
}

/// Errors reading the config file on startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing config file. {action_msg}")]
    MissingConfig { action_msg: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Failed to access config file: {0}")]
    IoError(std::io::Error),
}
