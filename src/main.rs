//! Discord bot that shows raid attendance calendars and keeps PERSCOM
//! applicants in sync.

mod attendance;
mod calendar;
mod commands;
mod data;
mod error;
mod guild;
mod log;
mod perscom;
mod setup;

use poise::serenity_prelude as serenity;

use data::Data;
use error::BotError;
use setup::Config;

/// Convenient type alias, the only [poise::Context] used.
type Context<'a> = poise::Context<'a, Data, BotError>;

#[tokio::main]
async fn main() -> Result<(), BotError> {
    let config = Config::read()?;

    // Dropping the guard stops file logging, keep it for the whole run.
    let _guard = log::install_tracing(&config);

    let mut client = setup::client(config).await?;
    client.start().await?;

    Ok(())
}
