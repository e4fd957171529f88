//! Builds the client and everything it needs.

mod config;
mod framework;

use std::sync::Arc;

use crate::attendance::JsonAttendanceStore;
use crate::data::Data;
use crate::perscom::PerscomClient;
use crate::serenity;
use crate::BotError;

pub use config::Config;

/// Constructs a [serenity::Client] with the [PerscomClient] and attendance store ready.
pub(super) async fn client(config: Config) -> Result<serenity::Client, BotError> {
    // Get discord token from config file
    let token = config.token()?.clone();

    // Intents we wish to use
    // See https://discord.com/developers/docs/topics/gateway#gateway-intents
    // Listing members needs the privileged GUILD_MEMBERS intent.
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::GUILD_MEMBERS;

    let perscom = PerscomClient::new(
        config.perscom_url(),
        config.perscom_token()?,
        config.perscom_id(),
    )?;
    let attendance = Arc::new(JsonAttendanceStore::new(config.attendance_store()));

    // The notify list needs the framework, it is filled in on startup.
    let data = Data {
        notify_list: Default::default(),
        perscom,
        attendance,
        calendar: config.calendar_settings(),
        selection: config.selection_settings(),
        start_page: config.submissions_start_page(),
        purge_statuses: config.purge_statuses().to_vec(),
    };

    let client = serenity::ClientBuilder::new(token, intents)
        .framework(framework::framework(config, data))
        .await?;

    Ok(client)
}
