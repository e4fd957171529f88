//! Implements the `/perscom_sync` command.
//!
//! Removes applicants whose latest application status is one of the
//! configured purge statuses, then clears the PERSCOM cache.

use poise::CreateReply;
use tracing::instrument;

use crate::perscom;
use crate::BotError;
use crate::Context;

/// Remove rejected applicants from PERSCOM.
#[instrument(skip(ctx))]
#[poise::command(slash_command, owners_only, global_cooldown = 30)]
pub async fn perscom_sync(ctx: Context<'_>) -> Result<(), BotError> {
    // Walking every page takes longer than discord waits for a response.
    ctx.defer_ephemeral().await?;

    let data = ctx.data();
    let report = perscom::sync_applicants(&data.perscom, data.start_page, &data.purge_statuses).await;

    let reply = CreateReply::default()
        .ephemeral(true)
        .content(report.to_string());
    ctx.send(reply).await?;

    Ok(())
}
