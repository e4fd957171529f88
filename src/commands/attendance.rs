//! Implements the `/attendance` command.
//!
//! The author picks a member from a paged menu and the menu is replaced with
//! that member's raid calendar for the requested month.

use chrono::Utc;
use poise::CreateReply;
use poise::ReplyHandle;
use tracing::instrument;

use crate::calendar;
use crate::calendar::month::resolve_month;
use crate::calendar::MonthChoice;
use crate::guild::members;
use crate::guild::select;
use crate::guild::select::SelectionOutcome;
use crate::BotError;
use crate::Context;

/// Replace the selection prompt with `content`.
async fn finish(ctx: Context<'_>, handle: ReplyHandle<'_>, content: String) -> Result<(), BotError> {
    let reply = CreateReply::default().content(content).components(vec![]);
    handle.edit(ctx, reply).await?;
    Ok(())
}

/// Show a member's raid attendance for a month.
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only, user_cooldown = 5)]
pub async fn attendance(
    ctx: Context<'_>,
    #[description = "Which month to show"] month: Option<MonthChoice>,
    #[description = "A specific month, as MM/YYYY"] custom_date: Option<String>,
) -> Result<(), BotError> {
    let data = ctx.data();
    let now = Utc::now();

    // Validate before talking to anything else.
    let month = resolve_month(
        month,
        custom_date.as_deref(),
        &data.calendar.tracking_start,
        &now,
    )?;

    let members = members::list_human_members(&ctx).await?;

    let (outcome, handle) = select::select_member(ctx, &members, &data.selection).await?;
    let member = match outcome {
        SelectionOutcome::Selected(member) => member,
        SelectionOutcome::TimedOut => {
            let secs = data.selection.timeout.as_secs();
            return finish(ctx, handle, format!("No member picked within {secs} seconds.")).await;
        }
        SelectionOutcome::Cancelled => {
            return finish(ctx, handle, "Cancelled.".to_string()).await;
        }
    };

    let name = &member.display_name;
    tracing::info!("Showing {month} attendance of {name}");

    let records = match data.attendance.attendance_for(name).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Failed to get attendance of {name}. {e}");
            let content = "Attendance data is unavailable right now. Please try again later.";
            return finish(ctx, handle, content.to_string()).await;
        }
    };

    let view = calendar::render_calendar(name, &records, month, now, &data.calendar);
    finish(ctx, handle, calendar::to_code_block(&view)).await
}
