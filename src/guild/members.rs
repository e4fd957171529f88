//! Listing the human members of a guild.
//!
//! The cache is tried first. If it has nothing, members are fetched over HTTP,
//! and if that fails the cache is consulted once more.

use std::future::Future;

use serenity::Member;
use serenity::UserId;
use tracing::instrument;

use super::MemberEntry;
use crate::error::UserError;
use crate::serenity;
use crate::BotError;
use crate::Context;

/// Max members discord returns per request.
const FETCH_LIMIT: u64 = 1000;

/// Humans of the invoking guild, sorted by display name.
#[instrument(skip(ctx), fields(guild = ?ctx.guild_id()))]
pub async fn list_human_members(ctx: &Context<'_>) -> Result<Vec<MemberEntry>, BotError> {
    let guild_id = ctx.guild_id().ok_or(UserError::GuildOnly)?;

    let cached = cached_members(ctx);
    let members = if !cached.is_empty() {
        tracing::debug!("Using {} cached members.", cached.len());
        cached
    } else {
        let fetched = fetch_paged(FETCH_LIMIT, |member: &Member| member.user.id, |after| {
            guild_id.members(ctx.http(), Some(FETCH_LIMIT), after)
        })
        .await;
        match fetched {
            Ok(fetched) => {
                tracing::debug!("Fetched {} members.", fetched.len());
                humans(fetched.iter())
            }
            Err(e) => {
                tracing::warn!("Failed to fetch members, falling back to cache. {e}");
                cached_members(ctx)
            }
        }
    };

    if members.is_empty() {
        return Err(BotError::MembersUnavailable {
            reason: format!("no members found for guild {guild_id}"),
        });
    }

    Ok(sort_entries(members))
}

/// Request pages of `limit` items, each starting after the last id seen,
/// until a short page comes back.
async fn fetch_paged<T, E, F, Fut>(
    limit: u64,
    id_of: impl Fn(&T) -> UserId,
    mut fetch: F,
) -> Result<Vec<T>, E>
where
    F: FnMut(Option<UserId>) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let mut all = Vec::new();
    let mut after = None;
    loop {
        let page = fetch(after).await?;
        let full = page.len() as u64 >= limit;
        let last = page.last().map(&id_of);
        all.extend(page);
        match last {
            Some(last) if full => after = Some(last),
            _ => return Ok(all),
        }
    }
}

/// Humans in the cached guild, if it is cached.
fn cached_members(ctx: &Context<'_>) -> Vec<MemberEntry> {
    ctx.guild()
        .map(|guild| humans(guild.members.values()))
        .unwrap_or_default()
}

/// Drop bots.
fn humans<'a>(members: impl Iterator<Item = &'a Member>) -> Vec<MemberEntry> {
    members
        .filter(|member| !member.user.bot)
        .map(MemberEntry::from)
        .collect()
}

/// Sort case-insensitively by display name, then by id so the order is stable.
fn sort_entries(mut members: Vec<MemberEntry>) -> Vec<MemberEntry> {
    members.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then(a.id.cmp(&b.id))
    });
    members.dedup_by_key(|member| member.id);
    members
}
