//! Picking a guild member from a paged select menu.
//!
//! Discord caps select menus at 25 options, so members are split into pages
//! and the last option of a page moves to the next one. Paging is an explicit
//! loop over [MemberPager] state.

use std::time::Duration;

use poise::CreateReply;
use poise::ReplyHandle;
use serenity::ButtonStyle;
use serenity::ComponentInteraction;
use serenity::ComponentInteractionCollector;
use serenity::ComponentInteractionDataKind;
use serenity::CreateActionRow;
use serenity::CreateButton;
use serenity::CreateInteractionResponse;
use serenity::CreateInteractionResponseMessage;
use serenity::CreateSelectMenu;
use serenity::CreateSelectMenuKind;
use serenity::CreateSelectMenuOption;
use tracing::instrument;

use super::MemberEntry;
use crate::serenity;
use crate::BotError;
use crate::Context;

/// Value of the option that moves to the next page.
pub const NEXT_PAGE: &str = "next_page";

/// Most members a page can hold, leaving room for the next page option.
pub const MAX_PAGE_SIZE: usize = 24;

/// How the selection menu behaves.
#[derive(Debug, Clone)]
pub struct SelectionSettings {
    /// Members per page.
    pub page_size: usize,
    /// How long to wait for each choice.
    pub timeout: Duration,
}

/// How a selection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected(MemberEntry),
    TimedOut,
    Cancelled,
}

/// What a selected option refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick<'a> {
    Member(&'a MemberEntry),
    NextPage,
}

/// A single page of members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a> {
    pub entries: &'a [MemberEntry],
    /// Whether the next page option is shown.
    pub has_next: bool,
}

/// Page state over a list of members.
#[derive(Debug, Clone)]
pub struct MemberPager<'a> {
    members: &'a [MemberEntry],
    page_size: usize,
    page: usize,
}

impl<'a> MemberPager<'a> {
    /// `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(members: &'a [MemberEntry], page_size: usize) -> Self {
        Self {
            members,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            page: 0,
        }
    }

    /// Number of pages, at least one.
    pub fn page_count(&self) -> usize {
        self.members.len().div_ceil(self.page_size).max(1)
    }

    /// 0-indexed current page.
    pub fn page_index(&self) -> usize {
        self.page
    }

    /// The current page.
    pub fn page(&self) -> Page<'a> {
        let start = (self.page * self.page_size).min(self.members.len());
        let end = (start + self.page_size).min(self.members.len());
        Page {
            entries: &self.members[start..end],
            has_next: self.page_count() > 1,
        }
    }

    /// Move to the next page, wrapping around after the last.
    pub fn advance(&mut self) {
        self.page = (self.page + 1) % self.page_count();
    }

    /// What the selected `value` refers to on the current page.
    pub fn resolve(&self, value: &str) -> Option<Pick<'a>> {
        let page = self.page();
        if value == NEXT_PAGE {
            return page.has_next.then_some(Pick::NextPage);
        }
        let id: u64 = value.parse().ok()?;
        page.entries
            .iter()
            .find(|member| member.id.get() == id)
            .map(Pick::Member)
    }
}

/// Message content shown above the menu.
fn prompt(pager: &MemberPager) -> String {
    format!(
        "Whose attendance do you want to see? (page {}/{})",
        pager.page_index() + 1,
        pager.page_count()
    )
}

/// Menu and cancel button for the current page.
fn components(pager: &MemberPager, menu_id: &str, cancel_id: &str) -> Vec<CreateActionRow> {
    let page = pager.page();

    let mut options: Vec<_> = page
        .entries
        .iter()
        .map(|member| CreateSelectMenuOption::new(&member.display_name, member.id.to_string()))
        .collect();
    if page.has_next {
        options.push(
            CreateSelectMenuOption::new("Next page ▶", NEXT_PAGE).description("Show more members"),
        );
    }

    let menu = CreateSelectMenu::new(menu_id, CreateSelectMenuKind::String { options })
        .placeholder("Pick a member");
    let cancel = CreateButton::new(cancel_id)
        .label("Cancel")
        .style(ButtonStyle::Danger);

    vec![
        CreateActionRow::SelectMenu(menu),
        CreateActionRow::Buttons(vec![cancel]),
    ]
}

/// The first selected value of a string select menu.
fn selected_value(press: &ComponentInteraction) -> Option<&str> {
    match &press.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => {
            values.first().map(String::as_str)
        }
        _ => None,
    }
}

/// Ask the author to pick one of `members`.
///
/// Returns how the selection ended together with the prompt message, so the
/// caller can replace it with the result.
#[instrument(skip_all, fields(members = members.len()))]
pub async fn select_member<'a>(
    ctx: Context<'a>,
    members: &[MemberEntry],
    settings: &SelectionSettings,
) -> Result<(SelectionOutcome, ReplyHandle<'a>), BotError> {
    let ctx_id = ctx.id();
    let menu_id = format!("{ctx_id}member");
    let cancel_id = format!("{ctx_id}cancel");

    let mut pager = MemberPager::new(members, settings.page_size);

    let reply = CreateReply::default()
        .ephemeral(true)
        .content(prompt(&pager))
        .components(components(&pager, &menu_id, &cancel_id));
    let handle = ctx.send(reply).await?;

    let outcome = loop {
        let prefix = ctx_id.to_string();
        let press = ComponentInteractionCollector::new(ctx.serenity_context())
            .author_id(ctx.author().id)
            .filter(move |press| press.data.custom_id.starts_with(&prefix))
            .timeout(settings.timeout)
            .await;

        let Some(press) = press else {
            tracing::debug!("Selection timed out.");
            break SelectionOutcome::TimedOut;
        };

        if press.data.custom_id == cancel_id {
            press
                .create_response(ctx, CreateInteractionResponse::Acknowledge)
                .await?;
            break SelectionOutcome::Cancelled;
        }

        match selected_value(&press).and_then(|value| pager.resolve(value)) {
            Some(Pick::Member(member)) => {
                press
                    .create_response(ctx, CreateInteractionResponse::Acknowledge)
                    .await?;
                break SelectionOutcome::Selected(member.clone());
            }
            Some(Pick::NextPage) => {
                pager.advance();
                tracing::debug!("Showing page {}.", pager.page_index() + 1);
                let update = CreateInteractionResponseMessage::new()
                    .content(prompt(&pager))
                    .components(components(&pager, &menu_id, &cancel_id));
                press
                    .create_response(ctx, CreateInteractionResponse::UpdateMessage(update))
                    .await?;
            }
            // Stale menu or unexpected component, keep waiting.
            None => {
                press
                    .create_response(ctx, CreateInteractionResponse::Acknowledge)
                    .await?;
            }
        }
    };

    Ok((outcome, handle))
}

#[cfg(test)]
mod tests {
    use serenity::UserId;

    use super::*;

    fn members(count: u64) -> Vec<MemberEntry> {
        (1..=count)
            .map(|id| MemberEntry {
                id: UserId::new(id),
                display_name: format!("Member {id}"),
            })
            .collect()
    }

    #[test]
    fn splits_into_pages() {
        let all = members(50);
        let mut pager = MemberPager::new(&all, 24);
        assert_eq!(pager.page_count(), 3);

        let first = pager.page();
        assert_eq!(first.entries.len(), 24);
        assert!(first.has_next);
        assert_eq!(first.entries[0].id, UserId::new(1));

        pager.advance();
        pager.advance();
        let last = pager.page();
        assert_eq!(last.entries.len(), 2);
        assert_eq!(last.entries[0].id, UserId::new(49));
    }

    #[test]
    fn advancing_past_last_page_wraps() {
        let all = members(30);
        let mut pager = MemberPager::new(&all, 24);
        pager.advance();
        assert_eq!(pager.page_index(), 1);
        pager.advance();
        assert_eq!(pager.page_index(), 0);
    }

    #[test]
    fn single_page_has_no_next() {
        let all = members(24);
        let pager = MemberPager::new(&all, 24);
        assert_eq!(pager.page_count(), 1);
        assert!(!pager.page().has_next);
        assert_eq!(pager.resolve(NEXT_PAGE), None);
    }

    #[test]
    fn resolves_members_on_current_page_only() {
        let all = members(30);
        let mut pager = MemberPager::new(&all, 24);

        assert_eq!(pager.resolve("3"), Some(Pick::Member(&all[2])));
        assert_eq!(pager.resolve("27"), None);
        assert_eq!(pager.resolve(NEXT_PAGE), Some(Pick::NextPage));

        pager.advance();
        assert_eq!(pager.resolve("27"), Some(Pick::Member(&all[26])));
        assert_eq!(pager.resolve("3"), None);
    }

    #[test]
    fn garbage_values_resolve_to_nothing() {
        let all = members(5);
        let pager = MemberPager::new(&all, 24);
        assert_eq!(pager.resolve("not an id"), None);
        assert_eq!(pager.resolve(""), None);
    }

    #[test]
    fn page_size_is_clamped() {
        let all = members(60);
        assert_eq!(MemberPager::new(&all, 100).page().entries.len(), MAX_PAGE_SIZE);
        assert_eq!(MemberPager::new(&all, 0).page_count(), 60);
    }

    #[test]
    fn empty_list_has_one_empty_page() {
        let pager = MemberPager::new(&[], 24);
        assert_eq!(pager.page_count(), 1);
        assert!(pager.page().entries.is_empty());
    }
}
