//! Guild members and picking one of them.

pub mod members;
pub mod select;

use serenity::Member;
use serenity::UserId;

use crate::serenity;

/// The parts of a guild member the bot cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub id: UserId,
    pub display_name: String,
}

impl From<&Member> for MemberEntry {
    fn from(member: &Member) -> Self {
        Self {
            id: member.user.id,
            display_name: member.display_name().to_string(),
        }
    }
}
