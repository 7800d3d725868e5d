//! Per-conversation repair rule applied when a user leaves the system.
//!
//! Pure: decides whether a conversation is saved (with its new members and creator)
//! or deleted. Storage effects are carried out by the reconciler.

use crate::domain::{Conversation, RecordId};
use rand::Rng;

/// How a replacement creator is chosen from the remaining members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreatorSelection {
    /// Promote the first remaining member.
    First,
    /// Promote a uniformly random remaining member.
    #[default]
    Random,
}

impl From<&str> for CreatorSelection {
    /// Only the literal `"first"` selects [`CreatorSelection::First`]; anything else is random.
    fn from(value: &str) -> Self {
        match value {
            "first" => Self::First,
            _ => Self::Random,
        }
    }
}

impl From<String> for CreatorSelection {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Delete conversations left without members when their creator is still around.
    /// When false they are kept, memberless, as an archive.
    pub remove_empty_conversations: bool,
    pub new_creator_selection: CreatorSelection,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            remove_empty_conversations: true,
            new_creator_selection: CreatorSelection::Random,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteReason {
    /// The departing creator was the last participant; nobody can inherit ownership.
    CreatorLeftNoMembers,
    /// The last member left and empty conversations are not kept.
    NoMembersLeft,
}

/// Outcome of repairing one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    Save(Conversation),
    Delete { id: RecordId, reason: DeleteReason },
}

/// Remove `departing` from `conversation` and restore the creator invariant.
///
/// `pick` receives the number of remaining members (always at least 1) and returns an
/// index; it is only consulted for [`CreatorSelection::Random`].
pub fn repair_conversation(
    mut conversation: Conversation,
    departing: &RecordId,
    options: &ReconcileOptions,
    pick: impl FnOnce(usize) -> usize,
) -> Repair {
    conversation.members.retain(|m| m != departing);
    let remaining = conversation.members.len();

    if conversation.creator == *departing {
        if remaining == 0 {
            return Repair::Delete {
                id: conversation.id,
                reason: DeleteReason::CreatorLeftNoMembers,
            };
        }
        let index = match options.new_creator_selection {
            CreatorSelection::First => 0,
            CreatorSelection::Random => pick(remaining).min(remaining - 1),
        };
        conversation.creator = conversation.members[index].clone();
        return Repair::Save(conversation);
    }

    if remaining == 0 && options.remove_empty_conversations {
        return Repair::Delete {
            id: conversation.id,
            reason: DeleteReason::NoMembersLeft,
        };
    }

    Repair::Save(conversation)
}

/// Uniform index in `0..len`. `len` must be non-zero.
pub fn random_index(len: usize) -> usize {
    rand::thread_rng().gen_range(0..len)
}
