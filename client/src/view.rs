//! Derived, read-only views over store state.
//!
//! Nothing here is cached: callers recompute on every read.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

use crate::models::Conversation;

const PREVIEW_CHARS: usize = 50;

/// Conversations whose messages contain `query` (case-insensitive), newest first.
///
/// A blank query keeps every conversation. Otherwise the query is matched
/// as typed, surrounding whitespace included. A conversation without
/// messages never matches a non-blank query.
pub fn filter_and_sort<'a>(conversations: &'a [Conversation], query: &str) -> Vec<&'a Conversation> {
    let blank = query.trim().is_empty();
    let query = query.to_lowercase();
    let mut visible: Vec<&Conversation> = conversations
        .iter()
        .filter(|c| {
            blank
                || c.messages
                    .iter()
                    .any(|m| m.content.to_lowercase().contains(&query))
        })
        .collect();
    visible.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    visible
}

/// One-line summary of a conversation: its last message, truncated.
pub fn preview(conversation: &Conversation) -> String {
    match conversation.messages.last() {
        Some(last) => {
            let mut chars = last.content.chars();
            let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
            if chars.next().is_some() {
                format!("{head}...")
            } else {
                head
            }
        }
        None => "No messages yet".to_string(),
    }
}

/// Short label for when a conversation was last updated, relative to `now`.
///
/// Days are counted in `now`'s time zone and the label is printed in it too.
/// Timestamps later than `now` get the time-of-day label.
pub fn updated_label<Tz>(at: DateTime<Utc>, now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let at = at.with_timezone(&now.timezone());
    let days = (now.date_naive() - at.date_naive()).num_days();
    match days {
        i64::MIN..=0 => at.format("%H:%M").to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => at.format("%a").to_string(),
        _ => at.format("%b %-d").to_string(),
    }
}
