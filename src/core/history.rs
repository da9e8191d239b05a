//! Which stored messages are resent with each request.

use crate::core::message::Message;

pub trait HistoryPolicy: Send + Sync {
    /// The contiguous tail of `messages` to send, in store order.
    fn select<'a>(&self, messages: &'a [Message]) -> &'a [Message];
}

/// Resend the whole conversation every turn. The remote model keeps no state
/// between calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct FullHistory;

impl HistoryPolicy for FullHistory {
    fn select<'a>(&self, messages: &'a [Message]) -> &'a [Message] {
        messages
    }
}

/// Resend only the most recent `limit` messages.
#[derive(Debug, Clone, Copy)]
pub struct RecentWindow {
    limit: usize,
}

impl RecentWindow {
    /// A window always includes at least the newest message.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }
}

impl HistoryPolicy for RecentWindow {
    fn select<'a>(&self, messages: &'a [Message]) -> &'a [Message] {
        let start = messages.len().saturating_sub(self.limit);
        &messages[start..]
    }
}

pub fn policy_for(window: Option<usize>) -> Box<dyn HistoryPolicy> {
    match window {
        Some(limit) => Box::new(RecentWindow::new(limit)),
        None => Box::new(FullHistory),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(len: usize) -> Vec<Message> {
        (0..len)
            .map(|i| Message::user(format!("m{i}"), i as i64))
            .collect()
    }

    #[test]
    fn full_history_keeps_everything() {
        let messages = conversation(5);
        assert_eq!(FullHistory.select(&messages).len(), 5);
    }

    #[test]
    fn recent_window_keeps_the_tail() {
        let messages = conversation(5);
        let selected = RecentWindow::new(2).select(&messages);
        let contents: Vec<_> = selected.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4"]);
    }

    #[test]
    fn window_larger_than_history_keeps_everything() {
        let messages = conversation(3);
        assert_eq!(RecentWindow::new(10).select(&messages).len(), 3);
    }

    #[test]
    fn zero_window_still_sends_newest_message() {
        let messages = conversation(3);
        let selected = RecentWindow::new(0).select(&messages);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].content, "m2");
    }

    #[test]
    fn policy_for_maps_config_value() {
        let messages = conversation(4);
        assert_eq!(policy_for(None).select(&messages).len(), 4);
        assert_eq!(policy_for(Some(1)).select(&messages).len(), 1);
    }
}
