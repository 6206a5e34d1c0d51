//! Reply threads.

use super::Message;

/// A thread root and its replies.
///
/// Replies are kept in the order they were encountered during ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thread {
    root: Option<Message>,
    replies: Vec<Message>,
}

impl Thread {
    /// The message that started the thread, if it has been seen.
    #[must_use]
    pub fn root(&self) -> Option<&Message> {
        self.root.as_ref()
    }

    /// Replies in encounter order.
    #[must_use]
    pub fn replies(&self) -> &[Message] {
        &self.replies
    }

    /// Number of replies.
    #[must_use]
    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }

    pub(crate) fn set_root(&mut self, root: Message) {
        self.root = Some(root);
    }

    pub(crate) fn push_reply(&mut self, reply: Message) {
        self.replies.push(reply);
    }
}
