use crate::entities::{Chat, Post, PostId};

/// A modal owned by the board state instead of an imperative handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog<T> {
    Closed,
    Open(T),
}

impl<T> Default for Dialog<T> {
    fn default() -> Self { Dialog::Closed }
}

impl<T> Dialog<T> {
    pub fn open(&mut self, payload: T) { *self = Dialog::Open(payload); }

    /// Closes the dialog, handing back what it held.
    pub fn close(&mut self) -> Option<T> {
        match ::std::mem::replace(self, Dialog::Closed) {
            Dialog::Open(t) => Some(t),
            Dialog::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool { matches!(self, Dialog::Open(_)) }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Dialog::Open(t) => Some(t),
            Dialog::Closed => None,
        }
    }

    pub fn payload_mut(&mut self) -> Option<&mut T> {
        match self {
            Dialog::Open(t) => Some(t),
            Dialog::Closed => None,
        }
    }
}

/// Conversation opened from a post card or the inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTarget {
    /// `None` when the chat's post is no longer listed.
    pub post: Option<Post>,
    /// `None` while the chat is being resolved.
    pub chat: Option<Chat>,
}

impl MessageTarget {
    pub fn is_loading(&self) -> bool { self.chat.is_none() }

    pub fn title(&self) -> &str { self.post.as_ref().map_or("Chat", |p| p.title.as_str()) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dialogs {
    /// Holds the last login error, empty when there is none.
    pub login: Dialog<String>,
    pub create: Dialog<()>,
    pub edit: Dialog<Post>,
    pub confirm_delete: Dialog<PostId>,
    pub message: Dialog<MessageTarget>,
    /// Conversation list of the current user.
    pub inbox: Dialog<()>,
    pub profile: Dialog<()>,
}
