//! User-visible output of the board: notices and the clipboard.

use std::fmt::{Display, Formatter, Result as FmtResult};

use anyhow::Result;
use async_trait::async_trait;

pub mod impls;

/// Message shown to the user once an action settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Welcome { username: String },
    ProfileSaved,
    PostCreated,
    PostUpdated,
    PostDeleted,
    MessageSent,
    OwnPost,
    LinkCopied(String),
    /// The clipboard refused the link; shown for manual copying.
    CopyManually(String),
    Failed { action: &'static str, message: String },
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Notice::Welcome { username } => write!(f, "Welcome, {}!", username),
            Notice::ProfileSaved => f.write_str("Profile updated!"),
            Notice::PostCreated => f.write_str("Post published."),
            Notice::PostUpdated => f.write_str("Post updated."),
            Notice::PostDeleted => f.write_str("Post deleted."),
            Notice::MessageSent => f.write_str("Message sent."),
            Notice::OwnPost => f.write_str("This is your post."),
            Notice::LinkCopied(_) => f.write_str("Link copied."),
            Notice::CopyManually(link) => write!(f, "Copy this link: {}", link),
            Notice::Failed { action, message } => write!(f, "Cannot {}: {}", action, message),
        }
    }
}

#[async_trait]
pub trait NoticePresenter {
    async fn complete(&self, notice: Notice) -> Result<()>;
}

pub trait Clipboard {
    fn write(&self, text: &str) -> Result<()>;
}
