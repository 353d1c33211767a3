//! Gateway to the remote post/user/chat store.
//!
//! Every call returns an explicit [`Result`]; nothing is applied locally
//! until one of these calls has succeeded.

use async_trait::async_trait;
use thiserror::Error;

use crate::entities::{Chat, ChatId, Post, PostDraft, PostId, Profile, User, UserId};

pub mod http;
pub mod mock;

pub(crate) type Result<T> = ::std::result::Result<T, RepositoryError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The request never produced a response.
    #[error("network: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("decode: {0}")]
    Decode(String),

    #[error("cannot find object.")]
    NotFound,
}

impl RepositoryError {
    /// Message suitable for the user, preferring what the server said.
    pub fn user_message(&self) -> String {
        match self {
            RepositoryError::Status { message, .. } if !message.is_empty() => message.clone(),
            RepositoryError::Status { status, .. } => format!("request failed ({})", status),
            RepositoryError::Network(_) => "cannot reach the server".to_string(),
            RepositoryError::Decode(_) => "unexpected server response".to_string(),
            RepositoryError::NotFound => "not found".to_string(),
        }
    }
}

#[async_trait]
pub trait PostRepository {
    async fn finds(&self) -> Result<Vec<Post>>;

    /// The created post is attributed to `author`.
    async fn insert(&self, author: &User, draft: PostDraft) -> Result<Post>;

    async fn update(&self, id: &PostId, draft: PostDraft) -> Result<Post>;

    /// Flips `user_id` in the like list; returns the server's record.
    async fn toggle_liked(&self, id: &PostId, user_id: &UserId) -> Result<Post>;

    async fn delete(&self, id: &PostId) -> Result<()>;
}

#[async_trait]
pub trait UserRepository {
    /// Looks a user up by username or id.
    async fn find(&self, name_or_id: &str) -> Result<User>;

    async fn update_profile(&self, id: &UserId, profile: Profile) -> Result<Profile>;

    /// Exchanges an identity-provider credential for a user.
    async fn login(&self, credential: &str) -> Result<User>;
}

#[async_trait]
pub trait ChatRepository {
    /// Creates the chat about `post_id` for `user_id`, or returns the existing one.
    async fn open(&self, post_id: &PostId, user_id: &UserId) -> Result<Chat>;

    async fn send(&self, chat_id: &ChatId, sender: &UserId, text: &str) -> Result<()>;
}
