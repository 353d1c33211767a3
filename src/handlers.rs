use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::board::dialog::{Dialogs, MessageTarget};
use crate::board::url::Location;
use crate::board::{pipeline, BoardState, Intent};
use crate::entities::{Chat, Message, Post, PostDraft, PostId, Profile, User, UserId};
use crate::notifications::Listener;
use crate::prefs::{KeyValueStore, Preferences};
use crate::presenters::{Clipboard, Notice, NoticePresenter};
use crate::repositories::{ChatRepository, PostRepository, RepositoryError, UserRepository};
use crate::utils::{format_ago, is_new, AlsoChain};

mod helpers;

use helpers::{find_post, remove_post, replace_post};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("login required.")]
    LoginRequired,

    #[error("only the author or an admin can change this post.")]
    Forbidden,

    #[error("this is your own post.")]
    OwnPost,

    #[error("not confirmed.")]
    Unconfirmed,

    #[error("no conversation is open.")]
    NoChat,

    #[error("invalid post: {0}")]
    InvalidDraft(String),

    /// The session or the dialog moved on while the request was in flight.
    #[error("response arrived for a state that is gone.")]
    Superseded,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type Result<T> = ::std::result::Result<T, ActionError>;

/// A post as rendered in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub post: Post,
    pub liked: bool,
    pub saved: bool,
    pub editable: bool,
    pub is_new: bool,
    pub ago: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub cards: Vec<Card>,
    /// Size of the visible set.
    pub total: usize,
    pub page: u32,
    pub has_more: bool,
    pub remaining: usize,
}

impl Listing {
    pub fn load_more_label(&self) -> Option<String> {
        match self.has_more {
            true => Some(format!("Load more ({} left)", self.remaining)),
            false => None,
        }
    }

    pub fn ids(&self) -> Vec<&str> { self.cards.iter().map(|c| c.post.id.as_str()).collect() }
}

pub(crate) struct View {
    posts: Vec<Post>,
    loaded: bool,
    board: BoardState,
    favorites: BTreeSet<PostId>,
    theme: String,
    user: Option<User>,
    dialogs: Dialogs,
    location: Location,
    anchor: Option<PostId>,
    load_seq: u64,
    epoch: u64,
    message_gen: u64,
}

impl View {
    /// The fragment is captured here, before the first address replacement.
    pub(crate) fn new(location: Location, favorites: BTreeSet<PostId>, theme: String) -> Self {
        Self {
            posts: vec![],
            loaded: false,
            board: BoardState::from_query(location.query()),
            favorites,
            theme,
            user: None,
            dialogs: Dialogs::default(),
            anchor: location.anchor(),
            location,
            load_seq: 0,
            epoch: 0,
            message_gen: 0,
        }
    }

    fn require_user(&mut self) -> Result<User> {
        match &self.user {
            Some(u) => Ok(u.clone()),
            None => {
                self.dialogs.login.open(String::new());
                Err(ActionError::LoginRequired)
            },
        }
    }

    fn require_editable(&mut self, id: &PostId) -> Result<(User, Post)> {
        let user = self.require_user()?;
        let post = find_post(&self.posts, id)?.clone();

        if !user.can_edit(&post) {
            return Err(ActionError::Forbidden);
        }

        Ok((user, post))
    }

    fn check_epoch(&self, epoch: u64) -> Result<()> {
        match self.epoch == epoch {
            true => Ok(()),
            false => {
                tracing::debug!(epoch, current = self.epoch, "stale response ignored");
                Err(ActionError::Superseded)
            },
        }
    }

    fn set_user(&mut self, user: Option<User>) {
        self.epoch += 1;
        self.user = user;
    }
}

fn validate(draft: PostDraft) -> Result<PostDraft> {
    let draft = draft.normalized();

    match draft.title.is_empty() {
        true => Err(ActionError::InvalidDraft("title is required".to_string())),
        false => Ok(draft),
    }
}

/// Session façade: every user intent enters here and every state change
/// leaves through it.
pub struct Handler {
    pub(crate) post_repository: Arc<dyn PostRepository + Send + Sync>,
    pub(crate) user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub(crate) chat_repository: Arc<dyn ChatRepository + Send + Sync>,
    pub(crate) prefs: Preferences<Box<dyn KeyValueStore>>,
    pub(crate) presenter: Box<dyn NoticePresenter + Send + Sync>,
    pub(crate) clipboard: Box<dyn Clipboard + Send + Sync>,
    pub(crate) listener: Mutex<Listener>,
    pub(crate) view: Mutex<View>,
}

impl Handler {
    async fn notify(&self, notice: Notice) {
        if let Err(e) = self.presenter.complete(notice).await {
            tracing::warn!(error = %e, "cannot present notice");
        }
    }

    /// Surfaces a failed write and hands the error back.
    async fn failed<T>(&self, action: &'static str, e: ActionError) -> Result<T> {
        if let ActionError::Repository(r) = &e {
            tracing::warn!(action, error = %r, "write failed");
            self.notify(Notice::Failed {
                action,
                message: r.user_message(),
            })
            .await;
        }

        Err(e)
    }

    /// The identity is read under the listener lock, so the last sync
    /// always sees the last session change.
    async fn sync_listener(&self) {
        let mut listener = self.listener.lock().await;
        let user = self.view.lock().await.user.as_ref().map(|u| u.id.clone());

        listener.sync(user.as_ref()).await;
    }

    /// Restores the stored session, loads the posts and normalizes the address.
    pub async fn bootstrap(&self) {
        self.restore_session().await;

        if let Err(e) = self.refresh_posts().await {
            tracing::debug!(error = %e, "initial load did not apply");
        }

        let mut view = self.view.lock().await;
        let query = view.board.query.clone();
        view.location.replace_query(&query);
    }

    pub async fn restore_session(&self) {
        let stored = match self.prefs.session() {
            Some(s) => s,
            None => return,
        };
        let epoch = self.view.lock().await.epoch;

        let user = match self.user_repository.find(&stored.username).await {
            Ok(u) => u.also_(|u| {
                if u.id.as_str().is_empty() {
                    u.id = stored.user_id.clone();
                }
            }),
            Err(e) => {
                tracing::warn!(error = %e, "cannot refresh stored user, using stored ids");
                User::bare(stored.user_id.clone(), stored.username.clone())
            },
        };

        {
            let mut view = self.view.lock().await;
            if view.check_epoch(epoch).is_err() {
                return;
            }

            tracing::info!(user = %user.username, "session restored");
            view.set_user(Some(user));
        }

        self.sync_listener().await;
    }

    /// Reloads the post collection. Only the latest load is applied; a
    /// failed load leaves the cached posts as they were.
    pub async fn refresh_posts(&self) -> Result<usize> {
        let seq = {
            let mut view = self.view.lock().await;
            view.load_seq += 1;
            view.load_seq
        };

        let posts = match self.post_repository.finds().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "cannot load posts, keeping previous ones");
                return Err(e.into());
            },
        };

        let mut view = self.view.lock().await;
        if view.load_seq != seq {
            tracing::debug!(seq, latest = view.load_seq, "stale post load ignored");
            return Err(ActionError::Superseded);
        }

        view.posts = posts;
        view.loaded = true;

        Ok(view.posts.len())
    }

    /// Applies a toolbar/list intent and mirrors the query into the address.
    pub async fn dispatch(&self, intent: Intent) -> BoardState {
        let mut view = self.view.lock().await;

        view.board = view.board.apply(intent);
        let query = view.board.query.clone();
        view.location.replace_query(&query);

        view.board.clone()
    }

    pub async fn listing(&self) -> Listing { self.listing_at(Utc::now()).await }

    pub async fn listing_at(&self, now: DateTime<Utc>) -> Listing {
        let view = self.view.lock().await;
        let page = pipeline::derive(&view.posts, &view.board, &view.favorites);

        let cards = page
            .items
            .iter()
            .map(|p| Card {
                post: (*p).clone(),
                liked: view.user.as_ref().map_or(false, |u| p.is_liked_by(u)),
                saved: view.favorites.contains(&p.id),
                editable: view.user.as_ref().map_or(false, |u| u.can_edit(p)),
                is_new: is_new(p.created_at, now),
                ago: format_ago(p.created_at, now),
                avatar: p.author.avatar_or_default(),
            })
            .collect();

        Listing {
            cards,
            total: page.total,
            page: view.board.page,
            has_more: page.has_more(),
            remaining: page.remaining(),
        }
    }

    pub async fn post(&self, id: &PostId) -> Option<Post> {
        find_post(&self.view.lock().await.posts, id).ok().cloned()
    }

    pub async fn board(&self) -> BoardState { self.view.lock().await.board.clone() }

    pub async fn dialogs(&self) -> Dialogs { self.view.lock().await.dialogs.clone() }

    pub async fn current_user(&self) -> Option<User> { self.view.lock().await.user.clone() }

    pub async fn address(&self) -> String { self.view.lock().await.location.as_str().to_string() }

    pub async fn listening_as(&self) -> Option<UserId> {
        self.listener.lock().await.subscribed_as().cloned()
    }

    /// The deep-link target, yielded once after the posts have loaded.
    pub async fn take_anchor(&self) -> Option<PostId> {
        let mut view = self.view.lock().await;
        if !view.loaded {
            return None;
        }

        let anchor = view.anchor.take()?;
        find_post(&view.posts, &anchor).ok().map(|p| p.id.clone())
    }

    pub async fn favorites(&self) -> BTreeSet<PostId> { self.view.lock().await.favorites.clone() }

    /// Returns whether `id` is saved afterwards. The page is kept.
    pub async fn toggle_favorite(&self, id: &PostId) -> bool {
        let mut view = self.view.lock().await;

        view.favorites = self.prefs.toggle_favorite(id);
        view.favorites.contains(id)
    }

    pub async fn theme(&self) -> String { self.view.lock().await.theme.clone() }

    pub async fn set_theme(&self, theme: &str) {
        self.prefs.set_theme(theme);
        self.view.lock().await.theme = theme.to_string();
    }

    pub async fn open_login(&self) { self.view.lock().await.dialogs.login.open(String::new()) }

    pub async fn close_login(&self) {
        self.view.lock().await.dialogs.login.close();
    }

    /// On failure the server's message is kept in the login dialog.
    pub async fn login(&self, credential: &str) -> Result<User> {
        let user = match self.user_repository.login(credential).await {
            Ok(u) => u,
            Err(e) => {
                tracing::info!(error = %e, "login rejected");
                self.view.lock().await.dialogs.login.open(e.user_message());
                return Err(e.into());
            },
        };

        self.prefs.set_session(&user.id, &user.username);

        {
            let mut view = self.view.lock().await;
            view.set_user(Some(user.clone()));
            view.dialogs.login.close();
        }

        tracing::info!(user = %user.username, "logged in");
        self.notify(Notice::Welcome {
            username: user.username.clone(),
        })
        .await;
        self.sync_listener().await;

        Ok(user)
    }

    pub async fn logout(&self) {
        self.prefs.clear_session();

        {
            let mut view = self.view.lock().await;
            view.set_user(None);
            view.message_gen += 1;
            view.dialogs = Dialogs::default();
        }

        tracing::info!("logged out");
        self.sync_listener().await;
    }

    pub async fn open_profile(&self) -> Result<()> {
        let mut view = self.view.lock().await;
        view.require_user()?;
        view.dialogs.profile.open(());
        Ok(())
    }

    pub async fn save_profile(&self, profile: Profile) -> Result<Profile> {
        let (user, epoch) = {
            let mut view = self.view.lock().await;
            (view.require_user()?, view.epoch)
        };

        let saved = match self.user_repository.update_profile(&user.id, profile).await {
            Ok(p) => p,
            Err(e) => return self.failed("save the profile", e.into()).await,
        };

        {
            let mut view = self.view.lock().await;
            view.check_epoch(epoch)?;

            if let Some(u) = view.user.as_mut() {
                u.profile = saved.clone();
            }
            view.dialogs.profile.close();
        }

        self.notify(Notice::ProfileSaved).await;
        Ok(saved)
    }

    pub async fn open_create(&self) -> Result<()> {
        let mut view = self.view.lock().await;
        view.require_user()?;
        view.dialogs.create.open(());
        Ok(())
    }

    pub async fn create_post(&self, draft: PostDraft) -> Result<Post> {
        let (user, epoch) = {
            let mut view = self.view.lock().await;
            (view.require_user()?, view.epoch)
        };
        let draft = validate(draft)?;

        let post = match self.post_repository.insert(&user, draft).await {
            Ok(p) => p,
            Err(e) => return self.failed("publish the post", e.into()).await,
        };

        {
            let mut view = self.view.lock().await;
            view.check_epoch(epoch)?;

            view.posts.insert(0, post.clone());
            view.dialogs.create.close();
        }

        tracing::info!(id = %post.id, "post created");
        self.notify(Notice::PostCreated).await;
        Ok(post)
    }

    pub async fn open_edit(&self, id: &PostId) -> Result<()> {
        let mut view = self.view.lock().await;
        let (_, post) = view.require_editable(id)?;
        view.dialogs.edit.open(post);
        Ok(())
    }

    pub async fn cancel_edit(&self) {
        self.view.lock().await.dialogs.edit.close();
    }

    pub async fn edit_post(&self, id: &PostId, draft: PostDraft) -> Result<Post> {
        let epoch = {
            let mut view = self.view.lock().await;
            view.require_editable(id)?;
            view.epoch
        };
        let draft = validate(draft)?;

        let post = match self.post_repository.update(id, draft).await {
            Ok(p) => p,
            Err(e) => return self.failed("update the post", e.into()).await,
        };

        {
            let mut view = self.view.lock().await;
            view.check_epoch(epoch)?;

            replace_post(&mut view.posts, post.clone());
            view.dialogs.edit.close();
        }

        self.notify(Notice::PostUpdated).await;
        Ok(post)
    }

    /// The server's like list replaces the cached one.
    pub async fn toggle_like(&self, id: &PostId) -> Result<Post> {
        let (user, epoch) = {
            let mut view = self.view.lock().await;
            (view.require_user()?, view.epoch)
        };

        let post = match self.post_repository.toggle_liked(id, &user.id).await {
            Ok(p) => p,
            Err(e) => return self.failed("like the post", e.into()).await,
        };

        let mut view = self.view.lock().await;
        view.check_epoch(epoch)?;
        replace_post(&mut view.posts, post.clone());

        Ok(post)
    }

    /// Opens the confirmation; nothing is deleted yet.
    pub async fn request_delete(&self, id: &PostId) -> Result<()> {
        let mut view = self.view.lock().await;
        view.require_editable(id)?;
        view.dialogs.confirm_delete.open(id.clone());
        Ok(())
    }

    pub async fn cancel_delete(&self) {
        self.view.lock().await.dialogs.confirm_delete.close();
    }

    /// Deletes the post held by the confirmation dialog.
    pub async fn confirm_delete(&self) -> Result<PostId> {
        let (id, epoch) = {
            let mut view = self.view.lock().await;
            let id = view
                .dialogs
                .confirm_delete
                .close()
                .ok_or(ActionError::Unconfirmed)?;
            view.require_editable(&id)?;
            (id, view.epoch)
        };

        if let Err(e) = self.post_repository.delete(&id).await {
            return self.failed("delete the post", e.into()).await;
        }

        {
            let mut view = self.view.lock().await;
            view.check_epoch(epoch)?;
            remove_post(&mut view.posts, &id);
        }

        tracing::info!(%id, "post deleted");
        self.notify(Notice::PostDeleted).await;
        Ok(id)
    }

    /// Opens the message dialog on `id` at once and fills in the chat when
    /// it resolves. A dialog closed or retargeted meanwhile is left alone.
    pub async fn open_message(&self, id: &PostId) -> Result<Chat> {
        let opened = {
            let mut view = self.view.lock().await;
            let user = view.require_user()?;
            let post = find_post(&view.posts, id)?.clone();

            match post.is_authored_by(&user) {
                true => None,
                false => {
                    view.message_gen += 1;
                    view.dialogs.message.open(MessageTarget {
                        post: Some(post.clone()),
                        chat: None,
                    });
                    Some((user, post, view.epoch, view.message_gen))
                },
            }
        };

        let (user, post, epoch, generation) = match opened {
            Some(o) => o,
            None => {
                self.notify(Notice::OwnPost).await;
                return Err(ActionError::OwnPost);
            },
        };

        let chat = match self.chat_repository.open(&post.id, &user.id).await {
            Ok(c) => c,
            Err(e) => {
                {
                    let mut view = self.view.lock().await;
                    if view.message_gen == generation {
                        view.dialogs.message.close();
                    }
                }
                return self.failed("open the conversation", e.into()).await;
            },
        };

        let mut view = self.view.lock().await;
        view.check_epoch(epoch)?;
        if view.message_gen != generation {
            tracing::debug!(chat = %chat.id, "conversation retargeted, ignoring");
            return Err(ActionError::Superseded);
        }

        if let Some(t) = view.dialogs.message.payload_mut() {
            t.chat = Some(chat.clone());
        }

        Ok(chat)
    }

    pub async fn open_inbox(&self) -> Result<()> {
        let mut view = self.view.lock().await;
        view.require_user()?;
        view.dialogs.inbox.open(());
        Ok(())
    }

    pub async fn close_inbox(&self) {
        self.view.lock().await.dialogs.inbox.close();
    }

    /// Opens the message dialog on a chat picked from the inbox.
    pub async fn select_chat(&self, chat: Chat) -> Result<()> {
        let mut view = self.view.lock().await;
        view.require_user()?;

        let post = chat
            .post
            .as_ref()
            .and_then(|id| find_post(&view.posts, id).ok())
            .cloned();

        view.message_gen += 1;
        view.dialogs.inbox.close();
        view.dialogs.message.open(MessageTarget {
            post,
            chat: Some(chat),
        });

        Ok(())
    }

    pub async fn send_message(&self, text: &str) -> Result<()> {
        let text = text.trim();

        let (user, chat, epoch, generation) = {
            let mut view = self.view.lock().await;
            let user = view.require_user()?;
            let chat = view
                .dialogs
                .message
                .payload()
                .and_then(|t| t.chat.as_ref())
                .map(|c| c.id.clone())
                .ok_or(ActionError::NoChat)?;

            (user, chat, view.epoch, view.message_gen)
        };

        if text.is_empty() {
            return Err(ActionError::InvalidDraft("message is empty".to_string()));
        }

        if let Err(e) = self.chat_repository.send(&chat, &user.id, text).await {
            return self.failed("send the message", e.into()).await;
        }

        {
            let mut view = self.view.lock().await;
            view.check_epoch(epoch)?;

            if view.message_gen == generation {
                if let Some(c) = view.dialogs.message.payload_mut().and_then(|t| t.chat.as_mut()) {
                    c.messages.push(Message {
                        sender: user.id.clone(),
                        text: text.to_string(),
                        sent_at: Some(Utc::now()),
                    });
                }
            }
        }

        self.notify(Notice::MessageSent).await;
        Ok(())
    }

    pub async fn close_message(&self) {
        let mut view = self.view.lock().await;
        view.message_gen += 1;
        view.dialogs.message.close();
    }

    /// Writes the share link of `id` to the clipboard, falling back to
    /// showing it when the clipboard refuses.
    pub async fn copy_link(&self, id: &PostId) -> String {
        let link = self.view.lock().await.location.share_link(id);

        match self.clipboard.write(&link) {
            Ok(()) => self.notify(Notice::LinkCopied(link.clone())).await,
            Err(e) => {
                tracing::debug!(error = %e, "clipboard unavailable");
                self.notify(Notice::CopyManually(link.clone())).await
            },
        }

        link
    }

    /// Releases the notification subscription.
    pub async fn shutdown(&self) { self.listener.lock().await.sync(None).await }
}
