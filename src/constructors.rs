use std::sync::Arc;

use crate::board::url::Location;
use crate::entities::{Chat, Post, User};
use crate::handlers::{Handler, View};
use crate::notifications::{Alert, Listener, PushChannel};
use crate::prefs::{KeyValueStore, Preferences};
use crate::presenters::{Clipboard, NoticePresenter};
use crate::repositories::http::HttpRepository;
use crate::repositories::mock::InMemoryRepository;
use crate::repositories::{ChatRepository, PostRepository, UserRepository};

/// Everything the board needs from its surroundings besides the gateway.
pub struct Frontend {
    pub store: Box<dyn KeyValueStore>,
    pub location: Location,
    pub presenter: Box<dyn NoticePresenter + Send + Sync>,
    pub clipboard: Box<dyn Clipboard + Send + Sync>,
    pub channel: Arc<dyn PushChannel>,
    pub alert: Arc<dyn Alert>,
}

pub fn in_memory(posts: Vec<Post>, users: Vec<User>, frontend: Frontend) -> Handler {
    assemble(
        Arc::new(InMemoryRepository::with(posts)),
        Arc::new(InMemoryRepository::with(users)),
        Arc::new(InMemoryRepository::<Chat>::new()),
        frontend,
    )
}

/// `origin` is the server root, e.g. `http://localhost:4000`.
pub fn http(origin: impl AsRef<str>, frontend: Frontend) -> Handler {
    let repo = Arc::new(HttpRepository::new(origin));

    assemble(repo.clone(), repo.clone(), repo, frontend)
}

/// Wires the board over any gateway implementation.
pub fn assemble(
    post_repository: Arc<dyn PostRepository + Send + Sync>,
    user_repository: Arc<dyn UserRepository + Send + Sync>,
    chat_repository: Arc<dyn ChatRepository + Send + Sync>,
    Frontend {
        store,
        location,
        presenter,
        clipboard,
        channel,
        alert,
    }: Frontend,
) -> Handler {
    let prefs = Preferences::new(store);
    let view = View::new(location, prefs.favorites(), prefs.theme());

    Handler {
        post_repository,
        user_repository,
        chat_repository,
        prefs,
        presenter,
        clipboard,
        listener: ::tokio::sync::Mutex::new(Listener::new(channel, alert)),
        view: ::tokio::sync::Mutex::new(view),
    }
}
