use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ChatRepository, PostRepository, RepositoryError, Result, UserRepository};
use crate::entities::{
    Chat, ChatId, Message, Post, PostDraft, PostId, Profile, User, UserId,
};

mod helpers;

use helpers::{find_mut, find_ref};

/// In-process stand-in for the remote store, with the same semantics.
pub struct InMemoryRepository<T>(Mutex<Vec<T>>);

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self { Self(Mutex::new(vec![])) }

    pub fn with(items: Vec<T>) -> Self { Self(Mutex::new(items)) }
}
impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self { Self::new() }
}

impl<T: Clone> InMemoryRepository<T> {
    pub async fn snapshot(&self) -> Vec<T> { self.0.lock().await.clone() }
}

fn new_id() -> String { Uuid::new_v4().to_simple().to_string() }

fn apply_draft(post: &mut Post, draft: PostDraft) {
    let PostDraft {
        title,
        game,
        level,
        lang,
        platform,
        time,
        tags,
        desc,
    } = draft;

    post.title = title;
    post.game = game;
    post.level = level;
    post.lang = lang;
    post.platform = platform;
    post.time = time;
    post.tags = tags;
    post.desc = desc;
}

#[async_trait]
impl PostRepository for InMemoryRepository<Post> {
    async fn finds(&self) -> Result<Vec<Post>> { Ok(self.0.lock().await.clone()) }

    async fn insert(&self, author: &User, draft: PostDraft) -> Result<Post> {
        let mut post = Post {
            id: PostId(new_id()),
            title: String::new(),
            game: String::new(),
            level: String::new(),
            lang: String::new(),
            platform: String::new(),
            time: String::new(),
            tags: Default::default(),
            desc: String::new(),
            author: author.as_author(),
            created_at: Some(Utc::now()),
            likes: HashSet::new(),
        };
        apply_draft(&mut post, draft);

        self.0.lock().await.insert(0, post.clone());

        Ok(post)
    }

    async fn update(&self, id: &PostId, draft: PostDraft) -> Result<Post> {
        let mut guard = self.0.lock().await;
        let post = find_mut(guard.as_mut_slice(), |p| &p.id == id)?;

        apply_draft(post, draft);

        Ok(post.clone())
    }

    async fn toggle_liked(&self, id: &PostId, user_id: &UserId) -> Result<Post> {
        let mut guard = self.0.lock().await;
        let post = find_mut(guard.as_mut_slice(), |p| &p.id == id)?;

        if !post.likes.remove(user_id) {
            post.likes.insert(user_id.clone());
        }

        Ok(post.clone())
    }

    async fn delete(&self, id: &PostId) -> Result<()> {
        let mut guard = self.0.lock().await;
        let index = guard
            .iter()
            .position(|p| &p.id == id)
            .ok_or(RepositoryError::NotFound)?;

        guard.remove(index);

        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn find(&self, name_or_id: &str) -> Result<User> {
        let guard = self.0.lock().await;

        Ok(find_ref(guard.as_slice(), |u| u.username == name_or_id || u.id.as_str() == name_or_id)?.clone())
    }

    async fn update_profile(&self, id: &UserId, profile: Profile) -> Result<Profile> {
        let mut guard = self.0.lock().await;
        let user = find_mut(guard.as_mut_slice(), |u| &u.id == id)?;

        user.profile = profile;

        Ok(user.profile.clone())
    }

    /// The credential is taken as the username; unknown names are registered.
    async fn login(&self, credential: &str) -> Result<User> {
        if credential.is_empty() {
            return Err(RepositoryError::Status {
                status: 401,
                message: "invalid token".to_string(),
            });
        }

        let mut guard = self.0.lock().await;

        match find_ref(guard.as_slice(), |u| u.username == credential) {
            Ok(u) => return Ok(u.clone()),
            Err(RepositoryError::NotFound) => (),
            Err(e) => return Err(e),
        }

        let user = User::bare(UserId(new_id()), credential.to_string());
        guard.push(user.clone());

        Ok(user)
    }
}

#[async_trait]
impl ChatRepository for InMemoryRepository<Chat> {
    async fn open(&self, post_id: &PostId, user_id: &UserId) -> Result<Chat> {
        let mut guard = self.0.lock().await;

        match find_ref(guard.as_slice(), |c| {
            c.post.as_ref() == Some(post_id) && c.participants.contains(user_id)
        }) {
            Ok(c) => return Ok(c.clone()),
            Err(RepositoryError::NotFound) => (),
            Err(e) => return Err(e),
        }

        let chat = Chat {
            id: ChatId(new_id()),
            post: Some(post_id.clone()),
            participants: vec![user_id.clone()],
            messages: vec![],
        };
        guard.push(chat.clone());

        Ok(chat)
    }

    async fn send(&self, chat_id: &ChatId, sender: &UserId, text: &str) -> Result<()> {
        let mut guard = self.0.lock().await;
        let chat = find_mut(guard.as_mut_slice(), |c| &c.id == chat_id)?;

        chat.messages.push(Message {
            sender: sender.clone(),
            text: text.to_string(),
            sent_at: Some(Utc::now()),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User { User::bare(UserId::from(name), name.to_string()) }

    #[tokio::test]
    async fn liking_twice_never_duplicates() {
        let repo = InMemoryRepository::<Post>::new();
        let author = user("ana");
        let post = repo
            .insert(&author, PostDraft {
                title: "duo".to_string(),
                ..PostDraft::default()
            })
            .await
            .unwrap();

        let liker = UserId::from("bo");
        let liked = repo.toggle_liked(&post.id, &liker).await.unwrap();
        assert_eq!(liked.like_count(), 1);

        let unliked = repo.toggle_liked(&post.id, &liker).await.unwrap();
        assert_eq!(unliked.like_count(), 0);
    }

    #[tokio::test]
    async fn created_posts_are_attributed_and_listed_first() {
        let repo = InMemoryRepository::<Post>::new();
        let ana = user("ana");

        repo.insert(&ana, PostDraft::default()).await.unwrap();
        let newest = repo.insert(&ana, PostDraft::default()).await.unwrap();

        let all = repo.finds().await.unwrap();
        assert_eq!(all[0].id, newest.id);
        assert_eq!(all[0].author.name, "ana");
        assert!(all[0].created_at.is_some());
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let repo = InMemoryRepository::<Post>::new();
        assert_eq!(
            repo.delete(&PostId::from("nope")).await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn chat_is_resolved_per_post_and_user() {
        let repo = InMemoryRepository::<Chat>::new();
        let post = PostId::from("p1");
        let bo = UserId::from("bo");

        let first = repo.open(&post, &bo).await.unwrap();
        let again = repo.open(&post, &bo).await.unwrap();
        assert_eq!(first.id, again.id);

        let other = repo.open(&post, &UserId::from("cy")).await.unwrap();
        assert_ne!(first.id, other.id);

        repo.send(&first.id, &bo, "hi").await.unwrap();
        assert_eq!(repo.snapshot().await[0].messages[0].text, "hi");
    }

    #[tokio::test]
    async fn login_registers_once() {
        let repo = InMemoryRepository::<User>::new();
        let a = repo.login("ana").await.unwrap();
        let b = repo.login("ana").await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(repo.find("ana").await.unwrap().id, a.id);
        assert_eq!(repo.find(a.id.as_str()).await.unwrap().username, "ana");
        assert!(repo.login("").await.is_err());
    }
}
