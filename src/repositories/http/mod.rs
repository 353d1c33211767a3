//! REST implementation of the gateway traits.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use super::{ChatRepository, PostRepository, RepositoryError, Result, UserRepository};
use crate::entities::{Chat, ChatId, Post, PostDraft, PostId, Profile, User, UserId};

mod converters;
mod models;

use converters::{draft_body, status_error};
use models::{
    HttpChatBody, HttpChatModel, HttpLikeBody, HttpLoginBody, HttpLoginModel, HttpMessageBody,
    HttpPostModel, HttpProfileModel, HttpProfileResponseModel, HttpUserModel,
};

pub struct HttpRepository {
    http: Client,
    base: String,
}

impl HttpRepository {
    /// `origin` is the server root; endpoints live under `{origin}/api`.
    pub fn new(origin: impl AsRef<str>) -> Self {
        Self::with_client(Client::new(), origin)
    }

    pub fn with_client(http: Client, origin: impl AsRef<str>) -> Self {
        Self {
            http,
            base: format!("{}/api", origin.as_ref().trim_end_matches('/')),
        }
    }

    pub fn base(&self) -> &str { &self.base }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base, path) }

    async fn execute(&self, req: RequestBuilder) -> Result<reqwest::Response> {
        let resp = req.send().await?;
        let status = resp.status();

        tracing::trace!(url = %resp.url(), %status, "response");

        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status.as_u16(), &body))
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        self.execute(req)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RepositoryError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PostRepository for HttpRepository {
    async fn finds(&self) -> Result<Vec<Post>> {
        let models: Vec<HttpPostModel> = self.fetch(self.http.get(self.url("/posts"))).await?;

        Ok(models.into_iter().map(Post::from).collect())
    }

    async fn insert(&self, author: &User, draft: PostDraft) -> Result<Post> {
        let req = self
            .http
            .post(self.url("/posts"))
            .json(&draft_body(Some(&author.id), &draft));
        let model: HttpPostModel = self.fetch(req).await?;

        // the creation response is not populated
        let mut post = Post::from(model);
        post.author = author.as_author();

        Ok(post)
    }

    async fn update(&self, id: &PostId, draft: PostDraft) -> Result<Post> {
        let req = self
            .http
            .put(self.url(&format!("/posts/{}", id)))
            .json(&draft_body(None, &draft));

        Ok(self.fetch::<HttpPostModel>(req).await?.into())
    }

    async fn toggle_liked(&self, id: &PostId, user_id: &UserId) -> Result<Post> {
        let req = self
            .http
            .put(self.url(&format!("/posts/{}/like", id)))
            .json(&HttpLikeBody {
                user_id: user_id.as_str(),
            });

        Ok(self.fetch::<HttpPostModel>(req).await?.into())
    }

    async fn delete(&self, id: &PostId) -> Result<()> {
        self.execute(self.http.delete(self.url(&format!("/posts/{}", id))))
            .await?;

        Ok(())
    }
}

#[async_trait]
impl UserRepository for HttpRepository {
    async fn find(&self, name_or_id: &str) -> Result<User> {
        let req = self.http.get(self.url(&format!("/users/{}", name_or_id)));

        Ok(self.fetch::<HttpUserModel>(req).await?.into())
    }

    async fn update_profile(&self, id: &UserId, profile: Profile) -> Result<Profile> {
        let req = self
            .http
            .put(self.url(&format!("/users/{}", id)))
            .json(&HttpProfileModel::from(&profile));
        let resp: HttpProfileResponseModel = self.fetch(req).await?;

        Ok(resp.user.profile.map(Profile::from).unwrap_or_default())
    }

    async fn login(&self, credential: &str) -> Result<User> {
        let req = self
            .http
            .post(self.url("/google-login"))
            .json(&HttpLoginBody { token: credential });

        Ok(self.fetch::<HttpLoginModel>(req).await?.into())
    }
}

#[async_trait]
impl ChatRepository for HttpRepository {
    async fn open(&self, post_id: &PostId, user_id: &UserId) -> Result<Chat> {
        let req = self.http.post(self.url("/chats")).json(&HttpChatBody {
            ad_id: post_id.as_str(),
            user_id: user_id.as_str(),
        });

        Ok(self.fetch::<HttpChatModel>(req).await?.into())
    }

    async fn send(&self, chat_id: &ChatId, sender: &UserId, text: &str) -> Result<()> {
        let req = self
            .http
            .post(self.url(&format!("/chats/{}/messages", chat_id)))
            .json(&HttpMessageBody {
                text,
                sender_id: sender.as_str(),
            });
        self.execute(req).await?;

        Ok(())
    }
}
