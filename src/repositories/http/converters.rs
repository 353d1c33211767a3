use super::models::{
    HttpAuthorModel, HttpChatModel, HttpErrorModel, HttpLoginModel, HttpMessageModel,
    HttpPostBody, HttpPostModel, HttpProfileModel, HttpUserModel,
};
use super::RepositoryError;
use crate::entities::{Author, Chat, ChatId, Message, Post, PostDraft, PostId, Profile, User, UserId};

impl From<reqwest::Error> for RepositoryError {
    fn from(e: reqwest::Error) -> Self {
        match e.is_decode() {
            true => RepositoryError::Decode(e.to_string()),
            false => RepositoryError::Network(e.to_string()),
        }
    }
}

/// Classifies a non-success response, keeping the server's `message` if any.
pub fn status_error(status: u16, body: &str) -> RepositoryError {
    let message = serde_json::from_str::<HttpErrorModel>(body)
        .unwrap_or_default()
        .message
        .unwrap_or_default();

    match (status, message.is_empty()) {
        (404, true) => RepositoryError::NotFound,
        (status, _) => RepositoryError::Status { status, message },
    }
}

impl From<Option<HttpAuthorModel>> for Author {
    fn from(model: Option<HttpAuthorModel>) -> Self {
        match model {
            Some(HttpAuthorModel::User { username, profile }) => Author {
                name: username
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| Author::unknown().name),
                avatar: profile.and_then(|p| p.avatar_url),
            },
            Some(HttpAuthorModel::Ref(_)) | None => Author::unknown(),
        }
    }
}

impl From<HttpPostModel> for Post {
    fn from(
        HttpPostModel {
            id,
            title,
            game,
            level,
            lang,
            platform,
            time,
            tags,
            desc,
            author,
            created_at,
            likes,
        }: HttpPostModel,
    ) -> Self {
        Self {
            id: PostId(id),
            title,
            game,
            level,
            lang,
            platform,
            time,
            tags: tags.into_iter().filter(|t| !t.is_empty()).collect(),
            desc,
            author: author.into(),
            created_at,
            likes: likes.into_iter().map(UserId).collect(),
        }
    }
}

impl From<HttpProfileModel> for Profile {
    fn from(HttpProfileModel { avatar_url, bio }: HttpProfileModel) -> Self {
        Self { avatar_url, bio }
    }
}

impl From<&Profile> for HttpProfileModel {
    fn from(profile: &Profile) -> Self {
        Self {
            avatar_url: profile.avatar_url.clone(),
            bio: profile.bio.clone(),
        }
    }
}

impl From<HttpUserModel> for User {
    fn from(
        HttpUserModel {
            id,
            username,
            profile,
            is_admin,
        }: HttpUserModel,
    ) -> Self {
        Self {
            id: UserId(id),
            username,
            profile: profile.map(Profile::from).unwrap_or_default(),
            admin: is_admin,
        }
    }
}

impl From<HttpLoginModel> for User {
    fn from(
        HttpLoginModel {
            user_id,
            username,
            profile,
            is_admin,
        }: HttpLoginModel,
    ) -> Self {
        Self {
            id: UserId(user_id),
            username,
            profile: profile.map(Profile::from).unwrap_or_default(),
            admin: is_admin,
        }
    }
}

impl From<HttpMessageModel> for Message {
    fn from(
        HttpMessageModel {
            sender,
            text,
            created_at,
        }: HttpMessageModel,
    ) -> Self {
        Self {
            sender: UserId(sender.into_id()),
            text,
            sent_at: created_at,
        }
    }
}

impl From<HttpChatModel> for Chat {
    fn from(
        HttpChatModel {
            id,
            related_ad,
            participants,
            messages,
        }: HttpChatModel,
    ) -> Self {
        Self {
            id: ChatId(id),
            post: related_ad.map(|r| PostId(r.into_id())),
            participants: participants.into_iter().map(|r| UserId(r.into_id())).collect(),
            messages: messages.into_iter().map(Message::from).collect(),
        }
    }
}

pub fn draft_body<'a>(user_id: Option<&'a UserId>, draft: &'a PostDraft) -> HttpPostBody<'a> {
    HttpPostBody {
        user_id: user_id.map(UserId::as_str),
        title: &draft.title,
        game: &draft.game,
        level: &draft.level,
        lang: &draft.lang,
        platform: &draft.platform,
        time: &draft.time,
        tags: draft.tags.iter().map(String::as_str).collect(),
        desc: &draft.desc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(json: &str) -> Post { serde_json::from_str::<HttpPostModel>(json).unwrap().into() }

    #[test]
    fn populated_author_is_flattened() {
        let p = post(
            r#"{
                "_id": "65a1",
                "title": "Ranked duo",
                "game": "Valorant",
                "tags": ["mic", "eu"],
                "author": { "_id": "u1", "username": "ana", "profile": { "avatarUrl": "https://img/a.png" } },
                "createdAt": "2024-01-12T10:00:00.000Z",
                "likes": ["u2", "u2", "u3"]
            }"#,
        );

        assert_eq!(p.id, PostId::from("65a1"));
        assert_eq!(p.author.name, "ana");
        assert_eq!(p.author.avatar.as_deref(), Some("https://img/a.png"));
        assert_eq!(p.level, "");
        assert_eq!(p.like_count(), 2);
        assert!(p.created_at.is_some());
    }

    #[test]
    fn unpopulated_or_missing_author_is_unknown() {
        let by_ref = post(r#"{ "_id": "1", "author": "u1" }"#);
        assert_eq!(by_ref.author, Author::unknown());

        let missing = post(r#"{ "_id": "2", "author": null, "desc": null }"#);
        assert_eq!(missing.author, Author::unknown());
        assert_eq!(missing.desc, "");
        assert_eq!(missing.created_at, None);
    }

    #[test]
    fn unreadable_timestamp_does_not_drop_the_list() {
        let posts = serde_json::from_str::<Vec<HttpPostModel>>(
            r#"[{ "_id": "ok", "createdAt": "2024-01-12T10:00:00Z" }, { "_id": "bad", "createdAt": "yesterday" }, { "_id": "num", "createdAt": 17 }]"#,
        )
        .unwrap()
        .into_iter()
        .map(Post::from)
        .collect::<Vec<_>>();

        assert_eq!(posts.len(), 3);
        assert!(posts[0].created_at.is_some());
        assert_eq!(posts[1].created_at, None);
        assert_eq!(posts[2].created_at, None);
    }

    #[test]
    fn chat_refs_accept_ids_and_documents() {
        let chat: Chat = serde_json::from_str::<HttpChatModel>(
            r#"{
                "_id": "c1",
                "relatedAd": { "_id": "p1", "title": "x" },
                "participants": ["u1", { "_id": "u2" }],
                "messages": [{ "sender": "u1", "text": "hi" }]
            }"#,
        )
        .unwrap()
        .into();

        assert_eq!(chat.post, Some(PostId::from("p1")));
        assert_eq!(chat.participants, vec![UserId::from("u1"), UserId::from("u2")]);
        assert_eq!(chat.messages[0].text, "hi");
    }

    #[test]
    fn server_message_is_kept() {
        assert_eq!(
            status_error(401, r#"{"message":"Google token invalid"}"#),
            RepositoryError::Status {
                status: 401,
                message: "Google token invalid".to_string(),
            }
        );
        assert_eq!(status_error(404, "Not Found"), RepositoryError::NotFound);
        assert_eq!(
            status_error(500, "<html>"),
            RepositoryError::Status {
                status: 500,
                message: String::new(),
            }
        );
    }

    #[test]
    fn draft_body_matches_server_names() {
        let draft = PostDraft {
            title: "t".to_string(),
            tags: ["b".to_string(), "a".to_string()].into_iter().collect(),
            ..PostDraft::default()
        };
        let json = serde_json::to_value(draft_body(Some(&UserId::from("u1")), &draft)).unwrap();

        assert_eq!(json["userId"], "u1");
        assert_eq!(json["tags"], serde_json::json!(["a", "b"]));

        let json = serde_json::to_value(draft_body(None, &draft)).unwrap();
        assert!(json.get("userId").is_none());
    }
}
