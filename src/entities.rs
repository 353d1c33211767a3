use std::collections::{BTreeSet, HashSet};
use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub String);

macro_rules! id_impls {
    ($($t:ident),*) => {$(
        impl Display for $t {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult { f.write_str(&self.0) }
        }

        impl From<&str> for $t {
            fn from(s: &str) -> Self { Self(s.to_string()) }
        }

        impl From<String> for $t {
            fn from(s: String) -> Self { Self(s) }
        }

        impl $t {
            pub fn as_str(&self) -> &str { &self.0 }
        }
    )*};
}

id_impls!(PostId, UserId, ChatId);

/// The five structured matchmaking fields every post carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Game,
    Level,
    Lang,
    Platform,
    Time,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Game,
        Field::Level,
        Field::Lang,
        Field::Platform,
        Field::Time,
    ];

    /// Name used both by the REST records and the address bar.
    pub fn key(self) -> &'static str {
        match self {
            Field::Game => "game",
            Field::Level => "level",
            Field::Lang => "lang",
            Field::Platform => "platform",
            Field::Time => "time",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub avatar: Option<String>,
}

impl Author {
    pub fn unknown() -> Self {
        Self {
            name: "Unknown".to_string(),
            avatar: None,
        }
    }

    pub fn avatar_or_default(&self) -> String {
        match &self.avatar {
            Some(a) if !a.is_empty() => a.clone(),
            _ => {
                let seed = if self.name.is_empty() { "anon" } else { &self.name };
                let seed: String = url::form_urlencoded::byte_serialize(seed.as_bytes()).collect();
                format!("https://api.dicebear.com/7.x/thumbs/svg?seed={}", seed)
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub game: String,
    pub level: String,
    pub lang: String,
    pub platform: String,
    pub time: String,
    pub tags: BTreeSet<String>,
    pub desc: String,
    pub author: Author,
    pub created_at: Option<DateTime<Utc>>,
    pub likes: HashSet<UserId>,
}

impl Post {
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Game => &self.game,
            Field::Level => &self.level,
            Field::Lang => &self.lang,
            Field::Platform => &self.platform,
            Field::Time => &self.time,
        }
    }

    pub fn like_count(&self) -> usize { self.likes.len() }

    pub fn is_liked_by(&self, user: &User) -> bool { self.likes.contains(&user.id) }

    pub fn is_authored_by(&self, user: &User) -> bool { self.author.name == user.username }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub profile: Profile,
    pub admin: bool,
}

impl User {
    /// Session established from persisted identifiers alone.
    pub fn bare(id: UserId, username: String) -> Self {
        Self {
            id,
            username,
            profile: Profile::default(),
            admin: false,
        }
    }

    pub fn as_author(&self) -> Author {
        Author {
            name: self.username.clone(),
            avatar: self.profile.avatar_url.clone(),
        }
    }

    pub fn can_edit(&self, post: &Post) -> bool { self.admin || post.is_authored_by(self) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: UserId,
    pub text: String,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    pub post: Option<PostId>,
    pub participants: Vec<UserId>,
    pub messages: Vec<Message>,
}

/// Post fields as submitted by the create/edit forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub game: String,
    pub level: String,
    pub lang: String,
    pub platform: String,
    pub time: String,
    pub tags: BTreeSet<String>,
    pub desc: String,
}

impl PostDraft {
    /// Trims free text and re-splits tags so none is empty or holds a comma.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            game: self.game.trim().to_string(),
            tags: self.tags.iter().flat_map(|t| split_tags(t)).collect(),
            desc: self.desc.trim().to_string(),
            ..self
        }
    }

    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            game: post.game.clone(),
            level: post.level.clone(),
            lang: post.lang.clone(),
            platform: post.platform.clone(),
            time: post.time.clone(),
            tags: post.tags.clone(),
            desc: post.desc.clone(),
        }
    }
}

pub fn split_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_split_and_trimmed() {
        let tags = split_tags(" chill, ranked ,,duo ");
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["chill", "duo", "ranked"]
        );
    }

    #[test]
    fn draft_normalization_trims_and_resplits() {
        let draft = PostDraft {
            title: "  Need a duo ".to_string(),
            game: " Valorant".to_string(),
            tags: ["mic, chill".to_string(), " ".to_string()].into_iter().collect(),
            desc: "evenings only \n".to_string(),
            ..PostDraft::default()
        }
        .normalized();

        assert_eq!(draft.title, "Need a duo");
        assert_eq!(draft.game, "Valorant");
        assert_eq!(draft.desc, "evenings only");
        assert_eq!(draft.tags.into_iter().collect::<Vec<_>>(), vec!["chill", "mic"]);
    }

    #[test]
    fn avatar_falls_back_to_generated_one() {
        let author = Author {
            name: "night owl".to_string(),
            avatar: None,
        };
        assert_eq!(
            author.avatar_or_default(),
            "https://api.dicebear.com/7.x/thumbs/svg?seed=night+owl"
        );

        let anon = Author::default();
        assert!(anon.avatar_or_default().ends_with("seed=anon"));
    }
}
