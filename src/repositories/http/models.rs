//! Record shapes exchanged with the REST server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `null` and a missing key both read as the default value.
fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

/// An unreadable timestamp reads as absent instead of failing the record.
fn lenient_time<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| tracing::debug!(value = %s, error = %e, "unreadable timestamp"))
            .ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpPostModel {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub game: String,
    #[serde(default, deserialize_with = "nullable")]
    pub level: String,
    #[serde(default, deserialize_with = "nullable")]
    pub lang: String,
    #[serde(default, deserialize_with = "nullable")]
    pub platform: String,
    #[serde(default, deserialize_with = "nullable")]
    pub time: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub desc: String,
    #[serde(default)]
    pub author: Option<HttpAuthorModel>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub likes: Vec<String>,
}

/// Populated user document, or the bare reference when the server did not
/// populate it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HttpAuthorModel {
    User {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        profile: Option<HttpProfileModel>,
    },
    Ref(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpProfileModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpUserModel {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub username: String,
    #[serde(default)]
    pub profile: Option<HttpProfileModel>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpLoginModel {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub profile: Option<HttpProfileModel>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_admin: bool,
}

/// `PUT /users/{id}` answers `{ user: { profile } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpProfileResponseModel {
    pub user: HttpProfileHolderModel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpProfileHolderModel {
    #[serde(default)]
    pub profile: Option<HttpProfileModel>,
}

/// Either an id or a populated document carrying `_id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HttpRefModel {
    Id(String),
    Doc {
        #[serde(rename = "_id")]
        id: String,
    },
}

impl HttpRefModel {
    pub fn into_id(self) -> String {
        match self {
            HttpRefModel::Id(id) | HttpRefModel::Doc { id } => id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpChatModel {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub related_ad: Option<HttpRefModel>,
    #[serde(default, deserialize_with = "nullable")]
    pub participants: Vec<HttpRefModel>,
    #[serde(default, deserialize_with = "nullable")]
    pub messages: Vec<HttpMessageModel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMessageModel {
    pub sender: HttpRefModel,
    #[serde(default, deserialize_with = "nullable")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_time")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpErrorModel {
    #[serde(default)]
    pub message: Option<String>,
}

// request bodies

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpPostBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<&'a str>,
    pub title: &'a str,
    pub game: &'a str,
    pub level: &'a str,
    pub lang: &'a str,
    pub platform: &'a str,
    pub time: &'a str,
    pub tags: Vec<&'a str>,
    pub desc: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpLikeBody<'a> {
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpChatBody<'a> {
    pub ad_id: &'a str,
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMessageBody<'a> {
    pub text: &'a str,
    pub sender_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct HttpLoginBody<'a> {
    pub token: &'a str,
}
