//! Address-bar state: the query-string codec, the deep-link fragment and
//! share links.
//!
//! Parameters: `q`, `tags` (comma-joined), `game`, `level`, `lang`,
//! `platform`, `time`, `sort` (omitted for the default) and `saved=1`.
//! An absent parameter always means "unset"; empty values are never written.

use url::form_urlencoded;
use url::Url;

use super::{PostQuery, SortMode};
use crate::entities::{split_tags, Field, PostId};

pub fn encode(query: &PostQuery) -> String {
    let mut ser = form_urlencoded::Serializer::new(String::new());

    if !query.q.is_empty() {
        ser.append_pair("q", &query.q);
    }
    if !query.tags.is_empty() {
        let tags = query.tags.iter().map(String::as_str).collect::<Vec<_>>();
        ser.append_pair("tags", &tags.join(","));
    }
    for (field, value) in query.fields.iter() {
        ser.append_pair(field.key(), value);
    }
    if query.sort != SortMode::default() {
        ser.append_pair("sort", query.sort.as_str());
    }
    if query.saved_only {
        ser.append_pair("saved", "1");
    }

    ser.finish()
}

/// Inverse of [`encode`]. Unknown keys are ignored, an unknown sort falls
/// back to the default. Accepts an optional leading `?`.
pub fn decode(search: &str) -> PostQuery {
    let search = search.strip_prefix('?').unwrap_or(search);
    let mut query = PostQuery::default();

    for (key, value) in form_urlencoded::parse(search.as_bytes()) {
        match key.as_ref() {
            "q" => query.q = value.into_owned(),
            "tags" => query.tags = split_tags(&value),
            "sort" => query.sort = value.parse().unwrap_or_default(),
            "saved" => query.saved_only = value == "1",
            key =>
                if let Some(field) = Field::ALL.iter().find(|f| f.key() == key) {
                    query.fields.set(*field, value.into_owned());
                },
        }
    }

    query
}

/// The page address, as the board sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(href)?,
        })
    }

    pub fn query(&self) -> PostQuery { decode(self.url.query().unwrap_or("")) }

    /// Post id named by the fragment, if any.
    pub fn anchor(&self) -> Option<PostId> {
        self.url
            .fragment()
            .filter(|f| !f.is_empty())
            .map(PostId::from)
    }

    /// Replaces the search part in place, the way `history.replaceState`
    /// with a bare `?query` does: the fragment is dropped and no entry is
    /// added.
    pub fn replace_query(&mut self, query: &PostQuery) {
        let encoded = encode(query);
        self.url
            .set_query(if encoded.is_empty() { None } else { Some(encoded.as_str()) });
        self.url.set_fragment(None);
    }

    /// `?q=...` or empty.
    pub fn search(&self) -> String {
        match self.url.query() {
            Some(q) if !q.is_empty() => format!("?{}", q),
            _ => String::new(),
        }
    }

    pub fn share_link(&self, id: &PostId) -> String {
        format!(
            "{}{}{}#{}",
            self.url.origin().ascii_serialization(),
            self.url.path(),
            self.search(),
            id
        )
    }

    pub fn as_str(&self) -> &str { self.url.as_str() }
}
