//! Filter, sort and pagination state of the board.
//!
//! [`BoardState`] is a plain value. It only changes through
//! [`BoardState::apply`], and the derived page is always computed from the
//! latest value (see [`pipeline`]), so a reset page can never be observed
//! against a stale filter.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::entities::Field;

pub mod dialog;
pub mod pipeline;
pub mod url;

/// Number of posts added by every "load more".
pub const PAGE_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Most liked first, newer first among equals.
    Score,
    /// Newest first.
    Date,
    /// Title A-Z, case-insensitive.
    Title,
}

impl Default for SortMode {
    fn default() -> Self { SortMode::Score }
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Score => "score",
            SortMode::Date => "date",
            SortMode::Title => "title",
        }
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score" => Ok(SortMode::Score),
            "date" | "newest" => Ok(SortMode::Date),
            "title" => Ok(SortMode::Title),
            s => Err(format!("unknown sort mode: `{}` (expected score, date or title)", s)),
        }
    }
}

/// Exact-match constraints on the structured fields. `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilter {
    game: Option<String>,
    level: Option<String>,
    lang: Option<String>,
    platform: Option<String>,
    time: Option<String>,
}

impl FieldFilter {
    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Game => &self.game,
            Field::Level => &self.level,
            Field::Lang => &self.lang,
            Field::Platform => &self.platform,
            Field::Time => &self.time,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Game => &mut self.game,
            Field::Level => &mut self.level,
            Field::Lang => &mut self.lang,
            Field::Platform => &mut self.platform,
            Field::Time => &mut self.time,
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> { self.slot(field).as_deref() }

    /// An empty value clears the constraint.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        *self.slot_mut(field) = if value.is_empty() { None } else { Some(value) };
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Active constraints, in [`Field::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL
            .iter()
            .filter_map(move |f| self.get(*f).map(|v| (*f, v)))
    }

    pub fn is_empty(&self) -> bool { self.iter().next().is_none() }
}

/// Everything the address bar remembers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub q: String,
    pub tags: BTreeSet<String>,
    pub fields: FieldFilter,
    pub sort: SortMode,
    pub saved_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    pub query: PostQuery,
    /// 1-based.
    pub page: u32,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            query: PostQuery::default(),
            page: 1,
        }
    }
}

/// A user interaction with the filter toolbar or the result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Search(String),
    ClearSearch,
    ToggleTag(String),
    SetField(Field, String),
    Sort(SortMode),
    SavedOnly(bool),
    ClearAll,
    LoadMore,
}

impl BoardState {
    pub fn from_query(query: PostQuery) -> Self { Self { query, page: 1 } }

    /// Returns the next state. Every intent but `LoadMore` resets the page to 1.
    pub fn apply(&self, intent: Intent) -> BoardState {
        let mut query = self.query.clone();

        match intent {
            Intent::LoadMore =>
                return BoardState {
                    query,
                    page: self.page.saturating_add(1),
                },
            Intent::Search(q) => query.q = q,
            Intent::ClearSearch => query.q.clear(),
            Intent::ToggleTag(tag) => {
                // tags travel comma-joined in the address bar
                for tag in crate::entities::split_tags(&tag) {
                    if !query.tags.remove(&tag) {
                        query.tags.insert(tag);
                    }
                }
            },
            Intent::SetField(field, value) => query.fields.set(field, value),
            Intent::Sort(sort) => query.sort = sort,
            Intent::SavedOnly(saved_only) => query.saved_only = saved_only,
            Intent::ClearAll => query = PostQuery::default(),
        }

        tracing::debug!(?query, "board query changed, page reset");

        BoardState { query, page: 1 }
    }
}
