use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::{BoardState, PostQuery, SortMode, PAGE_SIZE};
use crate::entities::{Post, PostId};

/// Whether `post` survives every active predicate of `query`.
pub fn matches(post: &Post, query: &PostQuery, favorites: &BTreeSet<PostId>) -> bool {
    if query.saved_only && !favorites.contains(&post.id) {
        return false;
    }

    if !query.tags.is_subset(&post.tags) {
        return false;
    }

    if query
        .fields
        .iter()
        .any(|(field, value)| post.field(field) != value)
    {
        return false;
    }

    if !query.q.is_empty() {
        let haystack = format!("{} {} {}", post.title, post.desc, post.game).to_lowercase();
        if !haystack.contains(&query.q.to_lowercase()) {
            return false;
        }
    }

    true
}

pub fn compare(sort: SortMode, a: &Post, b: &Post) -> Ordering {
    match sort {
        // `None < Some(_)`, so posts without a timestamp sink to the bottom
        SortMode::Date => b.created_at.cmp(&a.created_at),
        SortMode::Title => a
            .title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.title.cmp(&b.title)),
        SortMode::Score => b
            .like_count()
            .cmp(&a.like_count())
            .then_with(|| b.created_at.cmp(&a.created_at)),
    }
}

/// Filtered posts in final sort order. The sort is stable, so remaining ties
/// keep collection order.
pub fn visible<'a>(
    posts: &'a [Post],
    query: &PostQuery,
    favorites: &BTreeSet<PostId>,
) -> Vec<&'a Post> {
    let mut visible = posts
        .iter()
        .filter(|p| matches(p, query, favorites))
        .collect::<Vec<_>>();

    visible.sort_by(|a, b| compare(query.sort, a, b));

    visible
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub items: Vec<&'a Post>,
    pub total: usize,
}

impl<'a> Page<'a> {
    pub fn has_more(&self) -> bool { self.items.len() < self.total }

    pub fn remaining(&self) -> usize { self.total - self.items.len() }

    pub fn ids(&self) -> Vec<&str> { self.items.iter().map(|p| p.id.as_str()).collect() }
}

/// Prefix of `visible` holding the first `page` pages.
pub fn paginate(mut visible: Vec<&Post>, page: u32) -> Page<'_> {
    let total = visible.len();
    let len = (page.max(1) as usize)
        .saturating_mul(PAGE_SIZE)
        .min(total);

    visible.truncate(len);

    Page {
        items: visible,
        total,
    }
}

pub fn derive<'a>(posts: &'a [Post], state: &BoardState, favorites: &BTreeSet<PostId>) -> Page<'a> {
    paginate(visible(posts, &state.query, favorites), state.page)
}
