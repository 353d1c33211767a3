use super::{ActionError, Result};
use crate::entities::{Author, Post, PostId};
use crate::repositories::RepositoryError;

pub fn find_post<'a>(posts: &'a [Post], id: &PostId) -> Result<&'a Post> {
    posts
        .iter()
        .find(|p| &p.id == id)
        .ok_or(ActionError::Repository(RepositoryError::NotFound))
}

/// Swaps in the server's record, keeping the cached author when the
/// response came back unpopulated.
pub fn replace_post(posts: &mut [Post], mut post: Post) {
    match posts.iter_mut().find(|p| p.id == post.id) {
        Some(slot) => {
            if post.author.avatar.is_none() && post.author == Author::unknown() {
                post.author = slot.author.clone();
            }
            *slot = post;
        },
        None => tracing::debug!(id = %post.id, "updated post is not cached"),
    }
}

pub fn remove_post(posts: &mut Vec<Post>, id: &PostId) { posts.retain(|p| &p.id != id) }
