use super::{RepositoryError, Result as RepoResult};

pub fn find_mut<T, P>(v: &mut [T], predicate: P) -> RepoResult<&mut T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&mut T) -> bool,
{
    let found = v.iter_mut().find(predicate);

    tracing::trace!("found - {:?}", found);

    found.ok_or(RepositoryError::NotFound)
}

pub fn find_ref<T, P>(v: &[T], predicate: P) -> RepoResult<&T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&T) -> bool,
{
    let found = v.iter().find(predicate);

    tracing::trace!("found - {:?}", found);

    found.ok_or(RepositoryError::NotFound)
}
