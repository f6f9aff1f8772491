// src/site/store.rs

//! Entity cache.
//!
//! Each kind lives in its own [`EntityStore`] behind its own `RwLock`, so
//! work on posts never contends with work on layouts. Locks are only held
//! for the duration of a map operation and never across an `.await`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::trace;

use crate::site::entity::{Entity, Fragment, Layout, Post, PostKey};

/// Unique-keyed store for one entity kind.
#[derive(Debug)]
pub struct EntityStore<E: Entity> {
    entries: RwLock<HashMap<E::Key, E>>,
}

impl<E: Entity> Default for EntityStore<E> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<E: Entity> EntityStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-written map entry
    // behind, so poisoned guards are safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<E::Key, E>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<E::Key, E>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `entity`, or replace the fields of the entry with the same
    /// identity in place. Returns the previous value, if any.
    pub fn upsert(&self, entity: E) -> Option<E> {
        let key = entity.key();
        match self.write().entry(key) {
            Entry::Occupied(mut slot) => {
                trace!(key = ?slot.key(), "upsert: replacing existing entry");
                Some(std::mem::replace(slot.get_mut(), entity))
            }
            Entry::Vacant(slot) => {
                trace!(key = ?slot.key(), "upsert: inserting new entry");
                slot.insert(entity);
                None
            }
        }
    }

    pub fn remove(&self, key: &E::Key) -> Option<E> {
        self.write().remove(key)
    }

    /// Remove the entry for `key` only if it still satisfies `predicate`.
    ///
    /// The check and the removal happen under one write lock.
    pub fn remove_if<P>(&self, key: &E::Key, predicate: P) -> Option<E>
    where
        P: FnOnce(&E) -> bool,
    {
        let mut entries = self.write();
        match entries.get(key) {
            Some(entity) if predicate(entity) => entries.remove(key),
            _ => None,
        }
    }

    pub fn find(&self, key: &E::Key) -> Option<E> {
        self.read().get(key).cloned()
    }

    pub fn contains(&self, key: &E::Key) -> bool {
        self.read().contains_key(key)
    }

    /// Snapshot of every entity. Order is unspecified.
    pub fn all(&self) -> Vec<E> {
        self.read().values().cloned().collect()
    }

    /// Snapshot of the entities matching `predicate`. Order is unspecified.
    pub fn find_where<P>(&self, mut predicate: P) -> Vec<E>
    where
        P: FnMut(&E) -> bool,
    {
        self.read()
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// The three entity caches of one build session.
#[derive(Debug, Default)]
pub struct SiteStore {
    pub fragments: EntityStore<Fragment>,
    pub layouts: EntityStore<Layout>,
    pub posts: EntityStore<Post>,
}

impl SiteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached post whose source file is `path`, if any.
    pub fn post_at(&self, path: &std::path::Path) -> Option<Post> {
        self.posts
            .find_where(|p| p.input_path() == path)
            .into_iter()
            .next()
    }

    /// Name of the layout `post` is actually rendered with: its own layout
    /// when cached, otherwise `default_layout`.
    pub fn effective_layout_name<'a>(&self, post: &'a Post, default_layout: &'a str) -> &'a str {
        if self.layouts.contains(&post.layout_name) {
            &post.layout_name
        } else {
            default_layout
        }
    }

    /// Keys of every post rendered with layout `name`.
    ///
    /// That is the posts naming it directly, plus, when `name` is the default
    /// layout, the posts whose own layout is missing and fall back to it.
    pub fn posts_rendered_with(&self, name: &str, default_layout: &str) -> Vec<PostKey> {
        let layouts = self.layouts.read();
        let mut keys: Vec<PostKey> = self
            .posts
            .read()
            .values()
            .filter(|p| {
                p.layout_name == name
                    || (name == default_layout && !layouts.contains_key(&p.layout_name))
            })
            .map(|p| p.key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Names of every layout embedding fragment `name`.
    pub fn layouts_depending_on(&self, fragment: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .layouts
            .read()
            .values()
            .filter(|l| l.depends_on(fragment))
            .map(|l| l.name().to_string())
            .collect();
        names.sort();
        names
    }
}
