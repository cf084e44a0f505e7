//! Watchlist and favorites, persisted to device-local storage.
//!
//! The store is the single writer of both collections. Every mutation writes
//! the whole updated collection as a JSON array under its storage key; if the
//! write fails the in-memory change is rolled back, so memory and storage never
//! disagree. Subscribers are notified after each successful mutation.

pub mod storage;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shiori_api::CatalogRecord;

use crate::error::ShioriError;

pub use storage::{FileStore, KeyValueStore, MemoryStore};

/// The two named collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    Watchlist,
    Favorites,
}

impl CollectionKind {
    pub const ALL: &[CollectionKind] = &[Self::Watchlist, Self::Favorites];

    /// Key the collection is persisted under.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Watchlist => "anime-watchlist",
            Self::Favorites => "anime-favorites",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Watchlist => "watchlist",
            Self::Favorites => "favorites",
        }
    }

    pub fn parse(name: &str) -> Result<Self, ShioriError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "watchlist" => Ok(Self::Watchlist),
            "favorites" | "favourites" => Ok(Self::Favorites),
            other => Err(ShioriError::UnknownCollection(other.to_string())),
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What changed in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionChange {
    Added(u64),
    Removed(u64),
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionEvent {
    pub kind: CollectionKind,
    pub change: CollectionChange,
}

/// Handle returned by [`CollectionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CollectionEvent) + Send>;

pub struct CollectionStore<S: KeyValueStore> {
    storage: S,
    watchlist: Vec<CatalogRecord>,
    favorites: Vec<CatalogRecord>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: KeyValueStore> CollectionStore<S> {
    /// Rehydrate both collections from `storage`.
    ///
    /// A collection that cannot be read or parsed is logged and starts empty;
    /// the other collection still loads.
    pub fn load(storage: S) -> Self {
        let watchlist = read_collection(&storage, CollectionKind::Watchlist);
        let favorites = read_collection(&storage, CollectionKind::Favorites);
        tracing::debug!(
            watchlist = watchlist.len(),
            favorites = favorites.len(),
            "collections loaded"
        );
        Self {
            storage,
            watchlist,
            favorites,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Entries in insertion order.
    pub fn entries(&self, kind: CollectionKind) -> &[CatalogRecord] {
        match kind {
            CollectionKind::Watchlist => &self.watchlist,
            CollectionKind::Favorites => &self.favorites,
        }
    }

    pub fn contains(&self, kind: CollectionKind, id: u64) -> bool {
        self.entries(kind).iter().any(|r| r.id == id)
    }

    pub fn get(&self, kind: CollectionKind, id: u64) -> Option<&CatalogRecord> {
        self.entries(kind).iter().find(|r| r.id == id)
    }

    pub fn len(&self, kind: CollectionKind) -> usize {
        self.entries(kind).len()
    }

    pub fn is_empty(&self, kind: CollectionKind) -> bool {
        self.entries(kind).is_empty()
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Append `record` unless its id is already present.
    ///
    /// Returns `Ok(false)` for the no-op case.
    pub fn add(&mut self, kind: CollectionKind, record: CatalogRecord) -> Result<bool, ShioriError> {
        if self.contains(kind, record.id) {
            return Ok(false);
        }
        let id = record.id;
        self.entries_mut(kind).push(record);
        if let Err(e) = self.persist(kind) {
            self.entries_mut(kind).pop();
            return Err(e);
        }
        tracing::info!(collection = %kind, id, "added to collection");
        self.notify(kind, CollectionChange::Added(id));
        Ok(true)
    }

    /// Remove the entry with `id`. Returns `Ok(false)` if it was not present.
    pub fn remove(&mut self, kind: CollectionKind, id: u64) -> Result<bool, ShioriError> {
        let Some(pos) = self.entries(kind).iter().position(|r| r.id == id) else {
            return Ok(false);
        };
        let removed = self.entries_mut(kind).remove(pos);
        if let Err(e) = self.persist(kind) {
            self.entries_mut(kind).insert(pos, removed);
            return Err(e);
        }
        tracing::info!(collection = %kind, id, "removed from collection");
        self.notify(kind, CollectionChange::Removed(id));
        Ok(true)
    }

    /// Empty the collection.
    pub fn clear(&mut self, kind: CollectionKind) -> Result<(), ShioriError> {
        if self.is_empty(kind) {
            return Ok(());
        }
        let previous = std::mem::take(self.entries_mut(kind));
        if let Err(e) = self.persist(kind) {
            *self.entries_mut(kind) = previous;
            return Err(e);
        }
        tracing::info!(collection = %kind, cleared = previous.len(), "collection cleared");
        self.notify(kind, CollectionChange::Cleared);
        Ok(())
    }

    /// Add if absent, remove if present. Returns the new membership.
    pub fn toggle(&mut self, kind: CollectionKind, record: CatalogRecord) -> Result<bool, ShioriError> {
        if self.contains(kind, record.id) {
            self.remove(kind, record.id)?;
            Ok(false)
        } else {
            self.add(kind, record)?;
            Ok(true)
        }
    }

    // ── Subscriptions ───────────────────────────────────────────

    /// Register a listener called after every successful mutation.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&CollectionEvent) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    // ── Internals ───────────────────────────────────────────────

    fn entries_mut(&mut self, kind: CollectionKind) -> &mut Vec<CatalogRecord> {
        match kind {
            CollectionKind::Watchlist => &mut self.watchlist,
            CollectionKind::Favorites => &mut self.favorites,
        }
    }

    fn persist(&mut self, kind: CollectionKind) -> Result<(), ShioriError> {
        let json = serde_json::to_string(self.entries(kind))?;
        self.storage.set(kind.storage_key(), &json).inspect_err(|e| {
            tracing::error!(collection = %kind, error = %e, "failed to persist collection");
        })
    }

    fn notify(&mut self, kind: CollectionKind, change: CollectionChange) {
        let event = CollectionEvent { kind, change };
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

fn read_collection<S: KeyValueStore>(storage: &S, kind: CollectionKind) -> Vec<CatalogRecord> {
    let raw = match storage.get(kind.storage_key()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(collection = %kind, error = %e, "failed to read collection, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<CatalogRecord>>(&raw) {
        Ok(records) => {
            // Hand-edited files may repeat ids; keep the first occurrence.
            let mut seen = HashSet::new();
            records.into_iter().filter(|r| seen.insert(r.id)).collect()
        }
        Err(e) => {
            tracing::warn!(collection = %kind, error = %e, "corrupt collection data, starting empty");
            Vec::new()
        }
    }
}
