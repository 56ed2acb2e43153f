//! Generic collection store for one REST resource.
//!
//! DESIGN
//! ======
//! Tasks and users share the same list/create/update/delete contract, so one
//! store is instantiated per [`Resource`]. The local collection only changes
//! after the server confirms a mutation, and always takes the server's copy of
//! the entity rather than the submitted payload.

#[cfg(test)]
#[path = "resource_test.rs"]
mod resource_test;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::net::{ApiError, Gateway};
use crate::state::store::Store;

/// Where newly created entities land in the local list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertAt {
    Front,
    Back,
}

pub trait Resource: Clone + DeserializeOwned + Send + Sync + 'static {
    type Create: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;

    /// Collection path with trailing slash, e.g. `/tasks/`.
    const COLLECTION: &'static str;
    /// Shown when a list fetch fails without a server message.
    const FETCH_FALLBACK: &'static str;
    const INSERT_AT: InsertAt;

    fn id(&self) -> i64;

    #[must_use]
    fn item_path(id: i64) -> String {
        format!("{}{id}", Self::COLLECTION)
    }
}

/// Cached collection plus request flags.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self { items: Vec::new(), loading: false, error: None }
    }
}

impl<T: Resource> CollectionState<T> {
    #[must_use]
    pub fn find(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    fn insert(&mut self, item: T) {
        match T::INSERT_AT {
            InsertAt::Front => self.items.insert(0, item),
            InsertAt::Back => self.items.push(item),
        }
    }

    fn replace(&mut self, id: i64, item: T) -> bool {
        match self.items.iter_mut().find(|existing| existing.id() == id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    fn upsert(&mut self, item: T) {
        if !self.replace(item.id(), item.clone()) {
            self.insert(item);
        }
    }

    fn remove(&mut self, id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        self.items.len() != before
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct ResourceStore<R> {
    gateway: Gateway,
    state: Store<CollectionState<R>>,
}

impl<R> Clone for ResourceStore<R> {
    fn clone(&self) -> Self {
        Self { gateway: self.gateway.clone(), state: self.state.clone() }
    }
}

impl<R: Resource> ResourceStore<R> {
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway, state: Store::default() }
    }

    #[must_use]
    pub fn state(&self) -> &Store<CollectionState<R>> {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> CollectionState<R> {
        self.state.snapshot()
    }

    #[must_use]
    pub fn items(&self) -> Vec<R> {
        self.state.with(|s| s.items.clone())
    }

    /// Replace the collection with the server's list.
    ///
    /// On failure the previous items are kept and `error` holds the message
    /// to display. `loading` is cleared either way.
    ///
    /// # Errors
    ///
    /// Returns the request error after recording it in the state.
    pub async fn fetch(&self) -> Result<(), ApiError> {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        match self.gateway.get::<Vec<R>>(R::COLLECTION).await {
            Ok(items) => {
                tracing::debug!(collection = R::COLLECTION, count = items.len(), "collection fetched");
                self.state.update(|s| {
                    s.items = items;
                    s.loading = false;
                });
                Ok(())
            }
            Err(err) => {
                let message = err.user_message(R::FETCH_FALLBACK);
                self.state.update(|s| {
                    s.error = Some(message);
                    s.loading = false;
                });
                Err(err)
            }
        }
    }

    /// Fetch one entity and upsert it into the collection.
    ///
    /// # Errors
    ///
    /// Returns the request error; the collection is unchanged on failure.
    pub async fn get(&self, id: i64) -> Result<R, ApiError> {
        let item: R = self.gateway.get(&R::item_path(id)).await?;
        self.state.update(|s| s.upsert(item.clone()));
        Ok(item)
    }

    /// Create an entity and add the server's copy to the collection.
    ///
    /// # Errors
    ///
    /// Returns the request error; the collection is unchanged on failure.
    pub async fn create(&self, payload: &R::Create) -> Result<R, ApiError> {
        let item: R = self.gateway.post(R::COLLECTION, payload).await?;
        self.state.update(|s| s.insert(item.clone()));
        Ok(item)
    }

    /// Apply a partial update and swap in the server's copy.
    ///
    /// # Errors
    ///
    /// Returns the request error; the collection is unchanged on failure.
    pub async fn update(&self, id: i64, patch: &R::Patch) -> Result<R, ApiError> {
        let item: R = self.gateway.put(&R::item_path(id), patch).await?;
        self.state.update(|s| {
            s.replace(id, item.clone());
        });
        Ok(item)
    }

    /// Delete an entity, removing it locally once the server confirms.
    ///
    /// # Errors
    ///
    /// Returns the request error; the collection is unchanged on failure.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.gateway.delete(&R::item_path(id)).await?;
        let removed = self.state.update_if(|s| s.remove(id));
        tracing::debug!(collection = R::COLLECTION, id, removed, "entity deleted");
        Ok(())
    }
}
