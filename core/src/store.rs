//! The authoritative local copy of the collection.
//!
//! # Design
//! The server is the source of truth. The store never patches items locally:
//! every successful mutation leads to a full re-fetch, and the list that
//! comes back replaces the old one wholesale. A failed fetch empties the list
//! rather than leaving a stale one on screen.
//!
//! At most one list request is in flight. A user-triggered `load` during a
//! fetch is dropped; a mutation confirmed during a fetch queues one follow-up
//! fetch, since the in-flight response may predate the mutation.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::client::ResourceClient;
use crate::error::Error;
use crate::http::{HttpRequest, Outcome};
use crate::types::{Item, ItemId};

/// What the collection area of the UI should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Loading,
    /// The last fetch failed; the list is empty and `last_error` says why.
    Failed,
    /// The server has no items. Not an error.
    Empty,
    Ready,
}

#[derive(Debug, Default)]
pub struct CollectionStore {
    items: Vec<Item>,
    loading: bool,
    reload_queued: bool,
    last_error: Option<Error>,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn status(&self) -> StoreStatus {
        if self.loading {
            StoreStatus::Loading
        } else if self.last_error.is_some() {
            StoreStatus::Failed
        } else if self.items.is_empty() {
            StoreStatus::Empty
        } else {
            StoreStatus::Ready
        }
    }

    /// Start a full fetch. Returns `None` when one is already in flight.
    pub fn load(&mut self, client: &ResourceClient) -> Option<HttpRequest> {
        if self.loading {
            debug!("list fetch already in flight, dropping duplicate load");
            return None;
        }
        self.loading = true;
        debug!("fetching collection");
        Some(client.build_list_items())
    }

    /// The only post-mutation hook. Always converges through a full fetch,
    /// either right away or queued behind the one in flight.
    pub fn notify_mutation_succeeded(&mut self, client: &ResourceClient) -> Option<HttpRequest> {
        if self.loading {
            debug!("mutation confirmed during fetch, queueing a follow-up fetch");
            self.reload_queued = true;
            return None;
        }
        self.load(client)
    }

    /// Apply the outcome of the list request handed out by `load`. Returns
    /// the queued follow-up fetch, if any, which the host must execute and
    /// feed back here as well.
    pub fn finish_load(&mut self, client: &ResourceClient, outcome: Outcome) -> Option<HttpRequest> {
        if !self.loading {
            warn!("list response arrived with no fetch in flight, ignoring");
            return None;
        }

        let result = outcome
            .map_err(Error::from)
            .and_then(|response| client.parse_list_items(response).map_err(Error::from));

        match result {
            Ok(items) => {
                self.items = dedupe_by_id(items);
                self.last_error = None;
                info!(count = self.items.len(), "collection loaded");
            }
            Err(err) => {
                warn!(error = %err, "collection fetch failed, clearing list");
                self.items.clear();
                self.last_error = Some(err);
                self.reload_queued = false;
            }
        }

        if std::mem::take(&mut self.reload_queued) {
            debug!("issuing queued follow-up fetch");
            Some(client.build_list_items())
        } else {
            self.loading = false;
            None
        }
    }
}

/// Ids are unique in the authoritative list; a repeated id keeps its first
/// occurrence.
fn dedupe_by_id(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::with_capacity(items.len());
    let total = items.len();
    let unique: Vec<Item> = items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect();
    if unique.len() != total {
        warn!(dropped = total - unique.len(), "server returned duplicate item ids");
    }
    unique
}
