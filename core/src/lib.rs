//! Client-side view-state core for a REST-backed movie collection.
//!
//! # Overview
//! Fetches the collection, derives the filtered and sorted list the UI shows,
//! and drives create/update/delete so that the local view always converges
//! back to server truth. Like the rest of the crate, nothing here touches the
//! network: operations hand out `HttpRequest` values and accept the host's
//! outcome (host-does-IO pattern).
//!
//! # Design
//! - `ResourceClient` is stateless; it builds and parses the four remote
//!   operations and normalizes loosely-typed server fields once.
//! - `CollectionStore` owns the authoritative list and re-fetches it in full
//!   after every confirmed mutation. Nothing is patched locally.
//! - `project` is a pure filter-then-stable-sort over the store's items.
//! - `ItemEditor` and `CreationFlow` are explicit state machines that own
//!   their form input and report success to the store.
//! - `Catalog` wires them together the way an application root would.

pub mod catalog;
pub mod client;
pub mod config;
pub mod creation;
pub mod editor;
pub mod error;
pub mod form;
pub mod http;
pub mod multipart;
pub mod store;
pub mod types;
pub mod view;

pub use catalog::Catalog;
pub use client::ResourceClient;
pub use config::ClientConfig;
pub use creation::{CreationFlow, CreationState};
pub use editor::{DeleteState, EditState, ItemEditor};
pub use error::{ApiError, Error, Field, Result, ValidationError};
pub use form::ItemForm;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Outcome, TransportError};
pub use multipart::MultipartForm;
pub use store::{CollectionStore, StoreStatus};
pub use types::{ImageFile, Item, ItemFields, ItemId, Rating};
pub use view::{project, SortOrder, ViewParameters};
