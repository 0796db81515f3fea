//! Wiring of store, view parameters, creation flow and per-item editors.
//!
//! `Catalog` plays the role of the application root: it owns every piece of
//! state explicitly and routes each mutation completion to the store's
//! reload hook. Every method that can put a request on the wire returns it;
//! the host executes it and feeds the outcome to the matching `finish_*`.

use std::collections::HashMap;

use tracing::debug;

use crate::client::ResourceClient;
use crate::creation::CreationFlow;
use crate::editor::ItemEditor;
use crate::error::{Error, Result};
use crate::http::{HttpRequest, Outcome};
use crate::store::CollectionStore;
use crate::types::{Item, ItemId};
use crate::view::{project, ViewParameters};

#[derive(Debug)]
pub struct Catalog {
    client: ResourceClient,
    store: CollectionStore,
    params: ViewParameters,
    creation: CreationFlow,
    editors: HashMap<ItemId, ItemEditor>,
}

impl Catalog {
    pub fn new(client: ResourceClient) -> Self {
        Self {
            client,
            store: CollectionStore::new(),
            params: ViewParameters::default(),
            creation: CreationFlow::new(),
            editors: HashMap::new(),
        }
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn params(&self) -> &ViewParameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ViewParameters {
        &mut self.params
    }

    /// The list the UI renders right now.
    pub fn visible(&self) -> Vec<&Item> {
        project(self.store.items(), &self.params)
    }

    pub fn load(&mut self) -> Option<HttpRequest> {
        self.store.load(&self.client)
    }

    /// Apply a list outcome. Editors whose item is gone are dropped unless
    /// they still have a request in flight.
    pub fn finish_load(&mut self, outcome: Outcome) -> Option<HttpRequest> {
        let follow_up = self.store.finish_load(&self.client, outcome);
        if self.store.last_error().is_none() {
            let store = &self.store;
            self.editors.retain(|id, editor| editor.is_busy() || store.contains(id));
        }
        follow_up
    }

    pub fn creation(&self) -> &CreationFlow {
        &self.creation
    }

    pub fn creation_mut(&mut self) -> &mut CreationFlow {
        &mut self.creation
    }

    pub fn submit_creation(&mut self) -> Result<HttpRequest> {
        self.creation.submit(&self.client)
    }

    pub fn finish_creation(&mut self, outcome: Outcome) -> Result<Option<HttpRequest>> {
        self.creation.finish_submit(&self.client, &mut self.store, outcome)
    }

    pub fn editor(&self, id: &ItemId) -> Option<&ItemEditor> {
        self.editors.get(id)
    }

    /// Editor for an item currently in the store, created on first use.
    pub fn editor_mut(&mut self, id: &ItemId) -> Result<&mut ItemEditor> {
        editor_entry(&mut self.editors, &self.store, id)
    }

    /// Open the inline editor seeded from the store's current snapshot.
    pub fn begin_edit(&mut self, id: &ItemId) -> Result<()> {
        let current = self
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownItem(id.to_string()))?;
        self.editor_mut(id)?.begin_edit(&current)
    }

    pub fn submit_edit(&mut self, id: &ItemId) -> Result<HttpRequest> {
        editor_entry(&mut self.editors, &self.store, id)?.submit(&self.client)
    }

    /// An update that lands after its editor went away still reloads the
    /// store when the server confirmed it; a failure is dropped silently.
    pub fn finish_edit(&mut self, id: &ItemId, outcome: Outcome) -> Result<Option<HttpRequest>> {
        match self.editors.get_mut(id) {
            Some(editor) => editor.finish_submit(&self.client, &mut self.store, outcome),
            None => {
                let confirmed = outcome
                    .map_err(Error::from)
                    .and_then(|response| self.client.parse_update_item(response).map_err(Error::from));
                Ok(self.finish_orphaned(id, "update", confirmed.map(drop)))
            }
        }
    }

    pub fn request_delete(&mut self, id: &ItemId) -> Result<()> {
        self.editor_mut(id)?.request_delete()
    }

    pub fn cancel_delete(&mut self, id: &ItemId) {
        if let Some(editor) = self.editors.get_mut(id) {
            editor.cancel_delete();
        }
    }

    pub fn confirm_delete(&mut self, id: &ItemId) -> Result<HttpRequest> {
        editor_entry(&mut self.editors, &self.store, id)?.confirm_delete(&self.client)
    }

    /// Same late-completion rule as `finish_edit`.
    pub fn finish_delete(&mut self, id: &ItemId, outcome: Outcome) -> Result<Option<HttpRequest>> {
        match self.editors.get_mut(id) {
            Some(editor) => editor.finish_delete(&self.client, &mut self.store, outcome),
            None => {
                let confirmed = outcome
                    .map_err(Error::from)
                    .and_then(|response| self.client.parse_delete_item(response).map_err(Error::from));
                Ok(self.finish_orphaned(id, "delete", confirmed))
            }
        }
    }

    fn finish_orphaned(&mut self, id: &ItemId, action: &str, confirmed: Result<()>) -> Option<HttpRequest> {
        match confirmed {
            Ok(()) => {
                debug!(item = %id, action, "mutation confirmed after its editor went away, reloading");
                self.store.notify_mutation_succeeded(&self.client)
            }
            Err(err) => {
                debug!(item = %id, action, error = %err, "mutation failed after its editor went away, dropping");
                None
            }
        }
    }

    /// Forget an editor, e.g. when its card is unmounted.
    pub fn drop_editor(&mut self, id: &ItemId) {
        self.editors.remove(id);
    }
}

fn editor_entry<'a>(
    editors: &'a mut HashMap<ItemId, ItemEditor>,
    store: &CollectionStore,
    id: &ItemId,
) -> Result<&'a mut ItemEditor> {
    if !editors.contains_key(id) && !store.contains(id) {
        return Err(Error::UnknownItem(id.to_string()));
    }
    Ok(editors
        .entry(id.clone())
        .or_insert_with(|| ItemEditor::new(id.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditState;
    use crate::http::{HttpResponse, TransportError};
    use crate::view::SortOrder;

    const TWO: &str = r#"[{"id":1,"name":"Dune","rating":5},{"id":2,"name":"arrival","rating":4}]"#;

    fn loaded() -> Catalog {
        let mut catalog = Catalog::new(ResourceClient::from_base_url("http://localhost:3000"));
        catalog.load().unwrap();
        catalog.finish_load(Ok(HttpResponse::new(200, TWO)));
        catalog
    }

    fn visible_names(catalog: &Catalog) -> Vec<String> {
        catalog.visible().iter().map(|i| i.name.clone()).collect()
    }

    #[test]
    fn visible_follows_parameter_changes() {
        let mut catalog = loaded();
        assert_eq!(visible_names(&catalog), vec!["arrival", "Dune"]);

        catalog.params_mut().sort_order = SortOrder::Descending;
        assert_eq!(visible_names(&catalog), vec!["Dune", "arrival"]);

        catalog.params_mut().search_term = "du".to_string();
        assert_eq!(visible_names(&catalog), vec!["Dune"]);
    }

    #[test]
    fn edit_round_trip_reloads_the_collection() {
        let mut catalog = loaded();
        let id = ItemId::from(2);
        catalog.begin_edit(&id).unwrap();
        catalog.editor_mut(&id).unwrap().form_mut().unwrap().name = "Arrival".to_string();
        catalog.submit_edit(&id).unwrap();

        let reload = catalog
            .finish_edit(&id, Ok(HttpResponse::new(200, r#"{"id":2,"name":"Arrival"}"#)))
            .unwrap()
            .unwrap();
        assert_eq!(reload, catalog.client().build_list_items());
        // echo is not merged; the old snapshot stands until the reload lands
        assert_eq!(catalog.store().get(&id).unwrap().name, "arrival");

        catalog.finish_load(Ok(HttpResponse::new(
            200,
            r#"[{"id":1,"name":"Dune"},{"id":2,"name":"Arrival","rating":4}]"#,
        )));
        assert_eq!(catalog.store().get(&id).unwrap().name, "Arrival");
        assert_eq!(catalog.editor(&id).unwrap().state(), EditState::Viewing);
    }

    #[test]
    fn editing_an_unknown_item_fails() {
        let mut catalog = loaded();
        assert_eq!(
            catalog.begin_edit(&ItemId::from(99)),
            Err(Error::UnknownItem("99".to_string()))
        );
    }

    #[test]
    fn editors_of_vanished_items_are_pruned() {
        let mut catalog = loaded();
        let id = ItemId::from(1);
        catalog.begin_edit(&id).unwrap();
        catalog.load().unwrap();
        catalog.finish_load(Ok(HttpResponse::new(200, r#"[{"id":2,"name":"arrival"}]"#)));
        assert!(catalog.editor(&id).is_none());
    }

    #[test]
    fn confirmed_delete_after_editor_dropped_still_reloads() {
        let mut catalog = loaded();
        let id = ItemId::from(2);
        catalog.request_delete(&id).unwrap();
        catalog.confirm_delete(&id).unwrap();
        catalog.drop_editor(&id);

        let reload = catalog
            .finish_delete(&id, Ok(HttpResponse::new(204, "")))
            .unwrap()
            .unwrap();
        assert_eq!(reload, catalog.client().build_list_items());
        assert!(catalog.store().is_loading());

        catalog.finish_load(Ok(HttpResponse::new(200, r#"[{"id":1,"name":"Dune","rating":5}]"#)));
        assert_eq!(visible_names(&catalog), vec!["Dune"]);
    }

    #[test]
    fn confirmed_update_after_editor_dropped_still_reloads() {
        let mut catalog = loaded();
        let id = ItemId::from(1);
        catalog.begin_edit(&id).unwrap();
        catalog.submit_edit(&id).unwrap();
        catalog.drop_editor(&id);

        let reload = catalog
            .finish_edit(&id, Ok(HttpResponse::new(200, r#"{"id":1,"name":"Dune"}"#)))
            .unwrap();
        assert!(reload.is_some());
        assert!(catalog.store().is_loading());
    }

    #[test]
    fn failed_completion_after_editor_dropped_is_discarded() {
        let mut catalog = loaded();
        let id = ItemId::from(1);
        catalog.request_delete(&id).unwrap();
        catalog.confirm_delete(&id).unwrap();
        catalog.drop_editor(&id);

        let result = catalog.finish_delete(&id, Err(TransportError::Timeout));
        assert_eq!(result, Ok(None));
        assert!(!catalog.store().is_loading());
        assert_eq!(visible_names(&catalog), vec!["arrival", "Dune"]);
    }

    #[test]
    fn confirming_needs_a_prior_request() {
        let mut catalog = loaded();
        assert!(matches!(
            catalog.confirm_delete(&ItemId::from(1)),
            Err(Error::InvalidState { .. })
        ));
        assert_eq!(
            catalog.confirm_delete(&ItemId::from(99)),
            Err(Error::UnknownItem("99".to_string()))
        );
    }

    #[test]
    fn delete_timeout_keeps_item_and_shows_notice() {
        let mut catalog = loaded();
        let id = ItemId::from(2);
        catalog.request_delete(&id).unwrap();
        catalog.confirm_delete(&id).unwrap();
        assert!(catalog.finish_delete(&id, Err(TransportError::Timeout)).is_err());
        assert_eq!(visible_names(&catalog), vec!["arrival", "Dune"]);
        assert!(catalog.editor(&id).unwrap().notice().is_some());
    }

    #[test]
    fn creation_is_routed_to_reload() {
        let mut catalog = loaded();
        catalog.creation_mut().open().unwrap();
        catalog.creation_mut().form_mut().unwrap().name = "Heat".to_string();
        catalog.submit_creation().unwrap();
        let reload = catalog
            .finish_creation(Ok(HttpResponse::new(201, r#"{"id":3,"name":"Heat"}"#)))
            .unwrap();
        assert!(reload.is_some());
        assert!(catalog.store().is_loading());
    }
}
