//! Per-item inline edit and delete.
//!
//! Edit: `Viewing -> Editing -> Submitting -> Viewing` on success, back to
//! `Editing` on failure with the typed input intact.
//!
//! Delete runs alongside: `Idle -> Confirming -> Deleting -> Idle`. Nothing is
//! removed locally; the item disappears only when the post-delete reload no
//! longer contains it.

use tracing::{debug, info, warn};

use crate::client::ResourceClient;
use crate::error::{Error, Result};
use crate::form::ItemForm;
use crate::http::{HttpRequest, Outcome};
use crate::store::CollectionStore;
use crate::types::{ImageFile, Item, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Viewing,
    Editing,
    Submitting,
}

impl EditState {
    fn label(self) -> &'static str {
        match self {
            EditState::Viewing => "viewing",
            EditState::Editing => "editing",
            EditState::Submitting => "submitting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteState {
    Idle,
    Confirming,
    Deleting,
}

impl DeleteState {
    fn label(self) -> &'static str {
        match self {
            DeleteState::Idle => "idle",
            DeleteState::Confirming => "awaiting confirmation",
            DeleteState::Deleting => "deleting",
        }
    }
}

/// Edit/delete state for exactly one item.
#[derive(Debug, Clone)]
pub struct ItemEditor {
    item_id: ItemId,
    state: EditState,
    delete: DeleteState,
    form: ItemForm,
    notice: Option<Error>,
}

impl ItemEditor {
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            state: EditState::Viewing,
            delete: DeleteState::Idle,
            form: ItemForm::default(),
            notice: None,
        }
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn delete_state(&self) -> DeleteState {
        self.delete
    }

    pub fn form(&self) -> &ItemForm {
        &self.form
    }

    /// Editable only while `Editing`; a submission in flight freezes the form.
    pub fn form_mut(&mut self) -> Option<&mut ItemForm> {
        (self.state == EditState::Editing).then_some(&mut self.form)
    }

    /// The last failure for this item, if the user has not moved on.
    pub fn notice(&self) -> Option<&Error> {
        self.notice.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.state == EditState::Submitting || self.delete == DeleteState::Deleting
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidState {
            action,
            state: self.state.label(),
        }
    }

    fn ensure_not_deleting(&self, action: &'static str) -> Result<()> {
        if self.delete == DeleteState::Deleting {
            return Err(Error::InvalidState {
                action,
                state: self.delete.label(),
            });
        }
        Ok(())
    }

    /// Open the edit form seeded from the current authoritative snapshot.
    pub fn begin_edit(&mut self, current: &Item) -> Result<()> {
        if current.id != self.item_id {
            return Err(Error::ItemMismatch {
                expected: self.item_id.to_string(),
                actual: current.id.to_string(),
            });
        }
        if self.state == EditState::Submitting {
            return Err(self.invalid("begin editing"));
        }
        self.ensure_not_deleting("begin editing")?;
        self.form = ItemForm::from_item(current);
        self.notice = None;
        self.state = EditState::Editing;
        debug!(item = %self.item_id, "editing");
        Ok(())
    }

    pub fn cancel_edit(&mut self) -> Result<()> {
        if self.state != EditState::Editing {
            return Err(self.invalid("cancel editing"));
        }
        self.form = ItemForm::default();
        self.notice = None;
        self.state = EditState::Viewing;
        Ok(())
    }

    pub fn select_image(&mut self, image: ImageFile) -> Result<()> {
        if self.state != EditState::Editing {
            return Err(self.invalid("select an image"));
        }
        self.form.image = Some(image);
        Ok(())
    }

    pub fn clear_image(&mut self) {
        if let Some(form) = self.form_mut() {
            form.image = None;
        }
    }

    /// Validate and build the update request. A validation failure keeps the
    /// editor in `Editing` and nothing is sent.
    pub fn submit(&mut self, client: &ResourceClient) -> Result<HttpRequest> {
        if self.state != EditState::Editing {
            return Err(self.invalid("submit"));
        }
        self.ensure_not_deleting("submit")?;
        let fields = self.form.validate().map_err(|err| {
            debug!(item = %self.item_id, error = %err, "edit blocked by validation");
            let err = Error::from(err);
            self.notice = Some(err.clone());
            err
        })?;
        let request = client.build_update_item(&self.item_id, &fields, self.form.image.as_ref());
        self.notice = None;
        self.state = EditState::Submitting;
        debug!(item = %self.item_id, "submitting update");
        Ok(request)
    }

    /// Apply the update outcome. On success the store is told and its reload
    /// request (if one starts now) is returned; on failure the editor goes
    /// back to `Editing` with the form untouched and the store is left alone.
    pub fn finish_submit(
        &mut self,
        client: &ResourceClient,
        store: &mut CollectionStore,
        outcome: Outcome,
    ) -> Result<Option<HttpRequest>> {
        if self.state != EditState::Submitting {
            return Err(self.invalid("complete a submission"));
        }
        let result = outcome
            .map_err(Error::from)
            .and_then(|response| client.parse_update_item(response).map_err(Error::from));

        match result {
            Ok(_) => {
                info!(item = %self.item_id, "item updated");
                self.form = ItemForm::default();
                self.notice = None;
                self.state = EditState::Viewing;
                Ok(store.notify_mutation_succeeded(client))
            }
            Err(err) => {
                warn!(item = %self.item_id, error = %err, "update failed");
                self.notice = Some(err.clone());
                self.state = EditState::Editing;
                Err(err)
            }
        }
    }

    /// Ask for confirmation before deleting.
    pub fn request_delete(&mut self) -> Result<()> {
        self.ensure_not_deleting("request deletion")?;
        if self.state == EditState::Submitting {
            return Err(self.invalid("request deletion"));
        }
        self.delete = DeleteState::Confirming;
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        if self.delete == DeleteState::Confirming {
            self.delete = DeleteState::Idle;
        }
    }

    /// Confirmation given: build the delete request.
    pub fn confirm_delete(&mut self, client: &ResourceClient) -> Result<HttpRequest> {
        if self.delete != DeleteState::Confirming {
            return Err(Error::InvalidState {
                action: "confirm deletion",
                state: self.delete.label(),
            });
        }
        self.delete = DeleteState::Deleting;
        self.notice = None;
        debug!(item = %self.item_id, "deleting");
        Ok(client.build_delete_item(&self.item_id))
    }

    /// Apply the delete outcome. The item is never removed locally; on
    /// success the store reloads, on failure it stays as it was.
    pub fn finish_delete(
        &mut self,
        client: &ResourceClient,
        store: &mut CollectionStore,
        outcome: Outcome,
    ) -> Result<Option<HttpRequest>> {
        if self.delete != DeleteState::Deleting {
            return Err(Error::InvalidState {
                action: "complete a deletion",
                state: self.delete.label(),
            });
        }
        self.delete = DeleteState::Idle;
        let result = outcome
            .map_err(Error::from)
            .and_then(|response| client.parse_delete_item(response).map_err(Error::from));

        match result {
            Ok(()) => {
                info!(item = %self.item_id, "item deleted");
                self.notice = None;
                Ok(store.notify_mutation_succeeded(client))
            }
            Err(err) => {
                warn!(item = %self.item_id, error = %err, "delete failed");
                self.notice = Some(err.clone());
                Err(err)
            }
        }
    }
}
