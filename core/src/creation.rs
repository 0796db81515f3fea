//! Adding a new item: `Closed -> Open -> Submitting -> Closed` on success,
//! back to `Open` on failure.

use tracing::{debug, info, warn};

use crate::client::ResourceClient;
use crate::error::{Error, Result};
use crate::form::ItemForm;
use crate::http::{HttpRequest, Outcome};
use crate::store::CollectionStore;
use crate::types::ImageFile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreationState {
    #[default]
    Closed,
    Open,
    Submitting,
}

impl CreationState {
    fn label(self) -> &'static str {
        match self {
            CreationState::Closed => "closed",
            CreationState::Open => "open",
            CreationState::Submitting => "submitting",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreationFlow {
    state: CreationState,
    form: ItemForm,
    notice: Option<Error>,
}

impl CreationFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CreationState {
        self.state
    }

    pub fn form(&self) -> &ItemForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> Option<&mut ItemForm> {
        (self.state == CreationState::Open).then_some(&mut self.form)
    }

    pub fn notice(&self) -> Option<&Error> {
        self.notice.as_ref()
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidState {
            action,
            state: self.state.label(),
        }
    }

    /// Always starts from a blank form.
    pub fn open(&mut self) -> Result<()> {
        if self.state == CreationState::Submitting {
            return Err(self.invalid("open the form"));
        }
        self.reset();
        self.state = CreationState::Open;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if self.state == CreationState::Submitting {
            return Err(self.invalid("close the form"));
        }
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.form = ItemForm::default();
        self.notice = None;
        self.state = CreationState::Closed;
    }

    pub fn select_image(&mut self, image: ImageFile) -> Result<()> {
        if self.state != CreationState::Open {
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

    /// Validate and build the create request. Validation failures keep the
    /// form open and send nothing.
    pub fn submit(&mut self, client: &ResourceClient) -> Result<HttpRequest> {
        if self.state != CreationState::Open {
            return Err(self.invalid("submit"));
        }
        let fields = self.form.validate().map_err(|err| {
            debug!(error = %err, "create blocked by validation");
            let err = Error::from(err);
            self.notice = Some(err.clone());
            err
        })?;
        let request = client.build_create_item(&fields, self.form.image.as_ref());
        self.notice = None;
        self.state = CreationState::Submitting;
        debug!("submitting new item");
        Ok(request)
    }

    pub fn finish_submit(
        &mut self,
        client: &ResourceClient,
        store: &mut CollectionStore,
        outcome: Outcome,
    ) -> Result<Option<HttpRequest>> {
        if self.state != CreationState::Submitting {
            return Err(self.invalid("complete a submission"));
        }
        let result = outcome
            .map_err(Error::from)
            .and_then(|response| client.parse_create_item(response).map_err(Error::from));

        match result {
            Ok(created) => {
                info!(id = ?created.map(|item| item.id), "item created");
                self.reset();
                Ok(store.notify_mutation_succeeded(client))
            }
            Err(err) => {
                warn!(error = %err, "create failed");
                self.notice = Some(err.clone());
                self.state = CreationState::Open;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::http::{HttpMethod, HttpResponse, TransportError};

    fn client() -> ResourceClient {
        ResourceClient::from_base_url("http://localhost:3000")
    }

    fn open_with(name: &str, rating: Option<i64>) -> CreationFlow {
        let mut flow = CreationFlow::new();
        flow.open().unwrap();
        let form = flow.form_mut().unwrap();
        form.name = name.to_string();
        form.description = "Thriller".to_string();
        form.rating = rating;
        flow
    }

    #[test]
    fn starts_closed_and_opens_blank() {
        let mut flow = CreationFlow::new();
        assert_eq!(flow.state(), CreationState::Closed);
        assert!(flow.form_mut().is_none());
        flow.open().unwrap();
        assert_eq!(flow.state(), CreationState::Open);
        assert_eq!(flow.form(), &ItemForm::default());
    }

    #[test]
    fn reopening_after_close_has_no_residue() {
        let mut flow = open_with("Heat", Some(4));
        flow.select_image(ImageFile::new("h.png", "image/png", vec![1])).unwrap();
        flow.close().unwrap();
        flow.open().unwrap();
        assert_eq!(flow.form(), &ItemForm::default());
    }

    #[test]
    fn empty_name_is_blocked_before_the_network() {
        let mut flow = open_with("", None);
        let err = flow.submit(&client()).unwrap_err();
        assert_eq!(err, Error::Validation(ValidationError::EmptyName));
        assert_eq!(flow.state(), CreationState::Open);
        assert!(flow.notice().is_some());
    }

    #[test]
    fn success_closes_clears_and_reloads() {
        let c = client();
        let mut store = CollectionStore::new();
        let mut flow = open_with("Heat", Some(4));
        flow.select_image(ImageFile::new("h.png", "image/png", vec![1])).unwrap();

        let req = flow.submit(&c).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(flow.state(), CreationState::Submitting);

        let reload = flow
            .finish_submit(&c, &mut store, Ok(HttpResponse::new(201, r#"{"id":3,"name":"Heat","rating":4}"#)))
            .unwrap();
        assert!(reload.is_some());
        assert_eq!(flow.state(), CreationState::Closed);
        assert_eq!(flow.form(), &ItemForm::default());
        // not merged locally
        assert!(store.items().is_empty());
    }

    #[test]
    fn failure_reopens_with_input_kept() {
        let c = client();
        let mut store = CollectionStore::new();
        let mut flow = open_with("Heat", None);
        flow.submit(&c).unwrap();

        let err = flow
            .finish_submit(&c, &mut store, Err(TransportError::Connection("reset".into())))
            .unwrap_err();
        assert!(err.is_transport_failure());
        assert_eq!(flow.state(), CreationState::Open);
        assert_eq!(flow.form().name, "Heat");
        assert!(!store.is_loading());
    }

    #[test]
    fn cannot_close_mid_submission() {
        let mut flow = open_with("Heat", None);
        flow.submit(&client()).unwrap();
        assert!(flow.close().is_err());
        assert!(flow.open().is_err());
    }
}
