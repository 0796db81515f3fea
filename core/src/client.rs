//! Stateless HTTP request builder and response parser for the movie
//! collection.
//!
//! # Design
//! `ResourceClient` holds only the collection URL and carries no mutable
//! state between calls. Each of the four remote operations is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. The caller executes the actual HTTP
//! round-trip, keeping the core deterministic and free of I/O dependencies.
//!
//! Create and update are `multipart/form-data` with the fields `Name`,
//! `Description`, `Rating` (omitted when unrated) and `ImageFile` (omitted
//! when no new image was chosen).

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::MultipartForm;
use crate::types::{ImageFile, Item, ItemFields, ItemId};

pub const FIELD_NAME: &str = "Name";
pub const FIELD_DESCRIPTION: &str = "Description";
pub const FIELD_RATING: &str = "Rating";
pub const FIELD_IMAGE: &str = "ImageFile";

/// RFC 3986 unreserved characters stay as-is in an id segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Synchronous, stateless client for one collection endpoint.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network. The caller is responsible for executing the HTTP
/// round-trip between `build_*` and `parse_*`.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    collection_url: String,
}

impl ResourceClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            collection_url: config.collection_url(),
        }
    }

    /// Client for the default collection path under `base_url`.
    pub fn from_base_url(base_url: &str) -> Self {
        Self::new(&ClientConfig::new(base_url))
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    fn item_url(&self, id: &ItemId) -> String {
        format!(
            "{}/{}",
            self.collection_url,
            utf8_percent_encode(id.as_str(), PATH_SEGMENT)
        )
    }

    pub fn build_list_items(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.collection_url.clone(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_item(&self, fields: &ItemFields, image: Option<&ImageFile>) -> HttpRequest {
        multipart_request(HttpMethod::Post, self.collection_url.clone(), fields, image)
    }

    pub fn build_update_item(
        &self,
        id: &ItemId,
        fields: &ItemFields,
        image: Option<&ImageFile>,
    ) -> HttpRequest {
        multipart_request(HttpMethod::Put, self.item_url(id), fields, image)
    }

    pub fn build_delete_item(&self, id: &ItemId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.item_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list_items(&self, response: HttpResponse) -> Result<Vec<Item>, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    /// `None` when the server confirmed without echoing the item.
    pub fn parse_create_item(&self, response: HttpResponse) -> Result<Option<Item>, ApiError> {
        check_status(&response)?;
        parse_optional_item(&response)
    }

    /// `None` when the server confirmed without echoing the item (204).
    pub fn parse_update_item(&self, response: HttpResponse) -> Result<Option<Item>, ApiError> {
        check_status(&response)?;
        parse_optional_item(&response)
    }

    pub fn parse_delete_item(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)?;
        Ok(())
    }
}

fn multipart_request(
    method: HttpMethod,
    path: String,
    fields: &ItemFields,
    image: Option<&ImageFile>,
) -> HttpRequest {
    let mut form = MultipartForm::new()
        .text(FIELD_NAME, fields.name.as_str())
        .text(FIELD_DESCRIPTION, fields.description.as_str());
    if let Some(rating) = fields.rating {
        form = form.text(FIELD_RATING, rating.to_string());
    }
    if let Some(image) = image {
        form = form.file(FIELD_IMAGE, image);
    }
    HttpRequest {
        method,
        path,
        headers: vec![("content-type".to_string(), form.content_type())],
        body: Some(form.into_bytes()),
    }
}

fn parse_optional_item(response: &HttpResponse) -> Result<Option<Item>, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&response.body)
        .map(Some)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Problem-details body returned alongside 400/422.
#[derive(Deserialize)]
struct ProblemDetails {
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    if matches!(response.status, 400 | 422) {
        if let Ok(problem) = serde_json::from_str::<ProblemDetails>(&response.body) {
            if !problem.errors.is_empty() {
                return Err(ApiError::Rejected {
                    status: response.status,
                    errors: problem.errors,
                });
            }
        }
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
