//! Form input shared by the item editor and the creation flow.

use crate::error::ValidationError;
use crate::types::{ImageFile, Item, ItemFields, Rating};

/// Raw user input. Anything may be typed here; `validate` is the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemForm {
    pub name: String,
    pub description: String,
    pub rating: Option<i64>,
    pub image: Option<ImageFile>,
}

impl ItemForm {
    /// Seed from an item snapshot. No image is selected.
    pub fn from_item(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone().unwrap_or_default(),
            rating: item.rating.map(|r| i64::from(r.get())),
            image: None,
        }
    }

    pub fn validate(&self) -> Result<ItemFields, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let rating = self.rating.map(Rating::new).transpose()?;
        Ok(ItemFields {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            rating,
        })
    }
}
