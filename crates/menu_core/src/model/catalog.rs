//! Catalog domain model.
//!
//! # Responsibility
//! - Define the canonical catalog -> section -> item document.
//! - Provide structural validation shared by read and write paths.
//!
//! # Invariants
//! - Section ids are unique within a catalog; item ids are unique within
//!   their section.
//! - Vector order is insertion order and is never re-sorted.
//! - `updated_at` is never earlier than `created_at`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable catalog identifier.
pub type CatalogId = String;
/// Owner key used to address one catalog document.
pub type OwnerId = String;
/// Section identifier, unique within one catalog.
pub type SectionId = String;
/// Item identifier, unique within one section.
pub type ItemId = String;

/// Top-level per-owner menu document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub id: CatalogId,
    pub owner_id: OwnerId,
    pub name: String,
    /// Ordered as inserted.
    pub sections: Vec<Section>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Strictly increases on every mutation.
    pub updated_at: i64,
}

/// Named, ordered group of items (a menu category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub items: Vec<Item>,
}

/// Leaf menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Opaque display string; never parsed.
    pub price: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Structural validation failure for a catalog document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogValidationError {
    BlankCatalogId,
    BlankCatalogName,
    BlankSectionId,
    BlankSectionName(SectionId),
    DuplicateSectionId(SectionId),
    BlankItemId(SectionId),
    BlankItemName(ItemId),
    BlankItemPrice(ItemId),
    DuplicateItemId {
        section_id: SectionId,
        item_id: ItemId,
    },
    UpdatedBeforeCreated {
        created_at: i64,
        updated_at: i64,
    },
    UpdatedAtExhausted,
}

impl Display for CatalogValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankCatalogId => write!(f, "catalog id must not be blank"),
            Self::BlankCatalogName => write!(f, "catalog name must not be blank"),
            Self::BlankSectionId => write!(f, "section id must not be blank"),
            Self::BlankSectionName(id) => write!(f, "section name must not be blank: {id}"),
            Self::DuplicateSectionId(id) => write!(f, "duplicate section id: {id}"),
            Self::BlankItemId(section_id) => {
                write!(f, "item id must not be blank in section {section_id}")
            }
            Self::BlankItemName(id) => write!(f, "item name must not be blank: {id}"),
            Self::BlankItemPrice(id) => write!(f, "item price must not be blank: {id}"),
            Self::DuplicateItemId {
                section_id,
                item_id,
            } => write!(f, "duplicate item id {item_id} in section {section_id}"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must not be earlier than created_at ({created_at})"
            ),
            Self::UpdatedAtExhausted => write!(f, "updated_at leaves no room for another write"),
        }
    }
}

impl Error for CatalogValidationError {}

impl Catalog {
    /// Creates an empty catalog with both timestamps set to `now_epoch_ms`.
    pub fn new(
        id: impl Into<CatalogId>,
        owner_id: impl Into<OwnerId>,
        name: impl Into<String>,
        now_epoch_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            name: name.into(),
            sections: Vec::new(),
            created_at: now_epoch_ms,
            updated_at: now_epoch_ms,
        }
    }

    /// Returns the section with `section_id`, if present.
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == section_id)
    }

    /// Returns the position of `section_id` in the section sequence.
    pub fn section_index(&self, section_id: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section.id == section_id)
    }

    /// Returns whether `id` is used by this catalog, any section or any item.
    pub fn contains_id(&self, id: &str) -> bool {
        self.id == id
            || self
                .sections
                .iter()
                .any(|section| section.id == id || section.item(id).is_some())
    }

    /// Total number of items across all sections.
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|section| section.items.len()).sum()
    }

    /// Validates structural invariants.
    ///
    /// # Errors
    /// - Returns the first violation found, walking sections in order.
    pub fn validate(&self) -> Result<(), CatalogValidationError> {
        if self.id.trim().is_empty() {
            return Err(CatalogValidationError::BlankCatalogId);
        }
        if self.name.trim().is_empty() {
            return Err(CatalogValidationError::BlankCatalogName);
        }
        if self.updated_at < self.created_at {
            return Err(CatalogValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        if self.updated_at == i64::MAX {
            return Err(CatalogValidationError::UpdatedAtExhausted);
        }

        let mut section_ids = HashSet::new();
        for section in &self.sections {
            if section.id.trim().is_empty() {
                return Err(CatalogValidationError::BlankSectionId);
            }
            if !section_ids.insert(section.id.as_str()) {
                return Err(CatalogValidationError::DuplicateSectionId(
                    section.id.clone(),
                ));
            }
            section.validate()?;
        }
        Ok(())
    }
}

impl Section {
    /// Creates an empty section.
    pub fn new(id: impl Into<SectionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Returns the item with `item_id`, if present.
    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == item_id)
    }

    fn validate(&self) -> Result<(), CatalogValidationError> {
        if self.name.trim().is_empty() {
            return Err(CatalogValidationError::BlankSectionName(self.id.clone()));
        }

        let mut item_ids = HashSet::new();
        for item in &self.items {
            if item.id.trim().is_empty() {
                return Err(CatalogValidationError::BlankItemId(self.id.clone()));
            }
            if !item_ids.insert(item.id.as_str()) {
                return Err(CatalogValidationError::DuplicateItemId {
                    section_id: self.id.clone(),
                    item_id: item.id.clone(),
                });
            }
            if item.name.trim().is_empty() {
                return Err(CatalogValidationError::BlankItemName(item.id.clone()));
            }
            if item.price.trim().is_empty() {
                return Err(CatalogValidationError::BlankItemPrice(item.id.clone()));
            }
        }
        Ok(())
    }
}
