//! User-issued catalog operations and input normalization.
//!
//! # Responsibility
//! - Describe every mutation the catalog core accepts.
//! - Normalize free-text labels before validation.
//!
//! # Invariants
//! - Required labels are trimmed and whitespace runs collapsed.
//! - `Operation::kind()` labels are stable; they appear in log lines.

use crate::model::catalog::{ItemId, OwnerId, SectionId};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Input fields for a new item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFields {
    pub name: String,
    /// Opaque display string such as `"2.00"` or `"$4.50"`.
    pub price: String,
    pub description: String,
    pub image_url: Option<String>,
}

impl ItemFields {
    /// Builds fields with empty description and no image.
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// One catalog mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Creates the owner's catalog. Only valid when none exists.
    CreateCatalog { owner_id: OwnerId, name: String },
    /// Appends a new empty section.
    AddSection { name: String },
    /// Renames a section in place.
    RenameSection { section_id: SectionId, name: String },
    /// Removes a section together with all of its items.
    RemoveSection { section_id: SectionId },
    /// Appends a new item to a section.
    AddItem {
        section_id: SectionId,
        fields: ItemFields,
    },
    /// Removes one item from a section.
    RemoveItem {
        section_id: SectionId,
        item_id: ItemId,
    },
}

impl Operation {
    /// Stable snake_case label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateCatalog { .. } => "create_catalog",
            Self::AddSection { .. } => "add_section",
            Self::RenameSection { .. } => "rename_section",
            Self::RemoveSection { .. } => "remove_section",
            Self::AddItem { .. } => "add_item",
            Self::RemoveItem { .. } => "remove_item",
        }
    }
}

/// Default name for a lazily created catalog.
///
/// Returns `"<owner>'s Menu"`, or `"Menu"` when the display name is blank.
pub fn default_catalog_name(owner_display_name: &str) -> String {
    match normalize_label(owner_display_name) {
        Some(owner) => format!("{owner}'s Menu"),
        None => "Menu".to_string(),
    }
}

/// Trims and collapses whitespace. Returns `None` when nothing remains.
pub fn normalize_label(value: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

/// Trims an optional reference; blank values become `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
