//! Catalog mutation engine.
//!
//! # Responsibility
//! - Compute the next catalog document from the current one and an operation.
//! - Reject malformed input and unknown ids before anything is persisted.
//!
//! # Invariants
//! - The input catalog is never modified; the result is a new document.
//! - Section and item order is preserved; additions append.
//! - Every successful operation yields `updated_at` strictly greater than the
//!   input's.
//! - Input validation runs before id lookup.

use crate::model::catalog::{Catalog, Item, Section};
use crate::model::operation::{normalize_label, normalize_optional, ItemFields, Operation};
use crate::service::clock::next_timestamp;
use crate::service::id_generator::{IdKind, IdentifierGenerator};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Object kind referenced by a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Catalog,
    Section,
    Item,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog => write!(f, "catalog"),
            Self::Section => write!(f, "section"),
            Self::Item => write!(f, "item"),
        }
    }
}

/// Why an input field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// Required value is empty after normalization.
    Blank,
    /// Target already exists.
    AlreadyExists,
    /// Value does not match the store it was issued to.
    OwnerMismatch,
    /// No strictly greater value is representable.
    Exhausted,
}

impl Display for ValidationReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "must not be blank"),
            Self::AlreadyExists => write!(f, "already exists"),
            Self::OwnerMismatch => write!(f, "does not match the store owner"),
            Self::Exhausted => write!(f, "has no representable successor"),
        }
    }
}

/// Engine rejection. Never accompanied by a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    Validation {
        field: &'static str,
        reason: ValidationReason,
    },
    NotFound {
        kind: EntityKind,
        id: String,
    },
}

impl Display for MutationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { field, reason } => write!(f, "invalid {field}: {reason}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: `{id}`"),
        }
    }
}

impl Error for MutationError {}

/// Non-pure inputs of one engine call.
pub struct MutationContext<'a> {
    pub now_epoch_ms: i64,
    pub ids: &'a IdentifierGenerator,
}

/// Result of a successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Complete next document.
    pub catalog: Catalog,
    /// Id minted by create/add operations.
    pub created_id: Option<String>,
}

/// Applies `operation` to `current` and returns the candidate document.
///
/// # Errors
/// - `Validation` for blank required input, or `CreateCatalog` when a catalog
///   already exists.
/// - `NotFound` for unknown section/item ids, or any non-create operation
///   when there is no catalog.
/// - `Validation` with `Exhausted` when `updated_at` is already `i64::MAX`.
pub fn apply_operation(
    current: Option<&Catalog>,
    operation: &Operation,
    ctx: &MutationContext<'_>,
) -> Result<MutationOutcome, MutationError> {
    let Some(current) = current else {
        return match operation {
            Operation::CreateCatalog { owner_id, name } => {
                create_catalog(None, owner_id, name, ctx)
            }
            _ => Err(MutationError::NotFound {
                kind: EntityKind::Catalog,
                id: String::new(),
            }),
        };
    };
    let mut next = current.clone();
    let mut created_id = None;

    match operation {
        Operation::CreateCatalog { owner_id, name } => {
            return create_catalog(Some(current), owner_id, name, ctx);
        }
        Operation::AddSection { name } => {
            let name = required(name, "section.name")?;
            let id = ctx.ids.next_for(IdKind::Section, Some(current));
            next.sections.push(Section::new(id.clone(), name));
            created_id = Some(id);
        }
        Operation::RenameSection { section_id, name } => {
            let name = required(name, "section.name")?;
            let index = section_index(current, section_id)?;
            next.sections[index].name = name;
        }
        Operation::RemoveSection { section_id } => {
            let index = section_index(current, section_id)?;
            next.sections.remove(index);
        }
        Operation::AddItem { section_id, fields } => {
            let item = build_item(fields, ctx, current)?;
            let index = section_index(current, section_id)?;
            created_id = Some(item.id.clone());
            next.sections[index].items.push(item);
        }
        Operation::RemoveItem {
            section_id,
            item_id,
        } => {
            let index = section_index(current, section_id)?;
            let items = &mut next.sections[index].items;
            let position = items
                .iter()
                .position(|item| &item.id == item_id)
                .ok_or_else(|| MutationError::NotFound {
                    kind: EntityKind::Item,
                    id: item_id.clone(),
                })?;
            items.remove(position);
        }
    }

    next.updated_at = next_timestamp(Some(current.updated_at), ctx.now_epoch_ms).ok_or(
        MutationError::Validation {
            field: "catalog.updated_at",
            reason: ValidationReason::Exhausted,
        },
    )?;
    Ok(MutationOutcome {
        catalog: next,
        created_id,
    })
}

fn create_catalog(
    current: Option<&Catalog>,
    owner_id: &str,
    name: &str,
    ctx: &MutationContext<'_>,
) -> Result<MutationOutcome, MutationError> {
    let owner_id = required(owner_id, "catalog.owner_id")?;
    let name = required(name, "catalog.name")?;
    if current.is_some() {
        return Err(MutationError::Validation {
            field: "catalog",
            reason: ValidationReason::AlreadyExists,
        });
    }

    let id = ctx.ids.next_for(IdKind::Catalog, None);
    let catalog = Catalog::new(id.clone(), owner_id, name, ctx.now_epoch_ms);
    Ok(MutationOutcome {
        catalog,
        created_id: Some(id),
    })
}

fn build_item(
    fields: &ItemFields,
    ctx: &MutationContext<'_>,
    current: &Catalog,
) -> Result<Item, MutationError> {
    let name = required(&fields.name, "item.name")?;
    let price = required(&fields.price, "item.price")?;
    Ok(Item {
        id: ctx.ids.next_for(IdKind::Item, Some(current)),
        name,
        price,
        description: fields.description.trim().to_string(),
        image_url: normalize_optional(fields.image_url.as_deref()),
    })
}

fn required(value: &str, field: &'static str) -> Result<String, MutationError> {
    normalize_label(value).ok_or(MutationError::Validation {
        field,
        reason: ValidationReason::Blank,
    })
}

fn section_index(catalog: &Catalog, section_id: &str) -> Result<usize, MutationError> {
    catalog
        .section_index(section_id)
        .ok_or_else(|| MutationError::NotFound {
            kind: EntityKind::Section,
            id: section_id.to_string(),
        })
}
