//! Per-collection schema hooks consulted by document store adapters.
//!
//! A schema normalises and validates writes, declares unique indexes and
//! hidden fields, hides documents from finds and lists the references that
//! are populated automatically.

use chrono::{DateTime, Utc};

use crate::domain::{Collection, Document, ValidationErrors};

/// The kind of write being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind<'a> {
    /// A new document; defaults are applied and every rule runs.
    Create,
    /// A partial update of an existing document. Rules run against the
    /// merged document but only violations on `patched` paths are reported.
    Update {
        /// Top-level paths present in the patch.
        patched: &'a [String],
    },
}

/// Storage type of a top-level field, used to cast textual filter operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Floating point or integer number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// RFC 3339 timestamp.
    Timestamp,
    /// Document identifier.
    Id,
    /// List of free-text values; matches when any element matches.
    TextList,
    /// List of timestamps; matches when any element matches.
    TimestampList,
    /// List of identifiers; matches when any element matches.
    IdList,
    /// Nested object; not filterable.
    Object,
}

/// Eager-loading directive for a related collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Populate {
    /// Field the related documents are written to.
    pub path: &'static str,
    /// Collection the related documents live in.
    pub collection: Collection,
    /// Field list applied to related documents, in projection syntax.
    pub select: &'static str,
    /// How related documents are located.
    pub link: PopulateLink,
}

/// How a population finds its related documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateLink {
    /// `path` holds one identifier or a list of identifiers.
    Reference,
    /// Related documents point back at this one through `foreign_field`.
    Virtual {
        /// Field in the related collection holding this document's id.
        foreign_field: &'static str,
    },
}

impl Populate {
    /// Replace identifiers stored under `path` with their documents.
    #[must_use]
    pub const fn reference(path: &'static str, collection: Collection, select: &'static str) -> Self {
        Self {
            path,
            collection,
            select,
            link: PopulateLink::Reference,
        }
    }

    /// Fill `path` with documents whose `foreign_field` holds this id.
    #[must_use]
    pub const fn virtual_field(
        path: &'static str,
        collection: Collection,
        foreign_field: &'static str,
        select: &'static str,
    ) -> Self {
        Self {
            path,
            collection,
            select,
            link: PopulateLink::Virtual { foreign_field },
        }
    }
}

/// Schema hooks for one collection.
pub trait CollectionSchema: Send + Sync {
    /// Collection governed by this schema.
    fn collection(&self) -> Collection;

    /// Apply defaults (on create), normalise values and check constraints on
    /// the merged candidate document.
    ///
    /// # Errors
    /// Returns every violated constraint.
    fn prepare(
        &self,
        document: &mut Document,
        write: WriteKind<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationErrors>;

    /// Field sets that must be unique across the collection.
    fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        &[]
    }

    /// Storage type of `field`.
    fn field_kind(&self, _field: &str) -> FieldKind {
        FieldKind::Text
    }

    /// Fields omitted from results unless requested explicitly.
    fn hidden_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether finds may return `document` at all.
    fn is_visible(&self, _document: &Document) -> bool {
        true
    }

    /// References populated on every find.
    fn auto_populate(&self) -> &'static [Populate] {
        &[]
    }

    /// Add computed fields to an outgoing document.
    fn decorate(&self, _document: &mut Document) {}
}
