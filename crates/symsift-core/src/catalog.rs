//! # Type Catalog
//!
//! The single owned map every pass writes into, keyed by display name.
//!
//! The catalog is passed by `&mut` from the globals pass to the merge pass and
//! finally consumed by [`partition`](crate::partition::partition). There is
//! exactly one writer at a time, so no interior mutability is needed.

use std::collections::btree_map::{self, BTreeMap};

use crate::types::{CatalogEntry, ResolvedType, VftableEntry};

/// Type name to catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCatalog
{
    entries: BTreeMap<String, CatalogEntry>,
    name_width: usize,
}

impl TypeCatalog
{
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Insert or overwrite the vftable entry for `entry.name`.
    ///
    /// Also widens the report name column.
    pub fn insert_vftable(&mut self, entry: VftableEntry)
    {
        self.name_width = self.name_width.max(entry.name.len());
        self.entries.insert(entry.name.clone(), CatalogEntry::VftableOnly(entry));
    }

    /// Insert or overwrite the resolved record for `ty.name`.
    pub fn insert_resolved(&mut self, ty: ResolvedType)
    {
        self.entries.insert(ty.name.clone(), CatalogEntry::Resolved(ty));
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry>
    {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool
    {
        self.entries.contains_key(name)
    }

    /// Remove the entry for `name`, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<CatalogEntry>
    {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    /// Length of the longest vftable type name seen.
    pub fn name_width(&self) -> usize
    {
        self.name_width
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry>
    {
        self.entries.values()
    }
}

impl IntoIterator for TypeCatalog
{
    type Item = CatalogEntry;
    type IntoIter = btree_map::IntoValues<String, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter
    {
        self.entries.into_values()
    }
}
