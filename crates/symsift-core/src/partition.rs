//! # Catalog Partitioner
//!
//! Splits a finished catalog into the three groups the report shows.

use crate::catalog::TypeCatalog;
use crate::types::{CatalogEntry, ResolvedType, VftableEntry};

/// The three disjoint views of a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPartitions
{
    /// Resolved types with a vftable, by ascending size.
    pub virtual_types: Vec<ResolvedType>,
    /// Resolved types without a vftable, by ascending size.
    pub other_types: Vec<ResolvedType>,
    /// Vftable symbols no class/struct record ever merged into, by ascending RVA.
    pub unexpanded: Vec<VftableEntry>,
    /// Width of the report name column.
    pub name_width: usize,
}

impl CatalogPartitions
{
    /// Total number of entries across the three groups.
    pub fn len(&self) -> usize
    {
        self.virtual_types.len() + self.other_types.len() + self.unexpanded.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}

/// Partition `catalog`, consuming it.
///
/// Each entry lands in exactly one group. Ties in the sort keys keep name
/// order since the catalog iterates by name and the sorts are stable.
pub fn partition(catalog: TypeCatalog) -> CatalogPartitions
{
    let mut partitions = CatalogPartitions {
        name_width: catalog.name_width(),
        ..CatalogPartitions::default()
    };

    for entry in catalog {
        match entry {
            CatalogEntry::Resolved(ty) if ty.is_virtual() => partitions.virtual_types.push(ty),
            CatalogEntry::Resolved(ty) => partitions.other_types.push(ty),
            CatalogEntry::VftableOnly(entry) => partitions.unexpanded.push(entry),
        }
    }

    partitions.virtual_types.sort_by_key(|ty| ty.size);
    partitions.other_types.sort_by_key(|ty| ty.size);
    partitions.unexpanded.sort_by_key(|entry| entry.rva);

    partitions
}
