//! Catalog entry types.

use std::fmt;

use super::{Rva, TypeIndex};

/// A type known only through its vftable symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VftableEntry
{
    /// Display name, without the `::`vftable'` suffix.
    pub name: String,
    /// RVA of the vftable.
    pub rva: Rva,
}

/// Everything known about a named aggregate type after merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType
{
    /// Display name as printed by the type dump.
    pub name: String,
    /// Vftable RVA, [`Rva::ZERO`] when the type has no vftable symbol.
    pub rva: Rva,
    /// Index of the class/struct record this entry was last refreshed from.
    pub type_index: TypeIndex,
    /// Index of the `LF_FIELDLIST` record describing the members.
    pub field_list: TypeIndex,
    /// Compiler-generated unique (decorated) name, e.g. `.?AUFoo@@`.
    pub unique_name: String,
    /// `sizeof` in bytes.
    pub size: u64,
}

impl ResolvedType
{
    /// Whether the type has a vftable symbol.
    pub fn is_virtual(&self) -> bool
    {
        self.rva.is_known()
    }
}

/// One value of the type catalog.
///
/// A vftable symbol creates a [`CatalogEntry::VftableOnly`]; merging a
/// class/struct record promotes it to [`CatalogEntry::Resolved`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntry
{
    /// Only the vftable symbol has been seen.
    VftableOnly(VftableEntry),
    /// A class/struct record has been merged.
    Resolved(ResolvedType),
}

impl CatalogEntry
{
    /// Display name of the entry.
    pub fn name(&self) -> &str
    {
        match self {
            Self::VftableOnly(entry) => &entry.name,
            Self::Resolved(ty) => &ty.name,
        }
    }

    /// Vftable RVA (zero when unknown).
    pub fn rva(&self) -> Rva
    {
        match self {
            Self::VftableOnly(entry) => entry.rva,
            Self::Resolved(ty) => ty.rva,
        }
    }

    /// The resolved record, if the entry has been promoted.
    pub fn as_resolved(&self) -> Option<&ResolvedType>
    {
        match self {
            Self::Resolved(ty) => Some(ty),
            Self::VftableOnly(_) => None,
        }
    }
}

impl fmt::Display for CatalogEntry
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::VftableOnly(entry) => write!(f, "{} (vftable {})", entry.name, entry.rva),
            Self::Resolved(ty) => write!(
                f,
                "{} (vftable {}, type {}, fields {}, sizeof {})",
                ty.name, ty.rva, ty.type_index, ty.field_list, ty.size
            ),
        }
    }
}
