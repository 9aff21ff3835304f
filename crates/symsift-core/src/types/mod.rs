//! # Types
//!
//! Value types shared by every stage of the pipeline.
//!
//! The dumps are plain text, so nearly everything arrives as an integer or a
//! string. These wrappers give those integers a meaning (an [`Rva`] is not a
//! [`TypeIndex`]) and model the two shapes a catalog entry can take.

pub mod entry;
pub mod index;
pub mod rva;

// Re-export all public types
pub use entry::{CatalogEntry, ResolvedType, VftableEntry};
pub use index::TypeIndex;
pub use rva::Rva;
