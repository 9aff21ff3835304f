//! Common module for library exports

pub use crate::catalog::TypeCatalog;
pub use crate::dump::{DumpKind, DumpTool, StagedDumps};
pub use crate::error::{SymsiftError, SymsiftResult};
pub use crate::merge::{MergeOutcome, SizeConflict};
pub use crate::options::{ConflictPolicy, FlushPolicy, SiftOptions, Strictness};
pub use crate::partition::{partition, CatalogPartitions};
pub use crate::report::render;
pub use crate::sifter::{DumpPaths, SiftOutcome, Sifter};
pub use crate::types::{CatalogEntry, ResolvedType, Rva, TypeIndex, VftableEntry};
