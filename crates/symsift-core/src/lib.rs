//! # symsift-core
//!
//! Reconstructs a catalog of C++ aggregate types with virtual tables from the
//! text dumps `llvm-pdbutil` produces for a PDB.
//!
//! Three independent dumps are correlated:
//! - the **section headers**, giving each section's base virtual address
//!   ([`sections`]);
//! - the **global symbols**, where every `Type::`vftable'` symbol yields the
//!   vftable's RVA ([`globals`]);
//! - the **type records**, streamed record by record ([`stream`]) and merged
//!   into the catalog ([`merge`]).
//!
//! The finished catalog is split into virtual types, other types and vftables
//! that never met a type record ([`partition`]), and rendered as a text report
//! ([`report`]). [`sifter::Sifter`] runs the passes in order and
//! [`dump::DumpTool`] produces the dumps in the first place.
//!
//! ## Example
//!
//! ```rust,no_run
//! use symsift_core::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>>
//! {
//!     let paths = DumpPaths::in_dir(".out".as_ref(), "app");
//!     let outcome = Sifter::new(SiftOptions::new()).sift_files(&paths)?;
//!     let (partitions, _merge) = outcome.partition();
//!     print!("{}", render(&partitions));
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod dump;
pub mod error;
pub mod globals;
pub mod merge;
pub mod options;
pub mod partition;
pub mod prelude;
pub mod report;
pub mod sections;
pub mod sifter;
pub mod stream;
pub mod types;

// Re-export commonly used types
pub use catalog::TypeCatalog;
pub use error::{SymsiftError, SymsiftResult};
pub use sifter::Sifter;
