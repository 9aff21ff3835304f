//! # Sifter
//!
//! Drives the passes in order: section headers, global symbols, then the
//! streamed type records merged as they are read.
//!
//! ```rust
//! use symsift_core::options::SiftOptions;
//! use symsift_core::sifter::Sifter;
//!
//! let sections = "SECTION HEADER #1\n    1000 virtual address\n";
//! let globals = "  40 | S_GDATA32 [size = 36] `Foo::`vftable'`\n       addr = 0001:0032\n";
//! let types = "";
//!
//! let outcome = Sifter::new(SiftOptions::new())
//!     .sift(sections.as_bytes(), globals.as_bytes(), types.as_bytes())
//!     .unwrap();
//! assert_eq!(outcome.catalog.get("Foo").unwrap().rva().value(), 0x1020);
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{info, info_span};

use crate::catalog::TypeCatalog;
use crate::error::{SymsiftError, SymsiftResult};
use crate::globals::collect_vftables;
use crate::merge::{MergeOutcome, TypeMerger};
use crate::options::SiftOptions;
use crate::partition::{partition, CatalogPartitions};
use crate::sections::SectionTable;
use crate::stream::TypeRecordReader;

/// Locations of the three dumps a sift needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpPaths
{
    pub sections: PathBuf,
    pub globals: PathBuf,
    pub types: PathBuf,
}

impl DumpPaths
{
    /// `<dir>/<stem>.sections.txt`, `<dir>/<stem>.globals.txt` and
    /// `<dir>/<stem>.types.txt`, the names [`StagedDumps::persist`](crate::dump::StagedDumps::persist) writes.
    pub fn in_dir(dir: &Path, stem: &str) -> Self
    {
        Self {
            sections: dir.join(format!("{stem}.sections.txt")),
            globals: dir.join(format!("{stem}.globals.txt")),
            types: dir.join(format!("{stem}.types.txt")),
        }
    }
}

/// Result of a sift.
#[derive(Debug)]
pub struct SiftOutcome
{
    pub sections: SectionTable,
    pub catalog: TypeCatalog,
    pub merge: MergeOutcome,
}

impl SiftOutcome
{
    /// Partition the catalog for reporting.
    pub fn partition(self) -> (CatalogPartitions, MergeOutcome)
    {
        (partition(self.catalog), self.merge)
    }
}

/// Runs the whole pipeline with one set of options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sifter
{
    options: SiftOptions,
}

impl Sifter
{
    pub fn new(options: SiftOptions) -> Self
    {
        Self { options }
    }

    pub fn options(&self) -> &SiftOptions
    {
        &self.options
    }

    /// Sift three dumps already opened as readers.
    ///
    /// ## Errors
    ///
    /// I/O errors from any reader, strict-mode dump text errors, and
    /// `SizeMismatch` under [`ConflictPolicy::Fail`](crate::options::ConflictPolicy::Fail).
    pub fn sift<S, G, T>(&self, sections: S, globals: G, types: T) -> SymsiftResult<SiftOutcome>
    where
        S: BufRead,
        G: BufRead,
        T: BufRead,
    {
        let sections = info_span!("sections").in_scope(|| self.sections_pass(sections))?;
        let mut catalog = TypeCatalog::new();
        info_span!("globals").in_scope(|| self.globals_pass(globals, &sections, &mut catalog))?;
        let merge = info_span!("types").in_scope(|| self.types_pass(types, &mut catalog))?;

        Ok(SiftOutcome {
            sections,
            catalog,
            merge,
        })
    }

    /// Sift three dumps on disk.
    ///
    /// Each file is opened right before its pass and closed when the pass
    /// ends, on success and on error alike.
    ///
    /// ## Errors
    ///
    /// As [`Sifter::sift`], plus `InvalidArgument` naming a dump that can not
    /// be opened.
    pub fn sift_files(&self, paths: &DumpPaths) -> SymsiftResult<SiftOutcome>
    {
        let sections = info_span!("sections", path = %paths.sections.display())
            .in_scope(|| self.sections_pass(open(&paths.sections)?))?;
        let mut catalog = TypeCatalog::new();
        info_span!("globals", path = %paths.globals.display())
            .in_scope(|| self.globals_pass(open(&paths.globals)?, &sections, &mut catalog))?;
        let merge = info_span!("types", path = %paths.types.display())
            .in_scope(|| self.types_pass(open(&paths.types)?, &mut catalog))?;

        Ok(SiftOutcome {
            sections,
            catalog,
            merge,
        })
    }

    fn sections_pass<R: BufRead>(&self, reader: R) -> SymsiftResult<SectionTable>
    {
        let sections = SectionTable::parse(reader, &self.options)?;
        info!(sections = sections.len(), "section headers parsed");
        Ok(sections)
    }

    fn globals_pass<R: BufRead>(&self, reader: R, sections: &SectionTable, catalog: &mut TypeCatalog) -> SymsiftResult<()>
    {
        let vftables = collect_vftables(reader, sections, catalog, &self.options)?;
        info!(vftables, distinct = catalog.len(), "vftable symbols collected");
        Ok(())
    }

    fn types_pass<R: BufRead>(&self, reader: R, catalog: &mut TypeCatalog) -> SymsiftResult<MergeOutcome>
    {
        let mut merger = TypeMerger::new(catalog, self.options.conflicts);
        for block in TypeRecordReader::new(reader, self.options.flush) {
            merger.process(&block?)?;
        }
        Ok(merger.finish())
    }
}

fn open(path: &Path) -> SymsiftResult<BufReader<File>>
{
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| SymsiftError::InvalidArgument(format!("unable to open {}: {err}", path.display())))
}
