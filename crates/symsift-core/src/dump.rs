//! # Dump Tool Runner
//!
//! Produces the text dumps by running `llvm-pdbutil` once per dump kind.
//!
//! The dumps do not depend on each other, so every child process is started
//! at once and the set is joined before anything is parsed. Each child's
//! stdout goes straight into its own temporary file; the files live as long
//! as the returned [`StagedDumps`] unless they are persisted.
//!
//! ```rust,no_run
//! use symsift_core::dump::{DumpKind, DumpTool};
//!
//! # async fn example() -> symsift_core::error::SymsiftResult<()> {
//! let tool = DumpTool::new("llvm-pdbutil");
//! let staged = tool.produce("app.pdb".as_ref(), DumpKind::ALL).await?;
//! let paths = staged.sift_paths()?;
//! # let _ = paths;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::error::{SymsiftError, SymsiftResult};
use crate::sifter::DumpPaths;

/// Environment variable overriding the dump tool path.
pub const PDBUTIL_ENV: &str = "SYMSIFT_PDBUTIL";
/// Tool looked up on `PATH` when nothing else is configured.
pub const DEFAULT_PDBUTIL: &str = "llvm-pdbutil";

/// One `llvm-pdbutil dump` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DumpKind
{
    Globals,
    Symbols,
    Types,
    SectionHeaders,
}

impl DumpKind
{
    /// Every kind, including the symbols dump nothing reads.
    pub const ALL: &'static [DumpKind] = &[Self::Globals, Self::Symbols, Self::Types, Self::SectionHeaders];

    /// The three kinds a sift reads.
    pub const REQUIRED: &'static [DumpKind] = &[Self::Globals, Self::Types, Self::SectionHeaders];

    /// Command line arguments placed before the PDB path.
    pub fn args(self) -> [&'static str; 2]
    {
        let flag = match self {
            Self::Globals => "--globals",
            Self::Symbols => "--symbols",
            Self::Types => "--types",
            Self::SectionHeaders => "--section-headers",
        };
        ["dump", flag]
    }

    /// Middle part of the persisted file name, `<stem>.<suffix>.txt`.
    pub fn file_suffix(self) -> &'static str
    {
        match self {
            Self::Globals => "globals",
            Self::Symbols => "symbols",
            Self::Types => "types",
            Self::SectionHeaders => "sections",
        }
    }
}

impl fmt::Display for DumpKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.file_suffix())
    }
}

/// Dumps written to temporary files.
#[derive(Debug, Default)]
pub struct StagedDumps
{
    files: BTreeMap<DumpKind, NamedTempFile>,
}

impl StagedDumps
{
    /// Path of a staged dump.
    pub fn path(&self, kind: DumpKind) -> Option<&Path>
    {
        self.files.get(&kind).map(NamedTempFile::path)
    }

    /// Paths for [`Sifter::sift_files`](crate::sifter::Sifter::sift_files).
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if one of the required kinds was not produced.
    pub fn sift_paths(&self) -> SymsiftResult<DumpPaths>
    {
        let path = |kind| {
            self.path(kind)
                .map(Path::to_path_buf)
                .ok_or_else(|| SymsiftError::InvalidArgument(format!("the {kind} dump was not produced")))
        };
        Ok(DumpPaths {
            sections: path(DumpKind::SectionHeaders)?,
            globals: path(DumpKind::Globals)?,
            types: path(DumpKind::Types)?,
        })
    }

    /// Keep every staged dump as `<dir>/<stem>.<kind>.txt`.
    ///
    /// The directory is created if needed. Returns the persisted paths.
    ///
    /// ## Errors
    ///
    /// `Io` if the directory can not be created or a file can not be moved
    /// (temporary files are copied when a rename crosses file systems).
    pub fn persist(self, dir: &Path, stem: &str) -> SymsiftResult<Vec<PathBuf>>
    {
        fs::create_dir_all(dir)?;
        let mut kept = Vec::with_capacity(self.files.len());
        for (kind, file) in self.files {
            let target = dir.join(format!("{stem}.{}.txt", kind.file_suffix()));
            if let Err(err) = file.persist(&target) {
                fs::copy(err.file.path(), &target)?;
            }
            debug!(%kind, path = %target.display(), "kept dump");
            kept.push(target);
        }
        Ok(kept)
    }
}

/// Handle on the external dump tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpTool
{
    program: PathBuf,
}

impl DumpTool
{
    pub fn new(program: impl Into<PathBuf>) -> Self
    {
        Self {
            program: program.into(),
        }
    }

    /// Tool from `SYMSIFT_PDBUTIL`, else `llvm-pdbutil` on `PATH`.
    pub fn from_env() -> Self
    {
        let program = std::env::var_os(PDBUTIL_ENV).unwrap_or_else(|| OsString::from(DEFAULT_PDBUTIL));
        Self::new(program)
    }

    pub fn program(&self) -> &Path
    {
        &self.program
    }

    /// Run one child per kind concurrently and wait for all of them.
    ///
    /// ## Errors
    ///
    /// - `DumpToolNotFound` if the program does not exist.
    /// - `DumpToolFailed` if any child exits unsuccessfully.
    /// - `Io` for temporary file or spawn failures.
    pub async fn produce(&self, pdb: &Path, kinds: &[DumpKind]) -> SymsiftResult<StagedDumps>
    {
        let mut pool = JoinSet::new();
        for &kind in kinds {
            let program = self.program.clone();
            let pdb = pdb.to_path_buf();
            pool.spawn(async move { run_one(program, pdb, kind).await.map(|file| (kind, file)) });
        }

        let mut staged = StagedDumps::default();
        while let Some(joined) = pool.join_next().await {
            let (kind, file) =
                joined.map_err(|err| SymsiftError::Io(std::io::Error::other(err)))??;
            staged.files.insert(kind, file);
        }

        info!(dumps = staged.files.len(), pdb = %pdb.display(), "dumps produced");
        Ok(staged)
    }
}

async fn run_one(program: PathBuf, pdb: PathBuf, kind: DumpKind) -> SymsiftResult<NamedTempFile>
{
    let file = tempfile::Builder::new()
        .prefix("symsift-")
        .suffix(&format!(".{}.txt", kind.file_suffix()))
        .tempfile()?;
    let stdout = file.reopen()?;

    debug!(%kind, program = %program.display(), "starting dump");
    let output = Command::new(&program)
        .args(kind.args())
        .arg(&pdb)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| match err.kind() {
            ErrorKind::NotFound => SymsiftError::DumpToolNotFound(program.clone()),
            _ => SymsiftError::Io(err),
        })?;

    if !output.status.success() {
        return Err(SymsiftError::DumpToolFailed {
            kind,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    debug!(%kind, path = %file.path().display(), "dump finished");
    Ok(file)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_dump_kind_arguments()
    {
        assert_eq!(DumpKind::Globals.args(), ["dump", "--globals"]);
        assert_eq!(DumpKind::SectionHeaders.args(), ["dump", "--section-headers"]);
        assert_eq!(DumpKind::SectionHeaders.file_suffix(), "sections");
        assert_eq!(DumpKind::Types.to_string(), "types");
    }

    #[test]
    fn test_sift_paths_requires_all_kinds()
    {
        let staged = StagedDumps::default();
        assert!(matches!(staged.sift_paths(), Err(SymsiftError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported()
    {
        let tool = DumpTool::new("/nonexistent/symsift-test/llvm-pdbutil");
        let err = tool.produce(Path::new("app.pdb"), DumpKind::REQUIRED).await.unwrap_err();
        assert!(matches!(err, SymsiftError::DumpToolNotFound(path) if path == tool.program()));
    }
}
