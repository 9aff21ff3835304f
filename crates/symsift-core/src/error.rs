//! # Error Types
//!
//! General error handling for the sifting pipeline.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and readable error messages.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::dump::DumpKind;
use crate::types::{ResolvedType, TypeIndex};

/// Main error type for symsift operations
///
/// ## Error Categories
///
/// 1. **Dump text errors**: MalformedNumber, UnknownSection, AddressOverflow
/// 2. **Record errors**: IncompleteRecord
/// 3. **Consistency errors**: SizeMismatch
/// 4. **Dump tool errors**: DumpToolNotFound, DumpToolFailed
/// 5. **Usage errors**: InvalidArgument
/// 6. **I/O errors**: Io
///
/// Only `SizeMismatch` (under [`ConflictPolicy::Fail`](crate::options::ConflictPolicy::Fail))
/// and I/O failures abort a sift. The dump text errors are only raised in
/// strict mode; in lenient mode the offending line is skipped.
#[derive(Error, Debug)]
pub enum SymsiftError
{
    /// A numeric field in a dump could not be represented
    ///
    /// The dump grammar only admits digits at these positions, so this is in
    /// practice an overflow of the target integer type.
    #[error("Malformed {field} `{text}` at line {line}")]
    MalformedNumber
    {
        /// Which field was being parsed (e.g. "virtual address")
        field: &'static str,
        /// The offending text
        text: String,
        /// 1-based line number in the dump
        line: usize,
    },

    /// A symbol address names a section the section-header dump never listed
    #[error("Symbol `{name}` refers to unknown section {section}")]
    UnknownSection
    {
        /// Type name of the vftable symbol
        name: String,
        /// Section number from the `addr = <section>:<offset>` field
        section: u32,
    },

    /// `section base + offset` does not fit in 64 bits
    #[error("Address of `{name}` overflows: 0x{base:x} + 0x{offset:x}")]
    AddressOverflow
    {
        /// Type name of the vftable symbol
        name: String,
        /// Section base virtual address
        base: u64,
        /// Offset within the section
        offset: u64,
    },

    /// A class/struct record had a unique name but lacked a required field
    #[error("Type record {index} (`{name}`) has no {missing}")]
    IncompleteRecord
    {
        /// Index of the offending type record
        index: TypeIndex,
        /// Display name of the record
        name: String,
        /// The field that could not be found
        missing: &'static str,
    },

    /// The same display name was defined twice with different sizes
    ///
    /// Either two unrelated types collide on their display name, or the input
    /// is inconsistent. In both cases the layout can not be trusted.
    #[error(
        "Type `{}` redefined with sizeof {} (record {}), previously sizeof {} (record {})",
        .current.name, .current.size, .current.type_index, .previous.size, .previous.type_index
    )]
    SizeMismatch
    {
        /// The definition already in the catalog
        previous: Box<ResolvedType>,
        /// The definition that disagrees with it
        current: Box<ResolvedType>,
    },

    /// The external dump tool could not be started because it does not exist
    #[error("Dump tool not found: {}", .0.display())]
    DumpToolNotFound(PathBuf),

    /// The external dump tool exited unsuccessfully
    #[error("Dump tool failed producing the {kind} dump ({status}): {stderr}")]
    DumpToolFailed
    {
        /// Which dump was being produced
        kind: DumpKind,
        /// Exit status of the child process
        status: ExitStatus,
        /// Captured standard error, lossily decoded
        stderr: String,
    },

    /// Invalid argument passed to a symsift function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error (reading dumps, writing staged files, spawning the tool)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, SymsiftError>`
///
/// ```rust
/// use symsift_core::error::SymsiftResult;
/// fn foo() -> SymsiftResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type SymsiftResult<T> = std::result::Result<T, SymsiftError>;
