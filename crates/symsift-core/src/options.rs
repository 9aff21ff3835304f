//! # Sift Options
//!
//! Knobs that decide how the pipeline reacts to imperfect input.
//!
//! ```rust
//! use symsift_core::options::{ConflictPolicy, FlushPolicy, SiftOptions, Strictness};
//!
//! let options = SiftOptions::new()
//!     .with_strictness(Strictness::Strict)
//!     .with_conflict_policy(ConflictPolicy::Fail);
//! assert_eq!(options.flush, FlushPolicy::EndOfStream);
//! ```

use tracing::warn;

use crate::error::{SymsiftError, SymsiftResult};

/// How the section and globals passes treat text they can not use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness
{
    /// Skip the line, log a warning and carry on.
    #[default]
    Lenient,
    /// Return the error to the caller.
    Strict,
}

/// What to do when a type is redefined with a different size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy
{
    /// Record a [`SizeConflict`](crate::merge::SizeConflict), keep the newest
    /// definition and continue.
    #[default]
    Report,
    /// Abort with [`SymsiftError::SizeMismatch`](crate::error::SymsiftError::SizeMismatch).
    Fail,
}

/// Whether the last record of the type dump is classified.
///
/// Records are emitted one header late. The only question is what happens to
/// the record still buffered when input runs out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlushPolicy
{
    /// Emit the buffered record at end of input.
    #[default]
    EndOfStream,
    /// Only emit a record once another header follows it. The trailing
    /// record is dropped, which matches dumps that always end with a
    /// sentinel record.
    TrailingHeader,
}

/// Options for a [`Sifter`](crate::sifter::Sifter) run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiftOptions
{
    pub strictness: Strictness,
    pub conflicts: ConflictPolicy,
    pub flush: FlushPolicy,
}

impl SiftOptions
{
    /// Lenient parsing, reported conflicts, flush at end of stream.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    #[must_use]
    pub fn with_strictness(mut self, strictness: Strictness) -> Self
    {
        self.strictness = strictness;
        self
    }

    #[must_use]
    pub fn with_conflict_policy(mut self, conflicts: ConflictPolicy) -> Self
    {
        self.conflicts = conflicts;
        self
    }

    #[must_use]
    pub fn with_flush_policy(mut self, flush: FlushPolicy) -> Self
    {
        self.flush = flush;
        self
    }

    /// Surface `err` in strict mode, log and swallow it otherwise.
    pub(crate) fn tolerate(&self, err: SymsiftError) -> SymsiftResult<()>
    {
        match self.strictness {
            Strictness::Strict => Err(err),
            Strictness::Lenient => {
                warn!(error = %err, "skipping unusable dump line");
                Ok(())
            }
        }
    }
}
