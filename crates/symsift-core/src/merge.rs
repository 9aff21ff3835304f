//! # Type Record Classifier & Merger
//!
//! Turns each [`TypeRecordBlock`] into a [`Classification`] and folds it into
//! the [`TypeCatalog`].
//!
//! Class and structure records go through these checks in order; the first
//! one that applies decides the outcome:
//!
//! 1. `forward ref (-> 0x…)`: a forward declaration, only the index mapping
//!    is kept.
//! 2. No display name in the header: unusable.
//! 3. `options:` mentions `scoped`: the type is local to a translation unit
//!    and is removed from the catalog, vftable entry included.
//! 4. The name contains `<unnamed-`: anonymous, ignored.
//! 5. No `unique name:`: ignored. With one, `field list:` and `sizeof` are
//!    mandatory.
//!
//! What survives is merged by display name. Field-list records are consumed
//! without effect for now.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, trace, warn};

use crate::catalog::TypeCatalog;
use crate::error::{SymsiftError, SymsiftResult};
use crate::options::ConflictPolicy;
use crate::stream::{LeafKind, TypeRecordBlock};
use crate::types::{CatalogEntry, ResolvedType, Rva, TypeIndex};

static FORWARD_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"forward ref \(-> (0x[0-9A-Fa-f]+)\)").unwrap());
static SCOPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\boptions:[^\n]*\bscoped\b").unwrap());
static CLASS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)LF_\w+\s+\[size\s*=\s*\d+\s*\]\s+`(.+?)`\r?$").unwrap());
static UNIQUE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)unique name:\s`(.+?)`\r?$").unwrap());
static FIELD_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"field list: (0x[0-9A-Fa-f]+)").unwrap());
static SIZEOF: Lazy<Regex> = Lazy::new(|| Regex::new(r"sizeof (\d+)").unwrap());

/// Substring compilers put in the display name of anonymous aggregates.
pub const ANONYMOUS_MARKER: &str = "<unnamed-";

/// Forward declaration index to the index it points at.
pub type ForwardRefMap = BTreeMap<TypeIndex, TypeIndex>;

/// What a single record means for the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification
{
    /// Forward declaration of `target`.
    ForwardRef
    {
        index: TypeIndex,
        target: TypeIndex,
    },
    /// Aggregate header without a readable display name.
    Unnamed
    {
        index: TypeIndex,
    },
    /// Translation-unit local type; evicts any entry of the same name.
    Scoped
    {
        name: String,
    },
    /// `<unnamed-tag>` and friends.
    Anonymous
    {
        name: String,
    },
    /// Named aggregate without a unique name.
    NoUniqueName
    {
        index: TypeIndex,
        name: String,
    },
    /// A complete definition, `rva` still zero.
    Aggregate(ResolvedType),
    /// `LF_FIELDLIST`, no structural extraction yet.
    FieldList
    {
        index: TypeIndex,
    },
    /// Any other leaf kind.
    Ignored,
}

/// Classify a single record.
///
/// ## Errors
///
/// `IncompleteRecord` when a class/struct has a unique name but no usable
/// `field list:` or `sizeof`.
pub fn classify(block: &TypeRecordBlock) -> SymsiftResult<Classification>
{
    match &block.leaf {
        LeafKind::Class | LeafKind::Structure => classify_aggregate(block),
        LeafKind::FieldList => Ok(Classification::FieldList { index: block.index }),
        LeafKind::Other(_) => Ok(Classification::Ignored),
    }
}

fn classify_aggregate(block: &TypeRecordBlock) -> SymsiftResult<Classification>
{
    let index = block.index;
    let text = block.text.as_str();

    if let Some(caps) = FORWARD_REF.captures(text) {
        if let Ok(target) = caps[1].parse::<TypeIndex>() {
            return Ok(Classification::ForwardRef { index, target });
        }
    }

    let Some(name) = CLASS_NAME.captures(text).map(|caps| caps[1].to_string()) else {
        return Ok(Classification::Unnamed { index });
    };

    if SCOPED.is_match(text) {
        return Ok(Classification::Scoped { name });
    }

    if name.contains(ANONYMOUS_MARKER) {
        return Ok(Classification::Anonymous { name });
    }

    let Some(unique_name) = UNIQUE_NAME.captures(text).map(|caps| caps[1].to_string()) else {
        return Ok(Classification::NoUniqueName { index, name });
    };

    let field_list = FIELD_LIST.captures(text).and_then(|caps| caps[1].parse::<TypeIndex>().ok());
    let Some(field_list) = field_list else {
        return Err(SymsiftError::IncompleteRecord {
            index,
            name,
            missing: "field list",
        });
    };

    let size = SIZEOF.captures(text).and_then(|caps| caps[1].parse::<u64>().ok());
    let Some(size) = size else {
        return Err(SymsiftError::IncompleteRecord {
            index,
            name,
            missing: "sizeof",
        });
    };

    Ok(Classification::Aggregate(ResolvedType {
        name,
        rva: Rva::ZERO,
        type_index: index,
        field_list,
        unique_name,
        size,
    }))
}

/// A display name defined twice with different sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeConflict
{
    /// What the catalog held before.
    pub previous: ResolvedType,
    /// The definition that disagreed; this is what the catalog holds now.
    pub current: ResolvedType,
}

/// Counters for the merge pass, logged when it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats
{
    pub records: usize,
    pub forward_refs: usize,
    pub scoped: usize,
    pub evicted: usize,
    pub anonymous: usize,
    pub inserted: usize,
    pub promoted: usize,
    pub redefined: usize,
    pub incomplete: usize,
}

/// Everything the merge pass produces besides the catalog itself.
#[derive(Debug, Default)]
pub struct MergeOutcome
{
    pub forward_refs: ForwardRefMap,
    /// Byte offset of every recognized record in the type dump.
    pub positions: BTreeMap<TypeIndex, u64>,
    pub conflicts: Vec<SizeConflict>,
    /// Records dropped for missing fields, as their errors.
    pub incomplete: Vec<SymsiftError>,
    pub stats: MergeStats,
}

/// Folds classified records into a catalog it borrows exclusively.
pub struct TypeMerger<'a>
{
    catalog: &'a mut TypeCatalog,
    policy: ConflictPolicy,
    outcome: MergeOutcome,
}

impl<'a> TypeMerger<'a>
{
    pub fn new(catalog: &'a mut TypeCatalog, policy: ConflictPolicy) -> Self
    {
        Self {
            catalog,
            policy,
            outcome: MergeOutcome::default(),
        }
    }

    /// Record the block's position, classify it and apply the result.
    ///
    /// An incomplete record is logged and kept in the outcome; it does not
    /// stop the pass.
    ///
    /// ## Errors
    ///
    /// `SizeMismatch` under [`ConflictPolicy::Fail`].
    pub fn process(&mut self, block: &TypeRecordBlock) -> SymsiftResult<()>
    {
        self.outcome.stats.records += 1;
        if block.leaf.is_recognized() {
            self.outcome.positions.insert(block.index, block.offset);
        }

        match classify(block) {
            Ok(classification) => self.apply(classification),
            Err(err @ SymsiftError::IncompleteRecord { .. }) => {
                warn!(error = %err, offset = block.offset, "skipping type record");
                self.outcome.stats.incomplete += 1;
                self.outcome.incomplete.push(err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Apply an already classified record.
    ///
    /// ## Errors
    ///
    /// `SizeMismatch` under [`ConflictPolicy::Fail`].
    pub fn apply(&mut self, classification: Classification) -> SymsiftResult<()>
    {
        match classification {
            Classification::ForwardRef { index, target } => {
                trace!(%index, %target, "forward declaration");
                self.outcome.stats.forward_refs += 1;
                self.outcome.forward_refs.insert(index, target);
            }
            Classification::Scoped { name } => {
                self.outcome.stats.scoped += 1;
                if self.catalog.remove(&name).is_some() {
                    debug!(%name, "evicted scoped type");
                    self.outcome.stats.evicted += 1;
                }
            }
            Classification::Anonymous { name } => {
                trace!(%name, "anonymous type");
                self.outcome.stats.anonymous += 1;
            }
            Classification::Aggregate(ty) => self.merge(ty)?,
            Classification::Unnamed { index } => trace!(%index, "aggregate without display name"),
            Classification::NoUniqueName { index, name } => trace!(%index, %name, "aggregate without unique name"),
            Classification::FieldList { .. } | Classification::Ignored => {}
        }
        Ok(())
    }

    fn merge(&mut self, mut ty: ResolvedType) -> SymsiftResult<()>
    {
        match self.catalog.get(&ty.name) {
            None => {
                self.outcome.stats.inserted += 1;
            }
            Some(CatalogEntry::VftableOnly(entry)) => {
                ty.rva = entry.rva;
                self.outcome.stats.promoted += 1;
            }
            Some(CatalogEntry::Resolved(previous)) => {
                ty.rva = previous.rva;
                self.outcome.stats.redefined += 1;
                if previous.size != ty.size {
                    let previous = previous.clone();
                    match self.policy {
                        ConflictPolicy::Fail => {
                            return Err(SymsiftError::SizeMismatch {
                                previous: Box::new(previous),
                                current: Box::new(ty),
                            });
                        }
                        ConflictPolicy::Report => {
                            warn!(
                                name = %ty.name,
                                previous_size = previous.size,
                                previous_index = %previous.type_index,
                                size = ty.size,
                                index = %ty.type_index,
                                "type redefined with a different size"
                            );
                            self.outcome.conflicts.push(SizeConflict {
                                previous,
                                current: ty.clone(),
                            });
                        }
                    }
                }
            }
        }

        self.catalog.insert_resolved(ty);
        Ok(())
    }

    /// Finish the pass and hand back its side outputs.
    pub fn finish(self) -> MergeOutcome
    {
        let stats = &self.outcome.stats;
        info!(
            records = stats.records,
            inserted = stats.inserted,
            promoted = stats.promoted,
            redefined = stats.redefined,
            forward_refs = stats.forward_refs,
            evicted = stats.evicted,
            incomplete = stats.incomplete,
            conflicts = self.outcome.conflicts.len(),
            "merged type records"
        );
        self.outcome
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn block(index: u32, leaf: LeafKind, text: &str) -> TypeRecordBlock
    {
        TypeRecordBlock {
            index: TypeIndex::new(index),
            leaf,
            offset: 0,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_name_with_nested_backticks()
    {
        let text = "0x1200 | LF_CLASS [size = 60] ``anonymous namespace'::Widget`\n\
                    unique name: `.?AVWidget@?A0x1b2c@@`\n\
                    vtable: 0x11FF, base list: <no type>, field list: 0x11FE\n\
                    options: has unique name, sizeof 8\n";
        let classification = classify(&block(0x1200, LeafKind::Class, text)).unwrap();
        let Classification::Aggregate(ty) = classification else {
            panic!("expected an aggregate, got {classification:?}");
        };
        assert_eq!(ty.name, "`anonymous namespace'::Widget");
        assert_eq!(ty.unique_name, ".?AVWidget@?A0x1b2c@@");
        assert_eq!(ty.field_list, TypeIndex::new(0x11FE));
        assert_eq!(ty.size, 8);
    }

    #[test]
    fn test_scoped_only_counts_on_options_line()
    {
        let text = "0x1300 | LF_STRUCTURE [size = 40] `scoped_guard`\n\
                    unique name: `.?AUscoped_guard@@`\n\
                    vtable: <no type>, base list: <no type>, field list: 0x12FF\n\
                    options: has unique name, sizeof 4\n";
        let classification = classify(&block(0x1300, LeafKind::Structure, text)).unwrap();
        assert!(matches!(classification, Classification::Aggregate(_)));
    }

    #[test]
    fn test_field_list_and_other_leaves_are_inert()
    {
        let fields = classify(&block(0x10, LeafKind::FieldList, "0x10 | LF_FIELDLIST [size = 4]\n")).unwrap();
        assert_eq!(fields, Classification::FieldList { index: TypeIndex::new(0x10) });

        let other = classify(&block(0x11, LeafKind::Other("LF_ENUM".into()), "")).unwrap();
        assert_eq!(other, Classification::Ignored);
    }
}
