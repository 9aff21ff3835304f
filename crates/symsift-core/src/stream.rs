//! # Type Record Stream Reader
//!
//! Single forward pass over `llvm-pdbutil dump --types` output that
//! reassembles multi-line type records.
//!
//! ```text
//!   0x10DB | LF_STRUCTURE [size = 132] `TRegistrationInfo<UEnum,FEnumReloadVersionInfo>`
//!            unique name: `.?AU?$TRegistrationInfo@VUEnum@@UFEnumReloadVersionInfo@@@@`
//!            vtable: <no type>, base list: <no type>, field list: 0x10DA
//!            options: has ctor / dtor | contains nested class | has unique name, sizeof 24
//! ```
//!
//! A record starts at a header line (`<hex index> | LF_<KIND>`) and owns
//! every line up to the next header. Because the end of a record is only
//! known when the next header shows up, the reader keeps one record buffered
//! and hands it out one header late. End of input is an explicit event; what
//! happens to the buffered record then is decided by [`FlushPolicy`].
//!
//! Only class, structure and field-list records are yielded. Other leaf kinds
//! are read past without buffering their text.

use std::fmt;
use std::io::BufRead;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::SymsiftResult;
use crate::options::FlushPolicy;
use crate::types::TypeIndex;

static RECORD_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(0x[0-9A-Fa-f]+)\s*\|\s*(LF_\w+)").unwrap());

/// Leaf kind token of a type record header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LeafKind
{
    /// `LF_CLASS`
    Class,
    /// `LF_STRUCTURE`
    Structure,
    /// `LF_FIELDLIST`
    FieldList,
    /// Any other `LF_*` token, kept verbatim.
    Other(String),
}

impl LeafKind
{
    pub fn from_token(token: &str) -> Self
    {
        match token {
            "LF_CLASS" => Self::Class,
            "LF_STRUCTURE" => Self::Structure,
            "LF_FIELDLIST" => Self::FieldList,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether records of this kind are handed to the classifier.
    pub fn is_recognized(&self) -> bool
    {
        !matches!(self, Self::Other(_))
    }

    /// Class or structure, the two kinds that describe an aggregate.
    pub fn is_aggregate(&self) -> bool
    {
        matches!(self, Self::Class | Self::Structure)
    }
}

impl fmt::Display for LeafKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Class => f.write_str("LF_CLASS"),
            Self::Structure => f.write_str("LF_STRUCTURE"),
            Self::FieldList => f.write_str("LF_FIELDLIST"),
            Self::Other(token) => f.write_str(token),
        }
    }
}

/// One complete type record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecordBlock
{
    pub index: TypeIndex,
    pub leaf: LeafKind,
    /// Byte offset of the header line in the dump.
    pub offset: u64,
    /// Header line and body lines, line terminators included.
    pub text: String,
}

/// What a single line of input turned out to be.
enum StreamEvent
{
    Header
    {
        index: TypeIndex,
        leaf: LeafKind,
        offset: u64,
        line: String,
    },
    Body(String),
    EndOfStream,
}

/// Iterator over the recognized records of a type dump.
///
/// ```rust
/// use symsift_core::options::FlushPolicy;
/// use symsift_core::stream::{LeafKind, TypeRecordReader};
///
/// let dump = "  0x1000 | LF_FIELDLIST [size = 4]\n  0x1001 | LF_POINTER [size = 12]\n";
/// let blocks: Vec<_> = TypeRecordReader::new(dump.as_bytes(), FlushPolicy::EndOfStream)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].leaf, LeafKind::FieldList);
/// ```
pub struct TypeRecordReader<R>
{
    reader: R,
    flush: FlushPolicy,
    pending: Option<TypeRecordBlock>,
    position: u64,
    finished: bool,
}

impl<R: BufRead> TypeRecordReader<R>
{
    pub fn new(reader: R, flush: FlushPolicy) -> Self
    {
        Self {
            reader,
            flush,
            pending: None,
            position: 0,
            finished: false,
        }
    }

    fn next_event(&mut self) -> SymsiftResult<StreamEvent>
    {
        let mut line = String::new();
        let offset = self.position;
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Ok(StreamEvent::EndOfStream);
        }
        self.position += read as u64;

        let header = RECORD_HEADER
            .captures(&line)
            .map(|caps| (caps[1].to_string(), LeafKind::from_token(&caps[2])));
        let Some((index_text, leaf)) = header else {
            return Ok(StreamEvent::Body(line));
        };

        match index_text.parse::<TypeIndex>() {
            Ok(index) => Ok(StreamEvent::Header {
                index,
                leaf,
                offset,
                line,
            }),
            Err(err) => {
                // Still a record boundary: close the pending record and skip this one.
                warn!(offset, index = %index_text, %err, "unreadable type index");
                Ok(StreamEvent::Header {
                    index: TypeIndex::new(u32::MAX),
                    leaf: LeafKind::Other(leaf.to_string()),
                    offset,
                    line,
                })
            }
        }
    }

    fn end_of_stream(&mut self) -> Option<TypeRecordBlock>
    {
        self.finished = true;
        let pending = self.pending.take()?;
        match self.flush {
            FlushPolicy::EndOfStream => Some(pending),
            FlushPolicy::TrailingHeader => {
                debug!(index = %pending.index, leaf = %pending.leaf, "trailing record not flushed");
                None
            }
        }
    }
}

impl<R: BufRead> Iterator for TypeRecordReader<R>
{
    type Item = SymsiftResult<TypeRecordBlock>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.finished {
            return None;
        }

        loop {
            let event = match self.next_event() {
                Ok(event) => event,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            };

            match event {
                StreamEvent::Header {
                    index,
                    leaf,
                    offset,
                    line,
                } => {
                    let ready = self.pending.take();
                    if leaf.is_recognized() {
                        self.pending = Some(TypeRecordBlock {
                            index,
                            leaf,
                            offset,
                            text: line,
                        });
                    }
                    if let Some(block) = ready {
                        return Some(Ok(block));
                    }
                }
                StreamEvent::Body(line) => {
                    if let Some(block) = self.pending.as_mut() {
                        block.text.push_str(&line);
                    }
                }
                StreamEvent::EndOfStream => return self.end_of_stream().map(Ok),
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_leaf_kind_round_trips_token()
    {
        assert_eq!(LeafKind::from_token("LF_CLASS"), LeafKind::Class);
        assert_eq!(LeafKind::from_token("LF_MODIFIER").to_string(), "LF_MODIFIER");
        assert!(!LeafKind::from_token("LF_ENUM").is_recognized());
        assert!(LeafKind::Structure.is_aggregate());
        assert!(!LeafKind::FieldList.is_aggregate());
    }

    #[test]
    fn test_overflowing_index_still_closes_record()
    {
        let dump = "0x1000 | LF_CLASS [size = 4] `A`\nbody\n0x1FFFFFFFF | LF_CLASS [size = 4] `B`\nlost\n";
        let blocks: Vec<_> = TypeRecordReader::new(dump.as_bytes(), FlushPolicy::EndOfStream)
            .collect::<SymsiftResult<_>>()
            .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "0x1000 | LF_CLASS [size = 4] `A`\nbody\n");
    }
}
