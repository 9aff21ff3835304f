//! Tests for the type record stream reader

use symsift_core::options::FlushPolicy;
use symsift_core::stream::{LeafKind, TypeRecordBlock, TypeRecordReader};
use symsift_core::types::TypeIndex;

const DUMP: &str = "\
                     Types (TPI Stream)
============================================================
  Showing 4 records
  0x1000 | LF_POINTER [size = 12]
           referent = 0x0074 (int), mode = pointer, opts = None, kind = ptr64
  0x1001 | LF_FIELDLIST [size = 16]
           - LF_MEMBER [name = `x`, Type = 0x0074 (int), offset = 0, attrs = public]
  0x1002 | LF_STRUCTURE [size = 44] `Point`
           unique name: `.?AUPoint@@`
           vtable: <no type>, base list: <no type>, field list: 0x1001
           options: has unique name, sizeof 4
";

fn read(dump: &str, flush: FlushPolicy) -> Vec<TypeRecordBlock>
{
    TypeRecordReader::new(dump.as_bytes(), flush)
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn test_records_are_reassembled()
{
    let blocks = read(DUMP, FlushPolicy::EndOfStream);
    assert_eq!(blocks.len(), 2);

    assert_eq!(blocks[0].index, TypeIndex::new(0x1001));
    assert_eq!(blocks[0].leaf, LeafKind::FieldList);
    assert_eq!(blocks[0].text.lines().count(), 2);

    assert_eq!(blocks[1].index, TypeIndex::new(0x1002));
    assert_eq!(blocks[1].leaf, LeafKind::Structure);
    assert!(blocks[1].text.starts_with("  0x1002 | LF_STRUCTURE"));
    assert!(blocks[1].text.ends_with("sizeof 4\n"));
}

#[test]
fn test_unrecognized_leaves_are_skipped_with_their_body()
{
    let blocks = read(DUMP, FlushPolicy::EndOfStream);
    assert!(blocks.iter().all(|block| block.leaf.is_recognized()));
    assert!(blocks.iter().all(|block| !block.text.contains("referent")));
}

#[test]
fn test_offsets_point_at_header_lines()
{
    let blocks = read(DUMP, FlushPolicy::EndOfStream);
    for block in &blocks {
        let offset = usize::try_from(block.offset).unwrap();
        assert!(DUMP[offset..].starts_with(&block.text));
    }
}

#[test]
fn test_last_record_depends_on_flush_policy()
{
    assert_eq!(read(DUMP, FlushPolicy::EndOfStream).len(), 2);

    let trailing = read(DUMP, FlushPolicy::TrailingHeader);
    assert_eq!(trailing.len(), 1);
    assert_eq!(trailing[0].leaf, LeafKind::FieldList);
}

#[test]
fn test_unrecognized_header_closes_pending_record()
{
    let dump = "0x10 | LF_CLASS [size = 4] `A`\n  body\n0x11 | LF_ENUM [size = 4] `E`\n  enum body\n";
    let blocks = read(dump, FlushPolicy::TrailingHeader);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].text, "0x10 | LF_CLASS [size = 4] `A`\n  body\n");
}

#[test]
fn test_empty_and_headerless_input()
{
    assert!(read("", FlushPolicy::EndOfStream).is_empty());
    assert!(read("no records here\n", FlushPolicy::EndOfStream).is_empty());
}
