//! End-to-end tests: dumps in, partitions and report out

use std::fs;
use std::io::Write;

use similar_asserts::assert_eq;
use symsift_core::options::{ConflictPolicy, FlushPolicy, SiftOptions};
use symsift_core::partition::partition;
use symsift_core::report::{render, write_report};
use symsift_core::sifter::{DumpPaths, Sifter};
use symsift_core::types::{CatalogEntry, Rva, TypeIndex};
use symsift_core::SymsiftError;

const SECTIONS: &str = "\
SECTION HEADER #1
   .text name
    1000 virtual address
";

const GLOBALS_FOO: &str = "\
     1060 | S_GDATA32 [size = 36] `Foo::`vftable'`
            type = 0x1001 (), addr = 1:0x20
";

const GLOBALS_FOO_BAR: &str = "\
     1060 | S_GDATA32 [size = 36] `Foo::`vftable'`
            type = 0x1001 (), addr = 1:0x20
     1100 | S_GDATA32 [size = 36] `Bar::`vftable'`
            type = 0x1001 (), addr = 0001:0064
";

fn foo_types(options: &str) -> String
{
    format!(
        "  0x1006 | LF_STRUCTURE [size = 44] `Foo`\n           \
         unique name: `.?AUFoo@@`\n           \
         vtable: 0x1002, base list: <no type>, field list: 0x5\n           \
         options: {options}, sizeof 16\n"
    )
}

#[test]
fn test_virtual_type_is_resolved()
{
    let types = foo_types("has unique name");
    let outcome = Sifter::new(SiftOptions::new())
        .sift(SECTIONS.as_bytes(), GLOBALS_FOO.as_bytes(), types.as_bytes())
        .unwrap();

    let ty = outcome.catalog.get("Foo").and_then(CatalogEntry::as_resolved).unwrap();
    assert_eq!(ty.rva, Rva::from(0x1020));
    assert_eq!(ty.type_index, TypeIndex::new(0x1006));
    assert_eq!(ty.field_list, TypeIndex::new(0x5));
    assert_eq!(ty.unique_name, ".?AUFoo@@");
    assert_eq!(ty.size, 16);

    let (partitions, _) = outcome.partition();
    assert_eq!(partitions.virtual_types.len(), 1);
    assert_eq!(partitions.virtual_types[0].name, "Foo");
    assert!(partitions.other_types.is_empty());
    assert!(partitions.unexpanded.is_empty());
}

#[test]
fn test_scoped_type_is_absent_everywhere()
{
    let types = foo_types("has unique name | scoped");
    let outcome = Sifter::new(SiftOptions::new())
        .sift(SECTIONS.as_bytes(), GLOBALS_FOO.as_bytes(), types.as_bytes())
        .unwrap();

    assert!(!outcome.catalog.contains("Foo"));
    let (partitions, merge) = outcome.partition();
    assert!(partitions.is_empty());
    assert_eq!(merge.stats.evicted, 1);
}

#[test]
fn test_vftable_without_record_is_unexpanded()
{
    let types = foo_types("has unique name");
    let outcome = Sifter::new(SiftOptions::new())
        .sift(SECTIONS.as_bytes(), GLOBALS_FOO_BAR.as_bytes(), types.as_bytes())
        .unwrap();
    let (partitions, _) = outcome.partition();

    assert_eq!(partitions.unexpanded.len(), 1);
    assert_eq!(partitions.unexpanded[0].name, "Bar");
    assert_eq!(partitions.unexpanded[0].rva, Rva::from(0x1040));
    assert!(partitions.virtual_types.iter().all(|ty| ty.name != "Bar"));
    assert!(partitions.other_types.iter().all(|ty| ty.name != "Bar"));
}

#[test]
fn test_types_without_vftable_are_other_types()
{
    let types = "\
  0x1010 | LF_STRUCTURE [size = 44] `Big`
           unique name: `.?AUBig@@`
           vtable: <no type>, base list: <no type>, field list: 0x100F
           options: has unique name, sizeof 64
  0x1011 | LF_STRUCTURE [size = 44] `Small`
           unique name: `.?AUSmall@@`
           vtable: <no type>, base list: <no type>, field list: 0x100E
           options: has unique name, sizeof 8
";
    let outcome = Sifter::new(SiftOptions::new())
        .sift(SECTIONS.as_bytes(), "".as_bytes(), types.as_bytes())
        .unwrap();
    let (partitions, _) = outcome.partition();

    let names: Vec<_> = partitions.other_types.iter().map(|ty| ty.name.as_str()).collect();
    assert_eq!(names, vec!["Small", "Big"]);
    assert!(partitions.virtual_types.is_empty());
}

#[test]
fn test_partition_orders_unexpanded_by_rva()
{
    let globals = "\
1 | S_GDATA32 [size = 36] `Alpha::`vftable'`
    addr = 0001:0x300
2 | S_GDATA32 [size = 36] `Beta::`vftable'`
    addr = 0001:0x100
3 | S_GDATA32 [size = 36] `Gamma::`vftable'`
    addr = 0001:0x200
";
    let outcome = Sifter::new(SiftOptions::new())
        .sift(SECTIONS.as_bytes(), globals.as_bytes(), "".as_bytes())
        .unwrap();
    let partitions = partition(outcome.catalog);

    let names: Vec<_> = partitions.unexpanded.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["Beta", "Gamma", "Alpha"]);
    assert_eq!(partitions.name_width, 5);
}

#[test]
fn test_trailing_record_needs_header_under_trailing_policy()
{
    let types = foo_types("has unique name");
    let options = SiftOptions::new().with_flush_policy(FlushPolicy::TrailingHeader);
    let outcome = Sifter::new(options)
        .sift(SECTIONS.as_bytes(), GLOBALS_FOO.as_bytes(), types.as_bytes())
        .unwrap();

    assert!(matches!(outcome.catalog.get("Foo"), Some(CatalogEntry::VftableOnly(_))));
}

#[test]
fn test_conflict_policy_reaches_the_merge()
{
    let mut types = foo_types("has unique name");
    types.push_str(&foo_types("has unique name").replace("0x1006", "0x2006").replace("sizeof 16", "sizeof 32"));

    let outcome = Sifter::new(SiftOptions::new())
        .sift(SECTIONS.as_bytes(), GLOBALS_FOO.as_bytes(), types.as_bytes())
        .unwrap();
    assert_eq!(outcome.merge.conflicts.len(), 1);

    let strict = SiftOptions::new().with_conflict_policy(ConflictPolicy::Fail);
    let err = Sifter::new(strict)
        .sift(SECTIONS.as_bytes(), GLOBALS_FOO.as_bytes(), types.as_bytes())
        .unwrap_err();
    assert!(matches!(err, SymsiftError::SizeMismatch { .. }));
}

#[test]
fn test_sift_files_and_report()
{
    let dir = tempfile::tempdir().unwrap();
    let paths = DumpPaths::in_dir(dir.path(), "app");
    fs::write(&paths.sections, SECTIONS).unwrap();
    fs::write(&paths.globals, GLOBALS_FOO_BAR).unwrap();
    fs::write(&paths.types, foo_types("has unique name")).unwrap();

    let outcome = Sifter::new(SiftOptions::new()).sift_files(&paths).unwrap();
    let (partitions, _) = outcome.partition();

    let expected = "== virtual types ======\n\
                    Sizeof:     16 | type:   0x1006 | fields:      0x5 | vftable rva: 0x1020   | name: Foo\n\
                    \n\n== other types ======\n\
                    \n\n== Unexpanded virtuals ======\n\
                    vftable rva: 0x1040   | name: Bar\n";
    assert_eq!(render(&partitions), expected);

    let mut first = Vec::new();
    let mut second = Vec::new();
    let mut sinks: [&mut dyn Write; 2] = [&mut first, &mut second];
    write_report(&partitions, &mut sinks).unwrap();
    assert_eq!(String::from_utf8(first).unwrap(), expected);
    assert_eq!(String::from_utf8(second).unwrap(), expected);
}

#[test]
fn test_missing_dump_names_the_file()
{
    let dir = tempfile::tempdir().unwrap();
    let paths = DumpPaths::in_dir(dir.path(), "absent");

    let err = Sifter::new(SiftOptions::new()).sift_files(&paths).unwrap_err();
    let SymsiftError::InvalidArgument(message) = err else {
        panic!("expected an invalid argument, got {err:?}");
    };
    assert!(message.contains("absent.sections.txt"));
}
