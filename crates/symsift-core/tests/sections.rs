//! Tests for section header parsing

use symsift_core::error::SymsiftError;
use symsift_core::options::{SiftOptions, Strictness};
use symsift_core::sections::SectionTable;

const HEADERS: &str = "\
SECTION HEADERS
SECTION HEADER #1
   .text name
  1C8A3C virtual size
    1000 virtual address
  1C8C00 size of raw data

SECTION HEADER #2
  .rdata name
   6F2B4 virtual size
  1CA000 virtual address

SECTION HEADER #3
   .data name
    BEEF virtual size
";

#[test]
fn test_every_section_with_an_address_is_mapped()
{
    let table = SectionTable::parse(HEADERS.as_bytes(), &SiftOptions::new()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.base(1), Some(0x1000));
    assert_eq!(table.base(2), Some(0x1CA000));
    assert_eq!(table.base(3), None);
}

#[test]
fn test_address_is_not_attributed_across_blocks()
{
    let headers = "SECTION HEADER #1\n   .bss name\nSECTION HEADER #2\n    3000 virtual address\n";
    let table = SectionTable::parse(headers.as_bytes(), &SiftOptions::new()).unwrap();
    assert_eq!(table.base(1), None);
    assert_eq!(table.base(2), Some(0x3000));
}

#[test]
fn test_only_first_address_in_a_block_counts()
{
    let headers = "SECTION HEADER #4\n    4000 virtual address\n    5000 virtual address\n";
    let table = SectionTable::parse(headers.as_bytes(), &SiftOptions::new()).unwrap();
    assert_eq!(table.iter().collect::<Vec<_>>(), vec![(4, 0x4000)]);
}

#[test]
fn test_empty_input_gives_empty_table()
{
    let table = SectionTable::parse("".as_bytes(), &SiftOptions::new()).unwrap();
    assert!(table.is_empty());
}

#[test]
fn test_overflowing_address_depends_on_strictness()
{
    let headers = "SECTION HEADER #1\n 1FFFFFFFFFFFFFFFF virtual address\nSECTION HEADER #2\n 2000 virtual address\n";

    let table = SectionTable::parse(headers.as_bytes(), &SiftOptions::new()).unwrap();
    assert_eq!(table.base(1), None);
    assert_eq!(table.base(2), Some(0x2000));

    let strict = SiftOptions::new().with_strictness(Strictness::Strict);
    let err = SectionTable::parse(headers.as_bytes(), &strict).unwrap_err();
    assert!(matches!(
        err,
        SymsiftError::MalformedNumber {
            field: "virtual address",
            line: 2,
            ..
        }
    ));
}
