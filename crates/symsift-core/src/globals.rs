//! # Vftable Symbol Extractor
//!
//! Finds vftable symbols in `llvm-pdbutil dump --globals` output and seeds the
//! catalog with one [`CatalogEntry::VftableOnly`] per type.
//!
//! A vftable symbol spans two adjacent lines:
//!
//! ```text
//!      1060 | S_GDATA32 [size = 36] `Foo::`vftable'`
//!             type = 0x1001 (), addr = 0003:0032
//! ```
//!
//! The first line names the type, the second holds `section:offset`. The
//! section is decimal; the offset is decimal, or hexadecimal when it carries
//! a `0x` prefix.

use std::io::BufRead;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::catalog::TypeCatalog;
use crate::error::{SymsiftError, SymsiftResult};
use crate::options::SiftOptions;
use crate::sections::SectionTable;
use crate::types::{Rva, VftableEntry};

static VFTABLE_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s+\|\s+S_GDATA32\s+\[.*?\]\s+`(.+)::`vftable'").unwrap());
static SYMBOL_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"addr\s*=\s*(\d+):(0[xX][0-9A-Fa-f]+|\d+)").unwrap());

/// A `section:offset` pair from an `addr = ...` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolAddress
{
    pub section: u32,
    pub offset: u64,
}

impl SymbolAddress
{
    /// Find and parse the `addr = <section>:<offset>` field of a line.
    ///
    /// Returns `Ok(None)` when the line has no such field and
    /// `Err(text)` with the matched text when a number overflows.
    pub fn find(line: &str) -> Result<Option<Self>, String>
    {
        let Some(caps) = SYMBOL_ADDRESS.captures(line) else {
            return Ok(None);
        };
        let section = caps[1].parse::<u32>().map_err(|_| caps[0].to_string())?;
        let raw_offset = &caps[2];
        let offset = match raw_offset.strip_prefix("0x").or_else(|| raw_offset.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => raw_offset.parse::<u64>(),
        }
        .map_err(|_| caps[0].to_string())?;

        Ok(Some(Self { section, offset }))
    }
}

/// Name of the type owning a vftable symbol line, if the line is one.
pub fn vftable_type_name(line: &str) -> Option<&str>
{
    VFTABLE_SYMBOL
        .captures(line.trim())
        .and_then(|caps| caps.get(2))
        .map(|name| name.as_str())
}

/// Scan a globals dump and insert every vftable it names into `catalog`.
///
/// A later symbol for the same type overwrites the earlier one; conflicts are
/// only checked when class records are merged. Returns the number of vftable
/// symbols recorded.
///
/// ## Errors
///
/// - `Io` if reading fails.
/// - In strict mode: `MalformedNumber` for an overflowing address field,
///   `UnknownSection` for a section absent from `sections`, and
///   `AddressOverflow` when base plus offset does not fit in 64 bits.
pub fn collect_vftables<R: BufRead>(
    reader: R,
    sections: &SectionTable,
    catalog: &mut TypeCatalog,
    options: &SiftOptions,
) -> SymsiftResult<usize>
{
    let mut recorded = 0;
    let mut previous = String::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;

        if let Some(name) = vftable_type_name(&previous) {
            match SymbolAddress::find(&line) {
                Ok(Some(address)) => {
                    if let Some(rva) = resolve(name, address, sections, options)? {
                        trace!(name, %rva, "vftable symbol");
                        catalog.insert_vftable(VftableEntry {
                            name: name.to_string(),
                            rva,
                        });
                        recorded += 1;
                    }
                }
                Ok(None) => trace!(name, "vftable symbol without address line"),
                Err(text) => options.tolerate(SymsiftError::MalformedNumber {
                    field: "symbol address",
                    text,
                    line: line_no + 1,
                })?,
            }
        }

        previous = line;
    }

    debug!(recorded, "collected vftable symbols");
    Ok(recorded)
}

fn resolve(name: &str, address: SymbolAddress, sections: &SectionTable, options: &SiftOptions) -> SymsiftResult<Option<Rva>>
{
    let Some(base) = sections.base(address.section) else {
        options.tolerate(SymsiftError::UnknownSection {
            name: name.to_string(),
            section: address.section,
        })?;
        return Ok(None);
    };

    match Rva::from(base).checked_add(address.offset) {
        Some(rva) => Ok(Some(rva)),
        None => {
            options.tolerate(SymsiftError::AddressOverflow {
                name: name.to_string(),
                base,
                offset: address.offset,
            })?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_vftable_type_name()
    {
        let line = "  1060 | S_GDATA32 [size = 36] `ns::Foo<int>::`vftable'`";
        assert_eq!(vftable_type_name(line), Some("ns::Foo<int>"));
        assert_eq!(vftable_type_name("  1060 | S_GDATA32 [size = 20] `g_counter`"), None);
        assert_eq!(vftable_type_name("  1060 | S_PUB32 [size = 36] `Foo::`vftable'`"), None);
    }

    #[test]
    fn test_symbol_address_forms()
    {
        let decimal = SymbolAddress::find("type = 0x1001 (), addr = 0003:0032").unwrap();
        assert_eq!(decimal, Some(SymbolAddress { section: 3, offset: 32 }));

        let hex = SymbolAddress::find("addr = 1:0x20").unwrap();
        assert_eq!(hex, Some(SymbolAddress { section: 1, offset: 0x20 }));

        assert_eq!(SymbolAddress::find("type = 0x1001 ()").unwrap(), None);
        assert!(SymbolAddress::find("addr = 99999999999:0").is_err());
    }
}
