//! # Section Address Resolver
//!
//! Parses `llvm-pdbutil dump --section-headers` output into a map from
//! section number to the section's base virtual address.
//!
//! The dump looks like this (abridged):
//!
//! ```text
//!   SECTION HEADER #1
//!      .text name
//!     1C8A3C virtual size
//!       1000 virtual address
//!     1C8C00 size of raw data
//! ```
//!
//! Only the `virtual address` line matters. It is attributed to the closest
//! preceding `SECTION HEADER #<N>` line, and only once per block.

use std::collections::BTreeMap;
use std::io::BufRead;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::{SymsiftError, SymsiftResult};
use crate::options::SiftOptions;

static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"SECTION HEADER #(\d+)").unwrap());
static VIRTUAL_ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([0-9A-Fa-f]+) virtual address").unwrap());

/// Section number to base virtual address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTable
{
    bases: BTreeMap<u32, u64>,
}

impl SectionTable
{
    /// Parse a section-header dump.
    ///
    /// Blocks without a `virtual address` line contribute nothing.
    ///
    /// ## Errors
    ///
    /// - `Io` if reading fails.
    /// - `MalformedNumber` for a section number or address that overflows,
    ///   in strict mode only.
    pub fn parse<R: BufRead>(reader: R, options: &SiftOptions) -> SymsiftResult<Self>
    {
        let mut table = Self::default();
        let mut current: Option<u32> = None;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = line_no + 1;

            if let Some(caps) = SECTION_HEADER.captures(&line) {
                current = None;
                match caps[1].parse::<u32>() {
                    Ok(section) => current = Some(section),
                    Err(_) => options.tolerate(SymsiftError::MalformedNumber {
                        field: "section number",
                        text: caps[1].to_string(),
                        line: line_no,
                    })?,
                }
                continue;
            }

            let Some(section) = current else {
                continue;
            };
            let Some(caps) = VIRTUAL_ADDRESS.captures(&line) else {
                continue;
            };

            match u64::from_str_radix(&caps[1], 16) {
                Ok(base) => {
                    trace!(section, base = format_args!("{base:#x}"), "section base");
                    table.bases.insert(section, base);
                    current = None;
                }
                Err(_) => options.tolerate(SymsiftError::MalformedNumber {
                    field: "virtual address",
                    text: caps[1].to_string(),
                    line: line_no,
                })?,
            }
        }

        debug!(sections = table.len(), "parsed section headers");
        Ok(table)
    }

    /// Base virtual address of `section`.
    pub fn base(&self, section: u32) -> Option<u64>
    {
        self.bases.get(&section).copied()
    }

    pub fn len(&self) -> usize
    {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.bases.is_empty()
    }

    /// Iterate `(section, base)` in section order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_
    {
        self.bases.iter().map(|(section, base)| (*section, *base))
    }
}

impl FromIterator<(u32, u64)> for SectionTable
{
    fn from_iter<I: IntoIterator<Item = (u32, u64)>>(iter: I) -> Self
    {
        Self {
            bases: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_virtual_size_is_not_an_address()
    {
        let dump = "SECTION HEADER #1\n  1C8A3C virtual size\n    1000 virtual address\n";
        let table = SectionTable::parse(dump.as_bytes(), &SiftOptions::new()).unwrap();
        assert_eq!(table.base(1), Some(0x1000));
        assert_eq!(table.len(), 1);
    }
}
