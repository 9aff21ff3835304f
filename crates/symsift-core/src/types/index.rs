//! Type record index.

use std::fmt;
use std::str::FromStr;

/// Index of a record in the TPI (type) stream
///
/// `llvm-pdbutil` prints these as upper-case hexadecimal with a `0x` prefix,
/// e.g. `0x10DB`. Parsing accepts either case and an optional prefix.
///
/// ```rust
/// use symsift_core::types::TypeIndex;
///
/// let index: TypeIndex = "0x10DB".parse().unwrap();
/// assert_eq!(index.value(), 0x10db);
/// assert_eq!(index.to_string(), "0x10DB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeIndex(u32);

impl TypeIndex
{
    /// Create a type index from its raw value
    pub const fn new(value: u32) -> Self
    {
        TypeIndex(value)
    }

    /// Raw numeric value
    pub const fn value(self) -> u32
    {
        self.0
    }
}

impl From<u32> for TypeIndex
{
    fn from(value: u32) -> Self
    {
        TypeIndex(value)
    }
}

impl FromStr for TypeIndex
{
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        u32::from_str_radix(digits, 16).map(TypeIndex)
    }
}

impl fmt::Display for TypeIndex
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:X}", self.0)
    }
}

impl fmt::LowerHex for TypeIndex
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
