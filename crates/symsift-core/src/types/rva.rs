//! Relative virtual address type.

use std::fmt;

/// Strongly typed relative virtual address
///
/// An RVA is the offset of a location from the image's load base. This
/// wrapper around `u64` keeps RVAs from being mixed up with sizes, section
/// numbers or raw offsets, all of which are plain integers in the dumps.
///
/// An RVA of zero means "unknown": a type that was found in the type stream
/// but never had a vftable symbol attached.
///
/// ## Example
///
/// ```rust
/// use symsift_core::types::Rva;
///
/// let base = Rva::from(0x1000);
/// assert_eq!(base.checked_add(0x20), Some(Rva::from(0x1020)));
/// assert!(!Rva::ZERO.is_known());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rva(u64);

impl Rva
{
    /// The "no vftable" address
    pub const ZERO: Self = Rva(0);

    /// Create a new RVA from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Rva(value)
    }

    /// Get the raw `u64` value of this RVA
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this RVA points somewhere (is non-zero)
    pub const fn is_known(self) -> bool
    {
        self.0 != 0
    }

    /// Add an offset to this RVA, checking for overflow
    ///
    /// Returns `Some(new_rva)` if the addition doesn't overflow, or `None` if it does.
    ///
    /// ```rust
    /// use symsift_core::types::Rva;
    ///
    /// assert_eq!(Rva::from(0x1000).checked_add(0x100), Some(Rva::from(0x1100)));
    /// assert_eq!(Rva::from(0x1000).checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Rva)
    }
}

impl From<u64> for Rva
{
    fn from(value: u64) -> Self
    {
        Rva(value)
    }
}

impl From<Rva> for u64
{
    fn from(rva: Rva) -> Self
    {
        rva.0
    }
}

impl fmt::Display for Rva
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Rva
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
