//! # Boot Slots
//!
//! A boot slot is the 16-bit number behind a `Boot####` variable name. Slots
//! have no identity of their own; they only exist as candidates while the
//! allocator scans for a free one.

use alloc::format;
use alloc::string::String;
use core::fmt;
use core::ops::RangeInclusive;
use utils_accessors_derive::Setters;

/// First slot scanned by default. Lower numbers are usually claimed by the
/// firmware's own entries and the installed operating system.
pub const DEFAULT_FIRST_SLOT: u16 = 0x0004;

/// A `Boot####` slot number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BootSlot(u16);

impl BootSlot {
    #[must_use]
    pub const fn new(number: u16) -> Self {
        Self(number)
    }

    #[must_use]
    pub const fn number(self) -> u16 {
        self.0
    }

    /// `Boot` followed by four uppercase hex digits, e.g. `Boot000A`.
    #[must_use]
    pub fn variable_name(self) -> String {
        format!("Boot{:04X}", self.0)
    }

    /// Parses a `Boot####` variable name. Lowercase digits are rejected,
    /// since firmware treats `Boot000a` as an unrelated variable.
    #[must_use]
    pub fn from_variable_name(name: &str) -> Option<Self> {
        let digits = name.strip_prefix("Boot")?;
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)) {
            return None;
        }
        u16::from_str_radix(digits, 16).ok().map(Self)
    }

    /// The payload of `BootNext` (and of each `BootOrder` element).
    #[must_use]
    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    /// Reads a slot from the first two bytes of a `UINT16` variable.
    #[must_use]
    pub fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [lo, hi, ..] => Some(Self(u16::from_le_bytes([*lo, *hi]))),
            _ => None,
        }
    }
}

impl From<u16> for BootSlot {
    fn from(number: u16) -> Self {
        Self(number)
    }
}

impl fmt::Display for BootSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Boot{:04X}", self.0)
    }
}

/// Inclusive range of slot numbers the allocator may hand out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Setters)]
pub struct SlotRange {
    first: u16,
    last: u16,
}

impl SlotRange {
    /// A range from `first` to `last`, both inclusive. A range with
    /// `first > last` contains no slots.
    #[must_use]
    pub const fn new(first: u16, last: u16) -> Self {
        Self { first, last }
    }

    #[must_use]
    pub const fn first(&self) -> u16 {
        self.first
    }

    #[must_use]
    pub const fn last(&self) -> u16 {
        self.last
    }

    /// Candidate slots in ascending order. The iterator is lazy and can be
    /// cloned to restart the scan.
    pub fn candidates(self) -> impl Iterator<Item = BootSlot> + Clone {
        RangeInclusive::new(self.first, self.last).map(BootSlot)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            usize::from(self.last - self.first) + 1
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first > self.last
    }
}

impl Default for SlotRange {
    fn default() -> Self {
        Self::new(DEFAULT_FIRST_SLOT, u16::MAX)
    }
}
