//! # Load Option Attributes
//!
//! The first field of every `Boot####` variable is a 32-bit attribute word.
//! Only a handful of bits are defined; the rest are reserved and must be
//! written as zero.

/// Bitfield wrapper for `EFI_LOAD_OPTION.Attributes` (32-bit)
///
/// Layout (LSB→MSB):
/// - bit 0: `LOAD_OPTION_ACTIVE`, the boot manager may pick this entry
/// - bit 1: `LOAD_OPTION_FORCE_RECONNECT`
/// - bit 2: reserved
/// - bit 3: `LOAD_OPTION_HIDDEN`, not shown in the firmware boot menu
/// - bits 4..8: reserved
/// - bits 8..13: `LOAD_OPTION_CATEGORY` (0 = boot, 1 = application)
/// - bits 13..32: reserved
#[bitfield_struct::bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct LoadOptionAttributes {
    #[bits(1)]
    pub active: bool,
    #[bits(1)]
    pub force_reconnect: bool,
    #[bits(1)]
    __: u8,
    #[bits(1)]
    pub hidden: bool,
    #[bits(4)]
    _reserved_low: u8,
    #[bits(5)]
    pub category: u8,
    #[bits(19)]
    _reserved_high: u32,
}

impl LoadOptionAttributes {
    /// `LOAD_OPTION_CATEGORY_BOOT`
    pub const CATEGORY_BOOT: u8 = 0x00;
    /// `LOAD_OPTION_CATEGORY_APP`
    pub const CATEGORY_APP: u8 = 0x01;

    /// An active boot-category option, which is what the firmware boot
    /// manager expects for an entry referenced by `BootNext`.
    #[must_use]
    pub const fn active_boot() -> Self {
        Self::new()
            .with_active(true)
            .with_category(Self::CATEGORY_BOOT)
    }
}
