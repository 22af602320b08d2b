//! # One-shot UEFI Boot Entries
//!
//! Registers a firmware boot entry (`Boot####`) for a loader on a given
//! partition and points `BootNext` at it, so that the next reboot, and only
//! the next one, starts that loader.
//!
//! ## Layers
//!
//! - [`LoadOption`] and [`DevicePathNode`] encode and decode the
//!   `EFI_LOAD_OPTION` byte layout. Pure functions, no I/O.
//! - [`BootSlotAllocator`] finds the first free slot, writes the entry and
//!   schedules it.
//! - [`BootConfigManager`] runs the whole sequence as a state machine and
//!   reports which [`Stage`] failed.
//! - [`VariableStore`] and [`PrivilegeGate`] are the seams to the platform.
//!   The firmware application and the host tool each bring their own
//!   implementation; [`in_memory`] holds fakes for tests and dry runs.
//!
//! ## Example
//!
//! ```
//! use boot_entry::in_memory::{MemoryVariableStore, StaticPrivilegeGate};
//! use boot_entry::{BootConfigManager, BootEntryConfig, BootSlot, HardDriveNode};
//!
//! let partition = HardDriveNode::gpt(
//!     1,
//!     2048,
//!     1_048_576,
//!     uefi::guid!("4c3b1b6e-6a7f-4f1e-9c1b-0d1e2f3a4b5c"),
//! );
//! let mut store = MemoryVariableStore::new().with_global("SecureBoot", &[0]);
//! let mut manager = BootConfigManager::new(
//!     BootEntryConfig::new(partition),
//!     &mut store,
//!     StaticPrivilegeGate::granting(),
//! );
//!
//! let registration = manager.run().unwrap();
//! assert_eq!(registration.slot, BootSlot::new(0x0004));
//! assert_eq!(store.global("BootNext"), Some(&[0x04, 0x00][..]));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod allocator;
mod attributes;
pub mod device_path;
mod error;
pub mod in_memory;
mod load_option;
mod manager;
pub mod options;
pub mod privilege;
mod slot;
mod status;
pub mod ucs2;
pub mod variable;

pub use allocator::BootSlotAllocator;
pub use attributes::LoadOptionAttributes;
pub use device_path::{DevicePathNode, HardDriveNode};
pub use error::{BootError, DecodeError, EncodingError};
pub use load_option::LoadOption;
pub use manager::{
    BootConfigManager, BootEntryConfig, DEFAULT_DESCRIPTION, DEFAULT_LOADER_PATH, Registration,
    SecureBootState, Stage, StageError,
};
pub use privilege::{PrivilegeError, PrivilegeGate, PrivilegeStatus};
pub use slot::{BootSlot, DEFAULT_FIRST_SLOT, SlotRange};
pub use status::{EntryError, FirmwareSnapshot, read_boot_entry};
pub use variable::{EFI_BUFFER_TOO_SMALL, EFI_GLOBAL_VARIABLE, MAX_VARIABLE_LEN, VariableError, VariableProbe, VariableStore};
