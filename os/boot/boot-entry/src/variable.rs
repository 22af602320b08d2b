//! # Firmware Variable Access
//!
//! The NVRAM namespace is process-external shared state. The engine only ever
//! touches it through a [`VariableStore`] handed in by the caller, so tests
//! can swap in [`MemoryVariableStore`](crate::in_memory::MemoryVariableStore)
//! and each platform supplies its own backend.

use alloc::vec::Vec;
use uefi::{Guid, guid};

/// `EFI_GLOBAL_VARIABLE`, the vendor namespace of every variable used here.
pub const EFI_GLOBAL_VARIABLE: Guid = guid!("8be4df61-93ca-11d2-aa0d-00e098032b8c");

/// Buffer size used when only the presence of a variable matters.
pub const PROBE_BUFFER_LEN: usize = 4096;

/// Largest variable payload the engine will read back in full.
pub const MAX_VARIABLE_LEN: usize = 0x1_0000;

/// `EFI_BUFFER_TOO_SMALL`, reported when a variable exceeds the caller's
/// buffer.
pub const EFI_BUFFER_TOO_SMALL: u64 = 0x8000_0000_0000_0005;

/// Names of the global variables this crate reads or writes.
pub mod names {
    /// `UINT8`, non-zero while Secure Boot is enforced.
    pub const SECURE_BOOT: &str = "SecureBoot";
    /// `UINT16` slot number to boot once on the next startup.
    pub const BOOT_NEXT: &str = "BootNext";
    /// `UINT16` slot number the current boot started from.
    pub const BOOT_CURRENT: &str = "BootCurrent";
    /// `UINT16[]` ordered list of slot numbers.
    pub const BOOT_ORDER: &str = "BootOrder";
    /// `UINT16` boot menu timeout in seconds.
    pub const TIMEOUT: &str = "Timeout";
    /// ASCII RFC 4646 language code.
    pub const PLATFORM_LANG: &str = "PlatformLang";
}

/// Why an accessor call failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariableError {
    #[error("variable not found")]
    NotFound,
    #[error("access denied")]
    AccessDenied,
    /// Anything else; carries the platform status (UEFI `Status` or `errno`).
    #[error("platform error (status {0:#x})")]
    Other(u64),
}

/// Raw get/set access to named, namespaced firmware variables.
pub trait VariableStore {
    /// Reads at most `max_len` bytes of `name`. The returned vector holds the
    /// actual payload.
    ///
    /// # Errors
    /// [`VariableError::NotFound`] if the variable does not exist.
    fn get(&mut self, name: &str, vendor: &Guid, max_len: usize) -> Result<Vec<u8>, VariableError>;

    /// Creates or replaces `name`.
    ///
    /// Writing an empty payload deletes the variable on every platform
    /// contract we know of; the engine never depends on that.
    ///
    /// # Errors
    /// Whatever the backend reports.
    fn set(&mut self, name: &str, vendor: &Guid, data: &[u8]) -> Result<(), VariableError>;
}

impl<S: VariableStore + ?Sized> VariableStore for &mut S {
    fn get(&mut self, name: &str, vendor: &Guid, max_len: usize) -> Result<Vec<u8>, VariableError> {
        (**self).get(name, vendor, max_len)
    }

    fn set(&mut self, name: &str, vendor: &Guid, data: &[u8]) -> Result<(), VariableError> {
        (**self).set(name, vendor, data)
    }
}

/// Presence check for a global variable.
pub trait VariableProbe {
    /// `Ok(false)` means the variable is absent. A variable too large for
    /// the probe buffer exists and counts as present. Only failures other
    /// than not-found are errors.
    ///
    /// # Errors
    /// Access denied or platform failures.
    fn is_present(&mut self, name: &str) -> Result<bool, VariableError>;
}

impl<S: VariableStore + ?Sized> VariableProbe for S {
    fn is_present(&mut self, name: &str) -> Result<bool, VariableError> {
        match self.get(name, &EFI_GLOBAL_VARIABLE, PROBE_BUFFER_LEN) {
            Ok(_) | Err(VariableError::Other(EFI_BUFFER_TOO_SMALL)) => Ok(true),
            Err(VariableError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
