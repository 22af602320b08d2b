//! # Firmware Status
//!
//! Read-only view of the standard boot variables, for reporting what the
//! firmware will do on the next start.

use crate::error::DecodeError;
use crate::load_option::LoadOption;
use crate::manager::SecureBootState;
use crate::slot::BootSlot;
use crate::variable::{
    EFI_BUFFER_TOO_SMALL, EFI_GLOBAL_VARIABLE, MAX_VARIABLE_LEN, PROBE_BUFFER_LEN, VariableError, VariableStore, names,
};
use alloc::string::String;
use alloc::vec::Vec;
use log::{debug, warn};

/// Standard boot variables as found at one point in time.
///
/// Missing or unreadable values are `None`; a value that exists but has the
/// wrong size is treated like an unreadable one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FirmwareSnapshot {
    pub boot_current: Option<BootSlot>,
    pub boot_next: Option<BootSlot>,
    /// Boot menu timeout in seconds. `0xFFFF` waits for the user.
    pub timeout: Option<u16>,
    pub boot_order: Option<Vec<BootSlot>>,
    pub secure_boot: SecureBootState,
    pub platform_lang: Option<String>,
}

impl FirmwareSnapshot {
    /// Reads every variable once. Never fails; problems are logged.
    pub fn read<S: VariableStore + ?Sized>(store: &mut S) -> Self {
        let secure_boot = read_optional(store, names::SECURE_BOOT)
            .map_or(SecureBootState::Unknown, |bytes| SecureBootState::from_bytes(&bytes));

        Self {
            boot_current: read_optional(store, names::BOOT_CURRENT)
                .and_then(|bytes| u16_value(names::BOOT_CURRENT, &bytes))
                .map(BootSlot::new),
            boot_next: read_optional(store, names::BOOT_NEXT)
                .and_then(|bytes| u16_value(names::BOOT_NEXT, &bytes))
                .map(BootSlot::new),
            timeout: read_optional(store, names::TIMEOUT).and_then(|bytes| u16_value(names::TIMEOUT, &bytes)),
            boot_order: read_optional(store, names::BOOT_ORDER).and_then(|bytes| boot_order(&bytes)),
            secure_boot,
            platform_lang: read_optional(store, names::PLATFORM_LANG).map(|bytes| ascii_value(&bytes)),
        }
    }
}

fn read_optional<S: VariableStore + ?Sized>(store: &mut S, name: &str) -> Option<Vec<u8>> {
    match store.get(name, &EFI_GLOBAL_VARIABLE, PROBE_BUFFER_LEN) {
        Ok(bytes) => Some(bytes),
        Err(VariableError::NotFound) => {
            debug!("{name} is not set");
            None
        }
        Err(e) => {
            warn!("Unable to read {name}: {e}");
            None
        }
    }
}

fn u16_value(name: &str, bytes: &[u8]) -> Option<u16> {
    if let [lo, hi] = *bytes {
        Some(u16::from_le_bytes([lo, hi]))
    } else {
        warn!("{name} has {} bytes, expected 2", bytes.len());
        None
    }
}

fn boot_order(bytes: &[u8]) -> Option<Vec<BootSlot>> {
    if bytes.len() % 2 != 0 {
        warn!("{} has odd length {}", names::BOOT_ORDER, bytes.len());
        return None;
    }
    Some(
        bytes
            .chunks_exact(2)
            .map(|pair| BootSlot::new(u16::from_le_bytes([pair[0], pair[1]])))
            .collect(),
    )
}

/// `PlatformLang` is NUL-terminated ASCII.
fn ascii_value(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| if b.is_ascii() { char::from(b) } else { char::REPLACEMENT_CHARACTER })
        .collect()
}

/// Why a `Boot####` variable could not be shown.
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("failed to read {name}")]
    Read {
        name: String,
        #[source]
        source: VariableError,
    },
    #[error("{name} does not hold a valid load option")]
    Malformed {
        name: String,
        #[source]
        source: DecodeError,
    },
}

/// Reads and decodes the load option stored in `slot`.
///
/// Entries larger than [`PROBE_BUFFER_LEN`] are read again with a buffer of
/// [`MAX_VARIABLE_LEN`] bytes.
///
/// # Errors
/// [`EntryError::Read`] if the variable cannot be read,
/// [`EntryError::Malformed`] if its contents do not decode.
pub fn read_boot_entry<S: VariableStore + ?Sized>(
    store: &mut S,
    slot: BootSlot,
) -> Result<LoadOption, EntryError> {
    let name = slot.variable_name();
    let bytes = match store.get(&name, &EFI_GLOBAL_VARIABLE, PROBE_BUFFER_LEN) {
        Err(VariableError::Other(EFI_BUFFER_TOO_SMALL)) => {
            debug!("{name} exceeds {PROBE_BUFFER_LEN} bytes, reading again");
            store.get(&name, &EFI_GLOBAL_VARIABLE, MAX_VARIABLE_LEN)
        }
        result => result,
    };
    let bytes = match bytes {
        Ok(bytes) => bytes,
        Err(source) => return Err(EntryError::Read { name, source }),
    };
    LoadOption::decode(&bytes).map_err(|source| EntryError::Malformed { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::MemoryVariableStore;

    #[test]
    fn reads_standard_variables() {
        let mut store = MemoryVariableStore::new()
            .with_global(names::BOOT_CURRENT, &[0x02, 0x00])
            .with_global(names::TIMEOUT, &[0x05, 0x00])
            .with_global(names::BOOT_ORDER, &[0x02, 0x00, 0x00, 0x00, 0x01, 0x00])
            .with_global(names::SECURE_BOOT, &[0x00])
            .with_global(names::PLATFORM_LANG, b"en-US\0");

        let snapshot = FirmwareSnapshot::read(&mut store);
        assert_eq!(snapshot.boot_current, Some(BootSlot::new(2)));
        assert_eq!(snapshot.boot_next, None);
        assert_eq!(snapshot.timeout, Some(5));
        assert_eq!(
            snapshot.boot_order,
            Some(vec![BootSlot::new(2), BootSlot::new(0), BootSlot::new(1)])
        );
        assert_eq!(snapshot.secure_boot, SecureBootState::Disabled);
        assert_eq!(snapshot.platform_lang.as_deref(), Some("en-US"));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn unreadable_and_malformed_values_are_empty() {
        let mut store = MemoryVariableStore::new()
            .with_denied(names::SECURE_BOOT)
            .with_global(names::BOOT_NEXT, &[0x04])
            .with_global(names::BOOT_ORDER, &[0x01, 0x00, 0x02]);

        let snapshot = FirmwareSnapshot::read(&mut store);
        assert_eq!(snapshot.secure_boot, SecureBootState::Unknown);
        assert_eq!(snapshot.boot_next, None);
        assert_eq!(snapshot.boot_order, None);
    }

    #[test]
    fn decodes_stored_entry() {
        let option = crate::BootEntryConfig::new(crate::HardDriveNode::gpt(
            1,
            2048,
            4096,
            uefi::guid!("0fc63daf-8483-4772-8e79-3d69d8477de4"),
        ))
        .load_option()
        .unwrap();
        let mut store =
            MemoryVariableStore::new().with_global("Boot0007", &option.encode().unwrap());

        assert_eq!(read_boot_entry(&mut store, BootSlot::new(7)).unwrap(), option);
        assert!(matches!(
            read_boot_entry(&mut store, BootSlot::new(8)),
            Err(EntryError::Read { source: VariableError::NotFound, .. })
        ));
    }

    #[test]
    fn decodes_entry_larger_than_probe_buffer() {
        let mut option = crate::BootEntryConfig::new(crate::HardDriveNode::gpt(
            1,
            2048,
            4096,
            uefi::guid!("0fc63daf-8483-4772-8e79-3d69d8477de4"),
        ))
        .load_option()
        .unwrap();
        option.optional_data = vec![0x42; 5000];
        let mut store =
            MemoryVariableStore::new().with_global("Boot0003", &option.encode().unwrap());

        assert_eq!(read_boot_entry(&mut store, BootSlot::new(3)).unwrap(), option);
    }

    #[test]
    fn reports_malformed_entry() {
        let mut store = MemoryVariableStore::new().with_global("Boot0001", &[1, 0, 0]);
        assert!(matches!(
            read_boot_entry(&mut store, BootSlot::new(1)),
            Err(EntryError::Malformed { source: DecodeError::TruncatedHeader, .. })
        ));
    }
}
