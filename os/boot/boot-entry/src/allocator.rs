//! # Boot Slot Allocator
//!
//! Finds the first free `Boot####` slot, writes the encoded load option into
//! it and points `BootNext` at it.
//!
//! ## Races
//!
//! The occupancy probe and the later commit are two separate firmware calls.
//! Nothing stops another process from claiming the same slot in between, and
//! firmware offers no lock to close that window. Deployments with more than
//! one writer need their own mutual exclusion around [`BootSlotAllocator`].

use crate::error::BootError;
use crate::slot::{BootSlot, SlotRange};
use crate::variable::{
    EFI_BUFFER_TOO_SMALL, EFI_GLOBAL_VARIABLE, PROBE_BUFFER_LEN, VariableError, VariableProbe, VariableStore, names,
};
use alloc::string::String;
use log::{debug, info, warn};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BootSlotAllocator {
    range: SlotRange,
}

impl BootSlotAllocator {
    #[must_use]
    pub const fn new(range: SlotRange) -> Self {
        Self { range }
    }

    #[must_use]
    pub const fn range(&self) -> SlotRange {
        self.range
    }

    /// Returns the lowest slot in range whose `Boot####` variable is absent.
    ///
    /// The scan is deterministic: the same occupancy always yields the same
    /// slot. Nothing is written.
    ///
    /// # Errors
    /// - [`BootError::Read`] if a probe fails with anything but not-found,
    /// - [`BootError::SlotsExhausted`] if every slot in range is taken.
    pub fn allocate_slot<P: VariableProbe + ?Sized>(&self, probe: &mut P) -> Result<BootSlot, BootError> {
        for slot in self.range.candidates() {
            let name = slot.variable_name();
            match probe.is_present(&name) {
                Ok(true) => debug!("{name} is occupied"),
                Ok(false) => {
                    info!("Allocated free boot slot {name}");
                    return Ok(slot);
                }
                Err(source) => return Err(BootError::Read { name, source }),
            }
        }

        warn!(
            "All boot slots from {:04X} to {:04X} are occupied",
            self.range.first(),
            self.range.last()
        );
        Err(BootError::SlotsExhausted)
    }

    /// Writes `encoded` into the slot's variable. Single attempt; picking
    /// another slot after a failure is up to the caller.
    ///
    /// # Errors
    /// [`BootError::Commit`] carrying the accessor failure.
    pub fn commit<S: VariableStore + ?Sized>(
        &self,
        slot: BootSlot,
        encoded: &[u8],
        store: &mut S,
    ) -> Result<(), BootError> {
        let name = slot.variable_name();
        store
            .set(&name, &EFI_GLOBAL_VARIABLE, encoded)
            .map_err(|source| BootError::Commit {
                name: name.clone(),
                source,
            })?;
        info!("Wrote {name} ({} bytes)", encoded.len());
        Ok(())
    }

    /// Points `BootNext` at `slot`, but only if no other boot is pending.
    ///
    /// An existing `BootNext` belongs to someone else's pending request and
    /// is left untouched.
    ///
    /// # Errors
    /// - [`BootError::AlreadyScheduled`] if `BootNext` exists,
    /// - [`BootError::Read`] if reading `BootNext` fails other than not-found,
    /// - [`BootError::Commit`] if writing it fails.
    pub fn schedule_next<S: VariableStore + ?Sized>(&self, slot: BootSlot, store: &mut S) -> Result<(), BootError> {
        match store.get(names::BOOT_NEXT, &EFI_GLOBAL_VARIABLE, PROBE_BUFFER_LEN) {
            Ok(pending) => {
                let pending = BootSlot::from_le_bytes(&pending).map(BootSlot::number);
                warn!("BootNext is already set to {pending:04X?}; refusing to overwrite it");
                return Err(BootError::AlreadyScheduled { pending });
            }
            Err(VariableError::Other(EFI_BUFFER_TOO_SMALL)) => {
                warn!("BootNext is already set to an oversized value; refusing to overwrite it");
                return Err(BootError::AlreadyScheduled { pending: None });
            }
            Err(VariableError::NotFound) => {}
            Err(source) => {
                return Err(BootError::Read {
                    name: String::from(names::BOOT_NEXT),
                    source,
                });
            }
        }

        store
            .set(names::BOOT_NEXT, &EFI_GLOBAL_VARIABLE, &slot.to_le_bytes())
            .map_err(|source| BootError::Commit {
                name: String::from(names::BOOT_NEXT),
                source,
            })?;
        info!("BootNext now points at {slot}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::MemoryVariableStore;

    fn occupied(slots: &[u16]) -> MemoryVariableStore {
        let mut store = MemoryVariableStore::new();
        for &slot in slots {
            store.insert_global(&BootSlot::new(slot).variable_name(), &[1, 0, 0, 0]);
        }
        store
    }

    #[test]
    fn picks_first_gap() {
        let mut store = occupied(&[0x0004, 0x0005, 0x0007]);
        let slot = BootSlotAllocator::default().allocate_slot(&mut store).unwrap();
        assert_eq!(slot, BootSlot::new(0x0006));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn oversized_entry_counts_as_occupied() {
        let mut store = occupied(&[0x0000, 0x0001, 0x0002, 0x0003]);
        store.insert_global("Boot0004", &[0x5A; 5000]);
        let slot = BootSlotAllocator::default().allocate_slot(&mut store).unwrap();
        assert_eq!(slot, BootSlot::new(0x0005));
    }

    #[test]
    fn allocation_is_reproducible() {
        let mut store = occupied(&[0x0004, 0x0006]);
        let allocator = BootSlotAllocator::default();
        let first = allocator.allocate_slot(&mut store).unwrap();
        let second = allocator.allocate_slot(&mut store).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, BootSlot::new(0x0005));
    }

    #[test]
    fn ignores_slots_below_range() {
        let mut store = MemoryVariableStore::new();
        let allocator = BootSlotAllocator::new(SlotRange::default().with_first(0x0100));
        assert_eq!(allocator.allocate_slot(&mut store).unwrap(), BootSlot::new(0x0100));
    }

    #[test]
    fn exhausted_range_writes_nothing() {
        let mut store = occupied(&[0x10, 0x11, 0x12]);
        let allocator = BootSlotAllocator::new(SlotRange::new(0x10, 0x12));
        assert!(matches!(
            allocator.allocate_slot(&mut store),
            Err(BootError::SlotsExhausted)
        ));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn access_denied_aborts_scan() {
        let mut store = occupied(&[0x0004]).with_denied("Boot0005");
        let err = BootSlotAllocator::default().allocate_slot(&mut store).unwrap_err();
        assert!(matches!(
            err,
            BootError::Read { ref name, source: VariableError::AccessDenied } if name == "Boot0005"
        ));
        assert!(!store.reads().iter().any(|name| name == "Boot0006"));
    }

    #[test]
    fn commit_failure_carries_accessor_error() {
        let mut store = MemoryVariableStore::new().with_failing("Boot0004", 0x8000_0000_0000_0009);
        let err = BootSlotAllocator::default()
            .commit(BootSlot::new(4), &[1, 2, 3], &mut store)
            .unwrap_err();
        assert_eq!(err.variable_error(), Some(&VariableError::Other(0x8000_0000_0000_0009)));
        assert!(matches!(err, BootError::Commit { .. }));
    }

    #[test]
    fn schedules_when_boot_next_is_absent() {
        let mut store = MemoryVariableStore::new();
        BootSlotAllocator::default()
            .schedule_next(BootSlot::new(0x0004), &mut store)
            .unwrap();
        assert_eq!(store.global(names::BOOT_NEXT), Some(&[0x04, 0x00][..]));
    }

    #[test]
    fn never_overwrites_pending_boot_next() {
        let mut store = MemoryVariableStore::new().with_global(names::BOOT_NEXT, &[0x01, 0x00]);
        let err = BootSlotAllocator::default()
            .schedule_next(BootSlot::new(0x0004), &mut store)
            .unwrap_err();
        assert!(matches!(err, BootError::AlreadyScheduled { pending: Some(0x0001) }));
        assert_eq!(store.global(names::BOOT_NEXT), Some(&[0x01, 0x00][..]));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn boot_next_read_failure_is_surfaced_unchanged() {
        let mut store = MemoryVariableStore::new().with_denied(names::BOOT_NEXT);
        let err = BootSlotAllocator::default()
            .schedule_next(BootSlot::new(0x0004), &mut store)
            .unwrap_err();
        assert!(matches!(err, BootError::Read { source: VariableError::AccessDenied, .. }));
        assert!(store.writes().is_empty());
    }
}
