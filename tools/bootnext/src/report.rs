//! Text rendering of the `status` subcommand.

use crate::firmware::FirmwareKind;
use boot_entry::{
    BootSlot, EntryError, FirmwareSnapshot, LoadOption, PrivilegeStatus, VariableStore,
    read_boot_entry,
};
use std::fmt;

pub struct StatusReport {
    pub firmware: FirmwareKind,
    /// `None` if the privilege state could not be determined.
    pub privilege: Option<PrivilegeStatus>,
    pub snapshot: FirmwareSnapshot,
    pub entries: Vec<(BootSlot, Result<LoadOption, EntryError>)>,
}

impl StatusReport {
    /// Reads the snapshot and every entry referenced by `BootOrder` or
    /// `BootNext`.
    pub fn collect<S: VariableStore>(
        firmware: FirmwareKind,
        privilege: Option<PrivilegeStatus>,
        store: &mut S,
    ) -> Self {
        let snapshot = FirmwareSnapshot::read(store);

        let mut slots = snapshot.boot_order.clone().unwrap_or_default();
        if let Some(next) = snapshot.boot_next
            && !slots.contains(&next)
        {
            slots.push(next);
        }

        let entries = slots
            .into_iter()
            .map(|slot| (slot, read_boot_entry(store, slot)))
            .collect();

        Self {
            firmware,
            privilege,
            snapshot,
            entries,
        }
    }
}

struct Optional<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Optional<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => value.fmt(f),
            None => f.write_str("(not set)"),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.snapshot;
        writeln!(f, "Firmware:     {}", self.firmware)?;
        match self.privilege {
            Some(status) => writeln!(f, "Privilege:    {status:?}")?,
            None => writeln!(f, "Privilege:    unknown")?,
        }
        writeln!(f, "SecureBoot:   {}", s.secure_boot)?;
        writeln!(f, "BootCurrent:  {}", Optional(&s.boot_current))?;
        writeln!(f, "BootNext:     {}", Optional(&s.boot_next))?;
        writeln!(f, "Timeout:      {}", Optional(&s.timeout))?;
        writeln!(f, "PlatformLang: {}", Optional(&s.platform_lang))?;

        match &s.boot_order {
            Some(order) => {
                let order: Vec<String> = order.iter().map(ToString::to_string).collect();
                writeln!(f, "BootOrder:    {}", order.join(", "))?;
            }
            None => writeln!(f, "BootOrder:    (not set)")?,
        }

        for (slot, entry) in &self.entries {
            match entry {
                Ok(option) => {
                    let marker = if option.attributes.active() { '*' } else { ' ' };
                    write!(f, "{slot}{marker} {}", option.description_lossy())?;
                    if let Some(path) = option.loader_path() {
                        write!(f, "\t{path}")?;
                    }
                    writeln!(f)?;
                }
                Err(e) => writeln!(f, "{slot}  <{e}>")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boot_entry::in_memory::MemoryVariableStore;
    use boot_entry::variable::names;
    use boot_entry::{BootEntryConfig, HardDriveNode};

    #[test]
    fn renders_snapshot_and_entries() {
        let mut config = BootEntryConfig::new(HardDriveNode::gpt(
            1,
            2048,
            4096,
            uefi::guid!("c12a7328-f81f-11d2-ba4b-00a0c93ec93b"),
        ));
        config.description = String::from("Linux");
        let encoded = config.load_option().unwrap().encode().unwrap();

        let mut store = MemoryVariableStore::new()
            .with_global(names::SECURE_BOOT, &[0])
            .with_global(names::BOOT_ORDER, &[0x01, 0x00])
            .with_global(names::BOOT_NEXT, &[0x04, 0x00])
            .with_global("Boot0001", &encoded);

        let report = StatusReport::collect(
            FirmwareKind::Uefi,
            Some(PrivilegeStatus::Enabled),
            &mut store,
        );
        assert_eq!(report.entries.len(), 2);

        let text = report.to_string();
        assert!(text.contains("Firmware:     UEFI\n"));
        assert!(text.contains("SecureBoot:   disabled\n"));
        assert!(text.contains("BootNext:     Boot0004\n"));
        assert!(text.contains("Timeout:      (not set)\n"));
        assert!(text.contains("BootOrder:    Boot0001\n"));
        assert!(text.contains("Boot0001* Linux\t\\EFI\\Linux\\loader.efi\n"));
        assert!(text.contains("Boot0004  <failed to read Boot0004>\n"));
    }
}
