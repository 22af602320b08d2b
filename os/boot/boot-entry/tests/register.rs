use boot_entry::in_memory::{MemoryVariableStore, StaticPrivilegeGate};
use boot_entry::variable::names;
use boot_entry::{
    BootConfigManager, BootEntryConfig, BootError, BootSlot, FirmwareSnapshot, HardDriveNode,
    LoadOption, SlotRange, Stage, read_boot_entry,
};
use uefi::guid;

fn esp() -> HardDriveNode {
    HardDriveNode::gpt(
        1,
        2048,
        1_048_576,
        guid!("c12a7328-f81f-11d2-ba4b-00a0c93ec93b"),
    )
}

/// Firmware with three vendor entries, a gap at 0x0006 and Secure Boot off.
fn populated_firmware() -> MemoryVariableStore {
    let mut store = MemoryVariableStore::new()
        .with_global(names::SECURE_BOOT, &[0])
        .with_global(names::BOOT_ORDER, &[0x00, 0x00, 0x01, 0x00]);
    for slot in [0x0004_u16, 0x0005, 0x0007] {
        store.insert_global(&BootSlot::new(slot).variable_name(), &[1, 0, 0, 0]);
    }
    store
}

#[test]
fn registers_in_the_first_gap() {
    let mut store = populated_firmware();
    let mut config = BootEntryConfig::new(esp());
    config.description = String::from("Recovery");
    config.loader_path = String::from("\\EFI\\Recovery\\recovery.efi");

    let registration = BootConfigManager::new(config, &mut store, StaticPrivilegeGate::granting())
        .run()
        .unwrap();
    assert_eq!(registration.slot, BootSlot::new(0x0006));

    let entry = read_boot_entry(&mut store, registration.slot).unwrap();
    assert_eq!(entry.description_lossy(), "Recovery");
    assert_eq!(entry.loader_path().as_deref(), Some("\\EFI\\Recovery\\recovery.efi"));
    assert_eq!(entry.device_path[0].as_hard_drive(), Some(esp()));
    assert!(entry.attributes.active());

    let snapshot = FirmwareSnapshot::read(&mut store);
    assert_eq!(snapshot.boot_next, Some(BootSlot::new(0x0006)));
    // BootOrder is left alone.
    assert_eq!(
        snapshot.boot_order,
        Some(vec![BootSlot::new(0x0000), BootSlot::new(0x0001)])
    );
}

#[test]
fn second_run_is_refused_but_leaves_an_entry() {
    let mut store = populated_firmware();
    let config = BootEntryConfig::new(esp());

    BootConfigManager::new(config.clone(), &mut store, StaticPrivilegeGate::granting())
        .run()
        .unwrap();
    let err = BootConfigManager::new(config, &mut store, StaticPrivilegeGate::granting())
        .run()
        .unwrap_err();

    assert_eq!(err.stage, Stage::SchedulingNext);
    assert!(matches!(
        err.source,
        BootError::AlreadyScheduled { pending: Some(0x0006) }
    ));
    assert!(store.global("Boot0008").is_some());
    assert_eq!(store.global(names::BOOT_NEXT), Some(&[0x06, 0x00][..]));
}

#[test]
fn exhausted_range_writes_nothing() {
    let mut store = populated_firmware();
    let mut config = BootEntryConfig::new(esp());
    config.slots = SlotRange::new(0x0004, 0x0005);

    let err = BootConfigManager::new(config, &mut store, StaticPrivilegeGate::granting())
        .run()
        .unwrap_err();
    assert_eq!(err.stage, Stage::AllocatingSlot);
    assert!(matches!(err.source, BootError::SlotsExhausted));
    assert!(store.writes().is_empty());
}

#[test]
fn written_entry_round_trips() {
    let mut store = MemoryVariableStore::new().with_global(names::SECURE_BOOT, &[0]);
    let config = BootEntryConfig::new(esp());
    let expected = config.load_option().unwrap();

    BootConfigManager::new(config, &mut store, StaticPrivilegeGate::granting())
        .run()
        .unwrap();

    let raw = store.global("Boot0004").unwrap();
    assert_eq!(LoadOption::decode(raw).unwrap(), expected);
    assert_eq!(raw, expected.encode().unwrap().as_slice());
}
