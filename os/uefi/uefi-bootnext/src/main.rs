//! # One-shot Boot Entry Application
//!
//! UEFI application that registers a boot entry for a loader on the
//! partition it was itself started from and schedules that entry through
//! `BootNext`. Reset the machine afterwards to boot the loader once; the
//! firmware deletes `BootNext` as it consumes it.
//!
//! ```text
//! UEFI Shell
//!     ↓
//! ┌─────────────────────────────────────────────┐
//! │            uefi-bootnext.efi                │
//! ├─────────────────────────────────────────────┤
//! │  1. Find own partition (LoadedImage path)   │
//! │  2. Apply load options to the config        │
//! │  3. Run the boot configuration manager      │
//! │     against runtime variable services       │
//! └─────────────────────────────────────────────┘
//!     ↓
//! Status::SUCCESS or Status::ABORTED
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![no_main]
extern crate alloc;

mod logger;
mod options;
mod partition;
mod runtime_store;

use crate::logger::UefiLogger;
use crate::runtime_store::{BootServicesGate, RuntimeVariableStore};
use boot_entry::{BootConfigManager, BootEntryConfig, FirmwareSnapshot};
use log::{LevelFilter, error, info, warn};
use uefi::prelude::*;

static LOGGER: UefiLogger = UefiLogger::new(LevelFilter::Info);

#[entry]
fn efi_main() -> Status {
    if uefi::helpers::init().is_err() {
        return Status::UNSUPPORTED;
    }
    if LOGGER.init().is_err() {
        uefi::println!("Failed to install the logger");
        return Status::ABORTED;
    }

    let partition = match partition::boot_partition() {
        Ok(partition) => partition,
        Err(e) => {
            error!("Unable to determine the boot partition: {e}");
            return Status::ABORTED;
        }
    };
    info!(
        "Image was loaded from partition {} ({})",
        partition.partition_number, partition.partition_signature
    );

    let mut config = BootEntryConfig::new(partition);
    if let Err(e) = boot_entry::options::apply(&options::command_line(), &mut config) {
        error!("Invalid load options: {e}");
        return Status::INVALID_PARAMETER;
    }

    let snapshot = FirmwareSnapshot::read(&mut RuntimeVariableStore);
    if let Some(current) = snapshot.boot_current {
        info!("Current boot entry is {current}");
    }

    let mut manager = BootConfigManager::new(config, RuntimeVariableStore, BootServicesGate);
    match manager.run() {
        Ok(registration) => {
            info!(
                "Registered {} for '{}'; reset to boot it once",
                registration.slot,
                manager.config().loader_path
            );
            Status::SUCCESS
        }
        Err(e) => {
            error!("{e}: {}", e.source);
            if let Some(kind) = e.source.variable_error() {
                warn!("Firmware reported: {kind}");
            }
            Status::ABORTED
        }
    }
}
