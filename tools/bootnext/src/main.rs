//! # bootnext
//!
//! Registers a one-shot UEFI boot entry from a running Linux system. The
//! entry is written into the first free `Boot####` slot and `BootNext` is
//! pointed at it, so the firmware boots the loader on the next restart and
//! falls back to `BootOrder` afterwards.
//!
//! ```text
//! bootnext register --partition-number 1 --partition-start 2048 \
//!     --partition-size 1048576 --partition-guid <PARTUUID> \
//!     --loader '\EFI\Linux\loader.efi'
//! bootnext status
//! ```
//!
//! Variables are accessed through efivarfs; writing them needs
//! `CAP_SYS_ADMIN`.

mod capability;
mod cli;
mod efivarfs;
mod firmware;
mod logger;
mod report;

use crate::capability::CapabilityGate;
use crate::cli::{Cli, Command, RegisterArgs};
use crate::efivarfs::EfivarfsStore;
use crate::firmware::FirmwareKind;
use crate::logger::StderrLogger;
use crate::report::StatusReport;
use boot_entry::privilege::SYSTEM_ENVIRONMENT;
use boot_entry::{BootConfigManager, PrivilegeGate, StageError};
use clap::Parser;
use log::{error, info, warn};
use std::error::Error as _;
use std::process::ExitCode;

#[derive(Debug, thiserror::Error)]
enum ToolError {
    #[error("this system was not booted through UEFI firmware")]
    NotUefi,
    #[error(transparent)]
    Stage(#[from] StageError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = StderrLogger::init(cli.log_level()) {
        eprintln!("failed to install logger: {e}");
    }

    let result = match &cli.command {
        Command::Register(args) => register(&cli, args),
        Command::Status => {
            status(&cli);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn register(cli: &Cli, args: &RegisterArgs) -> Result<(), ToolError> {
    let firmware = FirmwareKind::of_host();
    if firmware != FirmwareKind::Uefi {
        return Err(ToolError::NotUefi);
    }

    let config = args.to_config();
    let mut manager = BootConfigManager::new(
        config,
        EfivarfsStore::new(&cli.efivars),
        CapabilityGate::default(),
    );
    let registration = manager.run()?;

    info!(
        "{} will boot '{}' once on the next restart",
        registration.slot,
        manager.config().loader_path
    );
    Ok(())
}

fn status(cli: &Cli) {
    let firmware = FirmwareKind::of_host();
    if firmware != FirmwareKind::Uefi {
        warn!("No UEFI firmware detected; variables are unavailable");
    }

    let privilege = match CapabilityGate::default().status(SYSTEM_ENVIRONMENT) {
        Ok(status) => Some(status),
        Err(e) => {
            warn!("{e}");
            None
        }
    };

    let mut store = EfivarfsStore::new(&cli.efivars);
    print!("{}", StatusReport::collect(firmware, privilege, &mut store));
}
