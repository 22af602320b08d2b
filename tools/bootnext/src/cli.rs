//! Command-line interface definitions for bootnext.

use crate::efivarfs::DEFAULT_EFIVARS_DIR;
use boot_entry::options::parse_slot;
use boot_entry::{BootEntryConfig, DEFAULT_DESCRIPTION, DEFAULT_LOADER_PATH, HardDriveNode, SlotRange};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use uefi::Guid;

/// Schedule a one-shot boot of a UEFI loader.
#[derive(Parser)]
#[command(name = "bootnext", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Directory where efivarfs is mounted.
    #[arg(long, global = true, default_value = DEFAULT_EFIVARS_DIR)]
    pub efivars: PathBuf,

    /// Only report errors.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// More output; repeat for trace level.
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Write a boot entry into the first free slot and set BootNext to it.
    Register(RegisterArgs),
    /// Show the standard boot variables.
    Status,
}

/// Arguments for the `register` subcommand.
///
/// The partition values are the ones of the GPT entry holding the loader,
/// e.g. from `sgdisk --info=<n>` or `/sys/class/block/<part>/{partition,start,size}`.
#[derive(Parser)]
pub struct RegisterArgs {
    /// Description shown by the firmware boot menu.
    #[arg(long, default_value = DEFAULT_DESCRIPTION)]
    pub description: String,

    /// Path of the loader on the partition, backslash-separated.
    #[arg(long, default_value = DEFAULT_LOADER_PATH)]
    pub loader: String,

    /// Lowest slot number to use (hex).
    #[arg(long, default_value = "0004", value_parser = parse_slot)]
    pub first_slot: u16,

    /// Highest slot number to use (hex).
    #[arg(long, default_value = "FFFF", value_parser = parse_slot)]
    pub last_slot: u16,

    /// GPT partition number, starting at 1.
    #[arg(long)]
    pub partition_number: u32,

    /// First LBA of the partition.
    #[arg(long)]
    pub partition_start: u64,

    /// Size of the partition in LBAs.
    #[arg(long)]
    pub partition_size: u64,

    /// Unique partition GUID (`PARTUUID`).
    #[arg(long, value_parser = parse_guid)]
    pub partition_guid: Guid,
}

impl RegisterArgs {
    #[must_use]
    pub fn to_config(&self) -> BootEntryConfig {
        let partition = HardDriveNode::gpt(
            self.partition_number,
            self.partition_start,
            self.partition_size,
            self.partition_guid,
        );
        let mut config = BootEntryConfig::new(partition);
        config.description.clone_from(&self.description);
        config.loader_path.clone_from(&self.loader);
        config.slots = SlotRange::new(self.first_slot, self.last_slot);
        config
    }
}

fn parse_guid(value: &str) -> Result<Guid, String> {
    Guid::try_parse(value).map_err(|e| format!("'{value}' is not a GUID: {e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bootnext").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn register_builds_config() {
        let cli = parse(&[
            "register",
            "--partition-number",
            "1",
            "--partition-start",
            "2048",
            "--partition-size",
            "1048576",
            "--partition-guid",
            "c12a7328-f81f-11d2-ba4b-00a0c93ec93b",
            "--first-slot",
            "0x0100",
        ]);
        let Command::Register(args) = cli.command else {
            panic!("expected register");
        };

        let config = args.to_config();
        assert_eq!(config.slots, SlotRange::new(0x0100, 0xFFFF));
        assert_eq!(config.description, DEFAULT_DESCRIPTION);
        assert_eq!(config.partition.partition_start, 2048);
        assert_eq!(
            config.partition.partition_signature,
            uefi::guid!("c12a7328-f81f-11d2-ba4b-00a0c93ec93b")
        );
    }

    #[test]
    fn verbosity_maps_to_level() {
        assert_eq!(parse(&["status"]).log_level(), LevelFilter::Info);
        assert_eq!(parse(&["-vv", "status"]).log_level(), LevelFilter::Trace);
        assert_eq!(parse(&["status", "-q"]).log_level(), LevelFilter::Error);
        assert!(Cli::try_parse_from(["bootnext", "-q", "-v", "status"]).is_err());
    }

    #[test]
    fn slot_numbers_are_hex() {
        assert_eq!(parse_slot("000A"), Ok(0x000A));
        assert_eq!(parse_slot("0x10"), Ok(0x0010));
        assert!(parse_slot("10000").is_err());
    }
}
