//! # Boot Configuration Manager
//!
//! Drives one registration from start to finish:
//!
//! ```text
//! Idle -> AcquiringPrivilege -> CheckingSecureBoot -> AllocatingSlot
//!      -> Encoding -> CommittingEntry -> SchedulingNext -> Done
//! ```
//!
//! Any step may fail, which moves the manager to [`Stage::Failed`] and ends
//! the run. Nothing is retried and nothing is rolled back: an entry written
//! during `CommittingEntry` stays in place when `SchedulingNext` fails.
//! Firmware boot managers ignore `Boot####` variables that are not referenced
//! by `BootOrder` or `BootNext`, so the leftover is harmless.
//!
//! The privilege obtained in the first step is released again when the run
//! ends, whatever the outcome.

use crate::allocator::BootSlotAllocator;
use crate::attributes::LoadOptionAttributes;
use crate::device_path::HardDriveNode;
use crate::error::BootError;
use crate::load_option::LoadOption;
use crate::privilege::{PrivilegeGate, SYSTEM_ENVIRONMENT};
use crate::slot::{BootSlot, SlotRange};
use crate::variable::{EFI_GLOBAL_VARIABLE, VariableStore, names};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use log::{debug, error, info, warn};

/// Description used when the caller does not provide one.
pub const DEFAULT_DESCRIPTION: &str = "One-shot Boot Entry";

/// Loader used when the caller does not provide one.
pub const DEFAULT_LOADER_PATH: &str = "\\EFI\\Linux\\loader.efi";

/// Everything needed to build the boot entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootEntryConfig {
    pub description: String,
    /// Backslash-separated path on the partition, e.g. `\EFI\Linux\loader.efi`.
    pub loader_path: String,
    pub partition: HardDriveNode,
    pub attributes: LoadOptionAttributes,
    pub optional_data: Vec<u8>,
    pub slots: SlotRange,
}

impl BootEntryConfig {
    /// An active boot entry for the default loader on `partition`.
    #[must_use]
    pub fn new(partition: HardDriveNode) -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.to_string(),
            loader_path: DEFAULT_LOADER_PATH.to_string(),
            partition,
            attributes: LoadOptionAttributes::active_boot(),
            optional_data: Vec::new(),
            slots: SlotRange::default(),
        }
    }

    /// Builds the load option this configuration describes.
    ///
    /// # Errors
    /// If the description or loader path cannot be encoded.
    pub fn load_option(&self) -> Result<LoadOption, crate::EncodingError> {
        Ok(LoadOption::for_partition_file(
            self.attributes,
            &self.description,
            &self.partition,
            &self.loader_path,
        )?
        .with_optional_data(self.optional_data.clone()))
    }
}

/// Externally visible position of the manager.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    AcquiringPrivilege,
    CheckingSecureBoot,
    AllocatingSlot,
    Encoding,
    CommittingEntry,
    SchedulingNext,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::AcquiringPrivilege => "acquiring privilege",
            Self::CheckingSecureBoot => "checking Secure Boot",
            Self::AllocatingSlot => "allocating boot slot",
            Self::Encoding => "encoding load option",
            Self::CommittingEntry => "committing boot entry",
            Self::SchedulingNext => "scheduling BootNext",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// What the `SecureBoot` variable said.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SecureBootState {
    Disabled,
    Enabled,
    /// The variable was missing, unreadable or empty.
    #[default]
    Unknown,
}

impl SecureBootState {
    /// Interprets the raw `SecureBoot` payload. Any non-zero first byte counts
    /// as enforced.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes.first() {
            Some(0) => Self::Disabled,
            Some(_) => Self::Enabled,
            None => Self::Unknown,
        }
    }
}

impl fmt::Display for SecureBootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disabled",
            Self::Enabled => "enabled",
            Self::Unknown => "unknown",
        })
    }
}

/// Outcome of a successful run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The slot holding the new entry, now also referenced by `BootNext`.
    pub slot: BootSlot,
    pub secure_boot: SecureBootState,
}

/// A failed run: the stage that failed and why.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: BootError,
}

/// Work left to do, with the data the next step needs.
enum Step {
    AcquirePrivilege,
    CheckSecureBoot,
    Allocate,
    Encode(BootSlot),
    Commit(BootSlot, Vec<u8>),
    Schedule(BootSlot),
    Finished(BootSlot),
}

impl Step {
    const fn stage(&self) -> Stage {
        match self {
            Self::AcquirePrivilege => Stage::AcquiringPrivilege,
            Self::CheckSecureBoot => Stage::CheckingSecureBoot,
            Self::Allocate => Stage::AllocatingSlot,
            Self::Encode(_) => Stage::Encoding,
            Self::Commit(..) => Stage::CommittingEntry,
            Self::Schedule(_) => Stage::SchedulingNext,
            Self::Finished(_) => Stage::Done,
        }
    }
}

/// Registers a boot entry and schedules it for the next boot.
///
/// The manager owns its store and privilege gate for the duration of a run.
/// Pass `&mut` references to keep them accessible afterwards.
pub struct BootConfigManager<S, P> {
    config: BootEntryConfig,
    store: S,
    gate: P,
    allocator: BootSlotAllocator,
    stage: Stage,
    secure_boot: SecureBootState,
    privilege_held: bool,
}

impl<S, P> BootConfigManager<S, P>
where
    S: VariableStore,
    P: PrivilegeGate,
{
    #[must_use]
    pub fn new(config: BootEntryConfig, store: S, gate: P) -> Self {
        let allocator = BootSlotAllocator::new(config.slots);
        Self {
            config,
            store,
            gate,
            allocator,
            stage: Stage::Idle,
            secure_boot: SecureBootState::Unknown,
            privilege_held: false,
        }
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub const fn config(&self) -> &BootEntryConfig {
        &self.config
    }

    /// The Secure Boot state seen by the last run.
    #[must_use]
    pub const fn secure_boot(&self) -> SecureBootState {
        self.secure_boot
    }

    /// Runs every stage in order and stops at the first failure.
    ///
    /// # Errors
    /// A [`StageError`] naming the failed stage.
    pub fn run(&mut self) -> Result<Registration, StageError> {
        self.stage = Stage::Idle;
        self.secure_boot = SecureBootState::Unknown;

        let outcome = self.drive();
        self.release_privilege();
        outcome
    }

    /// Gives back the store and the gate.
    #[must_use]
    pub fn into_parts(self) -> (S, P) {
        (self.store, self.gate)
    }

    fn drive(&mut self) -> Result<Registration, StageError> {
        let mut step = Step::AcquirePrivilege;
        loop {
            let stage = step.stage();
            self.transition(stage);

            if let Step::Finished(slot) = step {
                info!("Boot entry {slot} is scheduled for the next boot");
                return Ok(Registration {
                    slot,
                    secure_boot: self.secure_boot,
                });
            }

            step = match self.advance(step) {
                Ok(next) => next,
                Err(source) => {
                    error!("Stage '{stage}' failed: {source}");
                    self.transition(Stage::Failed);
                    return Err(StageError { stage, source });
                }
            };
        }
    }

    fn advance(&mut self, step: Step) -> Result<Step, BootError> {
        match step {
            Step::AcquirePrivilege => {
                self.gate.obtain(SYSTEM_ENVIRONMENT)?;
                self.privilege_held = true;
                Ok(Step::CheckSecureBoot)
            }
            Step::CheckSecureBoot => {
                self.secure_boot = self.read_secure_boot();
                if self.secure_boot == SecureBootState::Enabled {
                    return Err(BootError::SecureBootUnsupported);
                }
                Ok(Step::Allocate)
            }
            Step::Allocate => Ok(Step::Encode(self.allocator.allocate_slot(&mut self.store)?)),
            Step::Encode(slot) => {
                let encoded = self.config.load_option()?.encode()?;
                debug!("Encoded load option for {slot}: {} bytes", encoded.len());
                Ok(Step::Commit(slot, encoded))
            }
            Step::Commit(slot, encoded) => {
                self.allocator.commit(slot, &encoded, &mut self.store)?;
                Ok(Step::Schedule(slot))
            }
            Step::Schedule(slot) => {
                self.allocator.schedule_next(slot, &mut self.store)?;
                Ok(Step::Finished(slot))
            }
            Step::Finished(slot) => Ok(Step::Finished(slot)),
        }
    }

    /// A failed read is not fatal: the firmware decides on its own whether to
    /// load the entry, the check only avoids writing one that cannot boot.
    fn read_secure_boot(&mut self) -> SecureBootState {
        match self.store.get(names::SECURE_BOOT, &EFI_GLOBAL_VARIABLE, 1) {
            Ok(bytes) => {
                let state = SecureBootState::from_bytes(&bytes);
                info!("Secure Boot is {state}");
                state
            }
            Err(e) => {
                warn!("Unable to read {}: {e}; continuing", names::SECURE_BOOT);
                SecureBootState::Unknown
            }
        }
    }

    fn release_privilege(&mut self) {
        if !core::mem::take(&mut self.privilege_held) {
            return;
        }
        if let Err(e) = self.gate.release(SYSTEM_ENVIRONMENT) {
            warn!("Failed to release {SYSTEM_ENVIRONMENT}: {e}");
        }
    }

    fn transition(&mut self, next: Stage) {
        debug!("{} -> {next}", self.stage);
        self.stage = next;
    }
}
