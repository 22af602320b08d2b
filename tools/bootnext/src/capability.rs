//! # Capability Gate
//!
//! On Linux the right to write firmware variables is `CAP_SYS_ADMIN`. The
//! capability sets of the current process are read from `/proc/self/status`.

use boot_entry::privilege::SYSTEM_ENVIRONMENT;
use boot_entry::{PrivilegeError, PrivilegeGate, PrivilegeStatus};
use log::debug;
use std::fs;
use std::path::PathBuf;

pub const CAP_SYS_ADMIN: u32 = 21;

const PROC_SELF_STATUS: &str = "/proc/self/status";

/// Effective and permitted capability sets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub effective: u64,
    pub permitted: u64,
}

impl Capabilities {
    /// Parses the `CapEff` and `CapPrm` lines of a `/proc/<pid>/status` file.
    #[must_use]
    pub fn parse(status: &str) -> Option<Self> {
        let mut effective = None;
        let mut permitted = None;
        for line in status.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let slot = match key {
                "CapEff" => &mut effective,
                "CapPrm" => &mut permitted,
                _ => continue,
            };
            *slot = u64::from_str_radix(value.trim(), 16).ok();
        }
        Some(Self {
            effective: effective?,
            permitted: permitted?,
        })
    }

    #[must_use]
    pub const fn status_of(&self, capability: u32) -> PrivilegeStatus {
        let bit = 1u64 << capability;
        if self.effective & bit != 0 {
            PrivilegeStatus::Enabled
        } else if self.permitted & bit != 0 {
            PrivilegeStatus::Disabled
        } else {
            PrivilegeStatus::Removed
        }
    }
}

/// Maps the system-environment privilege onto `CAP_SYS_ADMIN`.
///
/// The gate only checks; it never changes the process's capability sets.
/// Run the tool as root or with `CAP_SYS_ADMIN` in the effective set.
#[derive(Debug, Clone)]
pub struct CapabilityGate {
    status_file: PathBuf,
}

impl Default for CapabilityGate {
    fn default() -> Self {
        Self::new(PROC_SELF_STATUS)
    }
}

impl CapabilityGate {
    #[must_use]
    pub fn new(status_file: impl Into<PathBuf>) -> Self {
        Self {
            status_file: status_file.into(),
        }
    }

    fn capabilities(&self) -> Result<Capabilities, PrivilegeError> {
        let status = fs::read_to_string(&self.status_file).map_err(|e| {
            debug!("Unable to read {}: {e}", self.status_file.display());
            PrivilegeError::Unknown(SYSTEM_ENVIRONMENT.to_string())
        })?;
        Capabilities::parse(&status).ok_or_else(|| PrivilegeError::Unknown(SYSTEM_ENVIRONMENT.to_string()))
    }
}

fn check_name(name: &str) -> Result<(), PrivilegeError> {
    if name == SYSTEM_ENVIRONMENT {
        Ok(())
    } else {
        Err(PrivilegeError::Unknown(name.to_string()))
    }
}

impl PrivilegeGate for CapabilityGate {
    fn obtain(&mut self, name: &str) -> Result<(), PrivilegeError> {
        match self.status(name)? {
            PrivilegeStatus::Enabled => Ok(()),
            other => {
                debug!("CAP_SYS_ADMIN is {other:?}");
                Err(PrivilegeError::Denied(name.to_string()))
            }
        }
    }

    fn release(&mut self, name: &str) -> Result<(), PrivilegeError> {
        check_name(name)
    }

    fn status(&self, name: &str) -> Result<PrivilegeStatus, PrivilegeError> {
        check_name(name)?;
        Ok(self.capabilities()?.status_of(CAP_SYS_ADMIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "Name:\tbootnext\nCapInh:\t0000000000000000\nCapPrm:\t000001ffffffffff\nCapEff:\t000001ffffffffff\nCapBnd:\t000001ffffffffff\n";
    const USER: &str = "Name:\tbootnext\nCapPrm:\t0000000000000000\nCapEff:\t0000000000000000\n";
    const DROPPED: &str = "CapPrm:\t0000000000200000\nCapEff:\t0000000000000000\n";

    #[test]
    fn parses_capability_sets() {
        let caps = Capabilities::parse(ROOT).unwrap();
        assert_eq!(caps.effective, 0x0000_01ff_ffff_ffff);
        assert_eq!(Capabilities::parse("Name:\tx\n"), None);
    }

    #[test]
    fn maps_sys_admin_to_status() {
        let status = |text| Capabilities::parse(text).unwrap().status_of(CAP_SYS_ADMIN);
        assert_eq!(status(ROOT), PrivilegeStatus::Enabled);
        assert_eq!(status(DROPPED), PrivilegeStatus::Disabled);
        assert_eq!(status(USER), PrivilegeStatus::Removed);
    }

    #[test]
    fn gate_reads_the_status_file() {
        let path = std::env::temp_dir().join(format!("bootnext-caps-{}", std::process::id()));
        fs::write(&path, USER).unwrap();

        let mut gate = CapabilityGate::new(&path);
        assert_eq!(
            gate.obtain(SYSTEM_ENVIRONMENT),
            Err(PrivilegeError::Denied(SYSTEM_ENVIRONMENT.to_string()))
        );
        assert_eq!(
            gate.status("SeDebugPrivilege"),
            Err(PrivilegeError::Unknown("SeDebugPrivilege".to_string()))
        );

        fs::write(&path, ROOT).unwrap();
        assert_eq!(gate.obtain(SYSTEM_ENVIRONMENT), Ok(()));
        fs::remove_file(&path).unwrap();
    }
}
