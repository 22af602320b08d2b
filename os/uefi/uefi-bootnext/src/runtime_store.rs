//! # Runtime Variable Services
//!
//! [`VariableStore`] and [`PrivilegeGate`] backed by the firmware itself.

use alloc::vec;
use alloc::vec::Vec;
use boot_entry::{PrivilegeError, PrivilegeGate, PrivilegeStatus, VariableError, VariableStore};
use uefi::runtime::{self, VariableAttributes, VariableVendor};
use uefi::{CString16, Guid, Status};

/// Attributes of every variable this application writes.
const ATTRIBUTES: VariableAttributes = VariableAttributes::NON_VOLATILE
    .union(VariableAttributes::BOOTSERVICE_ACCESS)
    .union(VariableAttributes::RUNTIME_ACCESS);

/// Reads and writes variables through `GetVariable()` / `SetVariable()`.
#[derive(Debug, Default)]
pub struct RuntimeVariableStore;

impl VariableStore for RuntimeVariableStore {
    fn get(&mut self, name: &str, vendor: &Guid, max_len: usize) -> Result<Vec<u8>, VariableError> {
        let name = variable_name(name)?;
        let mut buf = vec![0u8; max_len];
        match runtime::get_variable(&name, &VariableVendor(*vendor), &mut buf) {
            Ok((data, _attributes)) => Ok(data.to_vec()),
            Err(e) => Err(map_status(e.status())),
        }
    }

    fn set(&mut self, name: &str, vendor: &Guid, data: &[u8]) -> Result<(), VariableError> {
        let name = variable_name(name)?;
        runtime::set_variable(&name, &VariableVendor(*vendor), ATTRIBUTES, data)
            .map_err(|e| map_status(e.status()))
    }
}

fn variable_name(name: &str) -> Result<CString16, VariableError> {
    CString16::try_from(name).map_err(|_| VariableError::Other(status_code(Status::INVALID_PARAMETER)))
}

fn map_status(status: Status) -> VariableError {
    match status {
        Status::NOT_FOUND => VariableError::NotFound,
        Status::SECURITY_VIOLATION | Status::ACCESS_DENIED | Status::WRITE_PROTECTED => {
            VariableError::AccessDenied
        }
        other => VariableError::Other(status_code(other)),
    }
}

fn status_code(status: Status) -> u64 {
    u64::try_from(status.0).unwrap_or(u64::MAX)
}

/// While boot services run, the image already has full access to the
/// variable services. There is nothing to obtain or release.
#[derive(Debug, Default)]
pub struct BootServicesGate;

impl PrivilegeGate for BootServicesGate {
    fn obtain(&mut self, _name: &str) -> Result<(), PrivilegeError> {
        Ok(())
    }

    fn release(&mut self, _name: &str) -> Result<(), PrivilegeError> {
        Ok(())
    }

    fn status(&self, _name: &str) -> Result<PrivilegeStatus, PrivilegeError> {
        Ok(PrivilegeStatus::Enabled)
    }
}
