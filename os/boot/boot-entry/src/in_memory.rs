//! In-memory stand-ins for the firmware variable store and the privilege
//! gate. Used by the tests and by dry runs of the host tool.

use crate::privilege::{PrivilegeError, PrivilegeGate, PrivilegeStatus};
use crate::variable::{EFI_BUFFER_TOO_SMALL, EFI_GLOBAL_VARIABLE, VariableError, VariableStore};
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use uefi::Guid;

type Key = (String, [u8; 16]);

/// A variable namespace held in a map, with optional fault injection.
///
/// Every `get` and `set` call is recorded by variable name, in order.
#[derive(Debug, Default, Clone)]
pub struct MemoryVariableStore {
    variables: BTreeMap<Key, Vec<u8>>,
    denied: BTreeSet<String>,
    write_protected: BTreeSet<String>,
    failing: BTreeMap<String, u64>,
    reads: Vec<String>,
    writes: Vec<String>,
}

impl MemoryVariableStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_global(mut self, name: &str, data: &[u8]) -> Self {
        self.insert_global(name, data);
        self
    }

    /// Every access to `name` fails with [`VariableError::AccessDenied`].
    #[must_use]
    pub fn with_denied(mut self, name: &str) -> Self {
        self.denied.insert(name.to_string());
        self
    }

    /// Reads of `name` succeed, writes fail with [`VariableError::AccessDenied`].
    #[must_use]
    pub fn with_write_protected(mut self, name: &str) -> Self {
        self.write_protected.insert(name.to_string());
        self
    }

    /// Every access to `name` fails with [`VariableError::Other`].
    #[must_use]
    pub fn with_failing(mut self, name: &str, status: u64) -> Self {
        self.failing.insert(name.to_string(), status);
        self
    }

    /// Seeds a global variable without recording a write.
    pub fn insert_global(&mut self, name: &str, data: &[u8]) {
        self.variables
            .insert(key(name, &EFI_GLOBAL_VARIABLE), data.to_vec());
    }

    #[must_use]
    pub fn global(&self, name: &str) -> Option<&[u8]> {
        self.variables
            .get(&key(name, &EFI_GLOBAL_VARIABLE))
            .map(Vec::as_slice)
    }

    /// Names passed to `get`, in call order.
    #[must_use]
    pub fn reads(&self) -> &[String] {
        &self.reads
    }

    /// Names passed to `set`, in call order, including failed attempts.
    #[must_use]
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    fn injected_failure(&self, name: &str) -> Option<VariableError> {
        if self.denied.contains(name) {
            return Some(VariableError::AccessDenied);
        }
        self.failing.get(name).copied().map(VariableError::Other)
    }
}

fn key(name: &str, vendor: &Guid) -> Key {
    (name.to_string(), vendor.to_bytes())
}

impl VariableStore for MemoryVariableStore {
    fn get(&mut self, name: &str, vendor: &Guid, max_len: usize) -> Result<Vec<u8>, VariableError> {
        self.reads.push(name.to_string());
        if let Some(err) = self.injected_failure(name) {
            return Err(err);
        }

        let data = self
            .variables
            .get(&key(name, vendor))
            .ok_or(VariableError::NotFound)?;
        if data.len() > max_len {
            return Err(VariableError::Other(EFI_BUFFER_TOO_SMALL));
        }
        Ok(data.clone())
    }

    fn set(&mut self, name: &str, vendor: &Guid, data: &[u8]) -> Result<(), VariableError> {
        self.writes.push(name.to_string());
        if let Some(err) = self.injected_failure(name) {
            return Err(err);
        }
        if self.write_protected.contains(name) {
            return Err(VariableError::AccessDenied);
        }

        if data.is_empty() {
            self.variables.remove(&key(name, vendor));
        } else {
            self.variables.insert(key(name, vendor), data.to_vec());
        }
        Ok(())
    }
}

/// A privilege gate with a fixed answer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StaticPrivilegeGate {
    grantable: bool,
    held: bool,
    obtained: usize,
    released: usize,
}

impl StaticPrivilegeGate {
    /// Every privilege can be obtained.
    #[must_use]
    pub const fn granting() -> Self {
        Self {
            grantable: true,
            held: false,
            obtained: 0,
            released: 0,
        }
    }

    /// No privilege can be obtained.
    #[must_use]
    pub const fn denying() -> Self {
        Self {
            grantable: false,
            held: false,
            obtained: 0,
            released: 0,
        }
    }

    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.held
    }

    /// Successful `obtain` calls so far.
    #[must_use]
    pub const fn obtained(&self) -> usize {
        self.obtained
    }

    /// `release` calls so far.
    #[must_use]
    pub const fn released(&self) -> usize {
        self.released
    }
}

impl PrivilegeGate for StaticPrivilegeGate {
    fn obtain(&mut self, name: &str) -> Result<(), PrivilegeError> {
        if !self.grantable {
            return Err(PrivilegeError::Denied(name.to_string()));
        }
        self.held = true;
        self.obtained += 1;
        Ok(())
    }

    fn release(&mut self, _name: &str) -> Result<(), PrivilegeError> {
        self.held = false;
        self.released += 1;
        Ok(())
    }

    fn status(&self, _name: &str) -> Result<PrivilegeStatus, PrivilegeError> {
        Ok(match (self.held, self.grantable) {
            (true, _) => PrivilegeStatus::Enabled,
            (false, true) => PrivilegeStatus::Disabled,
            (false, false) => PrivilegeStatus::Removed,
        })
    }
}
