//! # Privilege Gate
//!
//! Operating systems guard firmware variables behind a named right; on
//! Windows that is `SeSystemEnvironmentPrivilege`, on Linux it maps to
//! `CAP_SYS_ADMIN`. The engine only asks for it through [`PrivilegeGate`].

use alloc::string::String;

/// The right needed to read or write firmware variables.
pub const SYSTEM_ENVIRONMENT: &str = "SeSystemEnvironmentPrivilege";

/// State of a privilege in the current process.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrivilegeStatus {
    /// Held and in effect.
    Enabled,
    /// Held but not in effect; obtaining it would succeed.
    Disabled,
    /// Not held at all.
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrivilegeError {
    #[error("privilege {0} could not be obtained")]
    Denied(String),
    #[error("privilege {0} is not known on this platform")]
    Unknown(String),
}

pub trait PrivilegeGate {
    /// # Errors
    /// [`PrivilegeError::Denied`] if the process may not hold `name`.
    fn obtain(&mut self, name: &str) -> Result<(), PrivilegeError>;

    /// # Errors
    /// If the platform refuses to drop `name`.
    fn release(&mut self, name: &str) -> Result<(), PrivilegeError>;

    /// # Errors
    /// If `name` cannot be looked up.
    fn status(&self, name: &str) -> Result<PrivilegeStatus, PrivilegeError>;
}

impl<G: PrivilegeGate + ?Sized> PrivilegeGate for &mut G {
    fn obtain(&mut self, name: &str) -> Result<(), PrivilegeError> {
        (**self).obtain(name)
    }

    fn release(&mut self, name: &str) -> Result<(), PrivilegeError> {
        (**self).release(name)
    }

    fn status(&self, name: &str) -> Result<PrivilegeStatus, PrivilegeError> {
        (**self).status(name)
    }
}
