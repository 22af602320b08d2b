//! # efivarfs
//!
//! Linux exposes each firmware variable as a file named `<Name>-<guid>`
//! under the efivarfs mount. The file starts with the variable's 32-bit
//! attribute word, followed by the payload. A write must carry the
//! attributes and the payload in one buffer.

use boot_entry::{EFI_BUFFER_TOO_SMALL, VariableError, VariableStore};
use log::trace;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use uefi::Guid;

/// Where efivarfs is mounted on practically every distribution.
pub const DEFAULT_EFIVARS_DIR: &str = "/sys/firmware/efi/efivars";

/// `EFI_VARIABLE_NON_VOLATILE | BOOTSERVICE_ACCESS | RUNTIME_ACCESS`.
pub const DEFAULT_ATTRIBUTES: u32 = 0x0000_0007;

const ATTRIBUTES_LEN: usize = 4;

/// errno for a file shorter than the attribute prefix.
const EINVAL: u64 = 22;

#[derive(Debug, Clone)]
pub struct EfivarfsStore {
    root: PathBuf,
}

impl EfivarfsStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, name: &str, vendor: &Guid) -> PathBuf {
        self.root.join(format!("{name}-{vendor}"))
    }
}

impl VariableStore for EfivarfsStore {
    fn get(&mut self, name: &str, vendor: &Guid, max_len: usize) -> Result<Vec<u8>, VariableError> {
        let path = self.path(name, vendor);
        let mut contents = fs::read(&path).map_err(|e| map_io_error(&e))?;
        trace!("Read {} bytes from {}", contents.len(), path.display());

        if contents.len() < ATTRIBUTES_LEN {
            return Err(VariableError::Other(EINVAL));
        }
        if contents.len() - ATTRIBUTES_LEN > max_len {
            return Err(VariableError::Other(EFI_BUFFER_TOO_SMALL));
        }
        Ok(contents.split_off(ATTRIBUTES_LEN))
    }

    fn set(&mut self, name: &str, vendor: &Guid, data: &[u8]) -> Result<(), VariableError> {
        let path = self.path(name, vendor);
        if data.is_empty() {
            return fs::remove_file(&path).map_err(|e| map_io_error(&e));
        }

        let mut buf = Vec::with_capacity(ATTRIBUTES_LEN + data.len());
        buf.extend_from_slice(&DEFAULT_ATTRIBUTES.to_le_bytes());
        buf.extend_from_slice(data);

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| map_io_error(&e))?;
        file.write_all(&buf).map_err(|e| map_io_error(&e))?;
        trace!("Wrote {} bytes to {}", buf.len(), path.display());
        Ok(())
    }
}

/// `ENOENT` is a missing variable, `EACCES`/`EPERM` is a denied one.
fn map_io_error(err: &io::Error) -> VariableError {
    match err.kind() {
        io::ErrorKind::NotFound => VariableError::NotFound,
        io::ErrorKind::PermissionDenied => VariableError::AccessDenied,
        _ => VariableError::Other(
            err.raw_os_error()
                .and_then(|code| u64::try_from(code).ok())
                .unwrap_or(u64::MAX),
        ),
    }
}
