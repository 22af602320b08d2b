//! Firmware type detection.

use std::fmt;
use std::path::Path;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FirmwareKind {
    Uefi,
    /// Legacy BIOS, or UEFI booted through a compatibility module.
    Bios,
}

/// Created by the kernel only when it was started by UEFI firmware.
pub const SYSFS_EFI_DIR: &str = "/sys/firmware/efi";

impl FirmwareKind {
    /// Checks for the kernel's EFI directory, normally [`SYSFS_EFI_DIR`].
    /// Where efivarfs happens to be mounted plays no part.
    #[must_use]
    pub fn detect(sysfs_efi: &Path) -> Self {
        if sysfs_efi.is_dir() { Self::Uefi } else { Self::Bios }
    }

    /// Detection on the running host.
    #[must_use]
    pub fn of_host() -> Self {
        Self::detect(Path::new(SYSFS_EFI_DIR))
    }
}

impl fmt::Display for FirmwareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uefi => "UEFI",
            Self::Bios => "BIOS",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn detects_efi_directory() {
        let efi = std::env::temp_dir().join(format!("bootnext-fw-{}", std::process::id()));
        fs::create_dir_all(&efi).unwrap();
        assert_eq!(FirmwareKind::detect(&efi), FirmwareKind::Uefi);
        fs::remove_dir_all(&efi).unwrap();
        assert_eq!(FirmwareKind::detect(&efi), FirmwareKind::Bios);
    }

    #[test]
    fn efivars_override_does_not_imply_uefi() {
        let root = std::env::temp_dir().join(format!("bootnext-fw-override-{}", std::process::id()));
        let efivars = root.join("efivars");
        fs::create_dir_all(&efivars).unwrap();
        assert_eq!(FirmwareKind::detect(&root.join("no-efi")), FirmwareKind::Bios);
        fs::remove_dir_all(&root).unwrap();
    }
}
