//! # Image Load Options
//!
//! A UEFI shell passes the command line to an image as its load options,
//! e.g.
//!
//! ```text
//! uefi-bootnext.efi loader=\EFI\Linux\loader.efi first=0x0100 description=Kernel update
//! ```
//!
//! Words without `=` (such as the image name) are ignored. `first` and `last`
//! are hexadecimal, with or without `0x`. `description` takes the remainder
//! of the line.

use crate::manager::BootEntryConfig;
use alloc::string::{String, ToString};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("unknown option '{0}'")]
    Unknown(String),
    #[error("'{0}' is not a hexadecimal slot number")]
    InvalidSlot(String),
}

/// Applies `key=value` options to `config`.
///
/// # Errors
/// On unknown keys or unparsable values. Options before the failing one
/// have already been applied.
pub fn apply(line: &str, config: &mut BootEntryConfig) -> Result<(), OptionsError> {
    let mut rest = line.trim();
    while !rest.is_empty() {
        let (word, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        rest = tail.trim_start();

        let Some((key, value)) = word.split_once('=') else {
            continue;
        };
        match key {
            "loader" => config.loader_path = value.to_string(),
            "first" => config.slots = config.slots.with_first(parse_slot(value)?),
            "last" => config.slots = config.slots.with_last(parse_slot(value)?),
            "description" => {
                let mut description = String::from(value);
                if !rest.is_empty() {
                    description.push(' ');
                    description.push_str(rest.trim_end());
                }
                config.description = description;
                break;
            }
            _ => return Err(OptionsError::Unknown(key.to_string())),
        }
    }
    Ok(())
}

/// Parses a hexadecimal slot number such as `0100` or `0x0100`.
///
/// # Errors
/// [`OptionsError::InvalidSlot`] if the value is not a 16-bit hex number.
pub fn parse_slot(value: &str) -> Result<u16, OptionsError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u16::from_str_radix(digits, 16).map_err(|_| OptionsError::InvalidSlot(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_DESCRIPTION, DEFAULT_LOADER_PATH, HardDriveNode, SlotRange};
    use uefi::guid;

    fn config() -> BootEntryConfig {
        BootEntryConfig::new(HardDriveNode::gpt(
            1,
            2048,
            4096,
            guid!("0fc63daf-8483-4772-8e79-3d69d8477de4"),
        ))
    }

    #[test]
    fn empty_line_keeps_defaults() {
        let mut parsed = config();
        apply("   ", &mut parsed).unwrap();
        assert_eq!(parsed, config());
        assert_eq!(parsed.description, DEFAULT_DESCRIPTION);
        assert_eq!(parsed.loader_path, DEFAULT_LOADER_PATH);
    }

    #[test]
    fn words_without_equals_are_ignored() {
        let mut config = config();
        apply(r"uefi-bootnext.efi -v loader=\EFI\BOOT\grub.efi", &mut config).unwrap();
        assert_eq!(config.loader_path, r"\EFI\BOOT\grub.efi");
        assert_eq!(config.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn slot_bounds_are_hexadecimal() {
        let mut config = config();
        apply("first=0x0100 last=01ff", &mut config).unwrap();
        assert_eq!(config.slots, SlotRange::new(0x0100, 0x01FF));
    }

    #[test]
    fn description_takes_rest_of_line() {
        let mut config = config();
        apply("first=10 description=Kernel  update last=20  ", &mut config).unwrap();
        assert_eq!(config.description, "Kernel  update last=20");
        assert_eq!(config.slots.first(), 0x10);
        assert_eq!(config.slots.last(), SlotRange::default().last());
    }

    #[test]
    fn unknown_key_fails() {
        let mut config = config();
        assert_eq!(
            apply("loader=\\a.efi timeout=5", &mut config),
            Err(OptionsError::Unknown("timeout".to_string()))
        );
        assert_eq!(config.loader_path, "\\a.efi");
    }

    #[test]
    fn invalid_slot_fails() {
        let mut config = config();
        assert_eq!(
            apply("first=0x1g", &mut config),
            Err(OptionsError::InvalidSlot("0x1g".to_string()))
        );
        assert_eq!(parse_slot("10000"), Err(OptionsError::InvalidSlot("10000".to_string())));
        assert_eq!(parse_slot("0XfF"), Ok(0xFF));
    }
}
