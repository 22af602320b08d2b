//! # Device Paths
//!
//! A device path is a packed sequence of variable-length nodes. Each node
//! starts with a 4-byte header:
//!
//! ```text
//! | 0    | 1       | 2..4          | 4..length |
//! | Type | SubType | Length (LE16) | Payload   |
//! ```
//!
//! `Length` covers the header and the payload. A complete path is terminated
//! by the *end entire device path* node (`0x7F`/`0xFF`, length 4).
//!
//! Only the nodes a boot entry for a file on a GPT partition needs get typed
//! helpers ([`HardDriveNode`], file path); every other node survives a
//! decode/encode cycle as opaque payload bytes.

use crate::error::{DecodeError, EncodingError};
use crate::ucs2;
use alloc::string::String;
use alloc::vec::Vec;
use uefi::Guid;
use utils_accessors_derive::Setters;

/// Size of the `Type`/`SubType`/`Length` header of every node.
pub const HEADER_LEN: usize = 4;

/// Node `Type` values.
pub mod device_type {
    pub const HARDWARE: u8 = 0x01;
    pub const ACPI: u8 = 0x02;
    pub const MESSAGING: u8 = 0x03;
    pub const MEDIA: u8 = 0x04;
    pub const BIOS_BOOT_SPECIFICATION: u8 = 0x05;
    pub const END: u8 = 0x7F;
}

/// `SubType` values for [`device_type::MEDIA`].
pub mod media_subtype {
    pub const HARD_DRIVE: u8 = 0x01;
    pub const CD_ROM: u8 = 0x02;
    pub const VENDOR: u8 = 0x03;
    pub const FILE_PATH: u8 = 0x04;
}

/// `SubType` values for [`device_type::END`].
pub mod end_subtype {
    pub const END_INSTANCE: u8 = 0x01;
    pub const END_ENTIRE: u8 = 0xFF;
}

/// One node of a device path.
///
/// `length` is stored separately from `payload` because that is what goes on
/// the wire; [`encode`] refuses nodes where the two disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePathNode {
    pub device_type: u8,
    pub sub_type: u8,
    pub length: u16,
    pub payload: Vec<u8>,
}

impl DevicePathNode {
    /// Builds a node and derives its length from the payload.
    ///
    /// # Errors
    /// [`EncodingError::NodeTooLong`] if header and payload exceed `u16::MAX`.
    pub fn new(device_type: u8, sub_type: u8, payload: Vec<u8>) -> Result<Self, EncodingError> {
        let length = u16::try_from(HEADER_LEN + payload.len())
            .map_err(|_| EncodingError::NodeTooLong(payload.len()))?;
        Ok(Self {
            device_type,
            sub_type,
            length,
            payload,
        })
    }

    /// The *end entire device path* terminator.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn end_entire() -> Self {
        Self {
            device_type: device_type::END,
            sub_type: end_subtype::END_ENTIRE,
            length: HEADER_LEN as u16,
            payload: Vec::new(),
        }
    }

    /// A media / hard drive node for the given partition.
    #[must_use]
    pub fn hard_drive(partition: &HardDriveNode) -> Self {
        Self {
            device_type: device_type::MEDIA,
            sub_type: media_subtype::HARD_DRIVE,
            length: HardDriveNode::NODE_LEN,
            payload: partition.to_payload().to_vec(),
        }
    }

    /// A media / file path node, e.g. `\EFI\Linux\loader.efi`.
    ///
    /// # Errors
    /// Fails if the path is not representable as NUL-free UCS-2 or too long.
    pub fn file_path(path: &str) -> Result<Self, EncodingError> {
        let units = ucs2::encode_str(path)?;
        let mut payload = Vec::with_capacity((units.len() + 1) * 2);
        ucs2::write_with_nul(&units, &mut payload);
        Self::new(device_type::MEDIA, media_subtype::FILE_PATH, payload)
    }

    #[must_use]
    pub const fn is_end_entire(&self) -> bool {
        self.device_type == device_type::END && self.sub_type == end_subtype::END_ENTIRE
    }

    /// Number of bytes this node occupies when serialized.
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Interprets the payload of a media / hard drive node.
    #[must_use]
    pub fn as_hard_drive(&self) -> Option<HardDriveNode> {
        if self.device_type != device_type::MEDIA || self.sub_type != media_subtype::HARD_DRIVE {
            return None;
        }
        HardDriveNode::from_payload(&self.payload).ok()
    }

    /// Interprets the payload of a media / file path node.
    #[must_use]
    pub fn as_file_path(&self) -> Option<String> {
        if self.device_type != device_type::MEDIA || self.sub_type != media_subtype::FILE_PATH {
            return None;
        }
        let (units, _) = ucs2::read_until_nul(&self.payload)?;
        Some(ucs2::to_string_lossy(&units))
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.device_type);
        out.push(self.sub_type);
        out.extend_from_slice(&self.length.to_le_bytes());
        out.extend_from_slice(&self.payload);
    }
}

/// Serializes a complete device path.
///
/// # Errors
/// - [`EncodingError::EmptyDevicePath`] for an empty list,
/// - [`EncodingError::NodeLengthMismatch`] if a declared length is wrong,
/// - [`EncodingError::EarlyEndNode`] if an end-entire node is followed by more nodes,
/// - [`EncodingError::MalformedEndNode`] if an end-entire node carries a payload,
/// - [`EncodingError::MissingEndNode`] if the last node is not end-entire.
pub fn encode(nodes: &[DevicePathNode]) -> Result<Vec<u8>, EncodingError> {
    let Some(last) = nodes.last() else {
        return Err(EncodingError::EmptyDevicePath);
    };

    let mut out = Vec::with_capacity(nodes.iter().map(DevicePathNode::serialized_len).sum());
    for (index, node) in nodes.iter().enumerate() {
        let actual = node.serialized_len();
        if usize::from(node.length) != actual {
            return Err(EncodingError::NodeLengthMismatch {
                index,
                declared: node.length,
                actual,
            });
        }
        if node.is_end_entire() {
            if usize::from(node.length) != HEADER_LEN {
                return Err(EncodingError::MalformedEndNode {
                    index,
                    length: node.length,
                });
            }
            if index + 1 != nodes.len() {
                return Err(EncodingError::EarlyEndNode(index));
            }
        }
        node.write_to(&mut out);
    }

    if !last.is_end_entire() {
        return Err(EncodingError::MissingEndNode);
    }
    Ok(out)
}

/// Parses a complete device path; `bytes` must end exactly after the
/// end-entire node.
///
/// # Errors
/// Any [`DecodeError`] describing the first malformed node.
pub fn decode(bytes: &[u8]) -> Result<Vec<DevicePathNode>, DecodeError> {
    let mut nodes = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let header = bytes
            .get(offset..offset + HEADER_LEN)
            .ok_or(DecodeError::TruncatedNode { offset })?;
        let length = u16::from_le_bytes([header[2], header[3]]);
        let end = offset + usize::from(length);
        if usize::from(length) < HEADER_LEN || end > bytes.len() {
            return Err(DecodeError::InvalidNodeLength { offset, length });
        }

        let node = DevicePathNode {
            device_type: header[0],
            sub_type: header[1],
            length,
            payload: bytes[offset + HEADER_LEN..end].to_vec(),
        };
        let terminal = node.is_end_entire();
        if terminal && usize::from(length) != HEADER_LEN {
            return Err(DecodeError::MalformedEndNode { offset, length });
        }
        nodes.push(node);
        offset = end;

        if terminal {
            if offset != bytes.len() {
                return Err(DecodeError::TrailingNodes);
            }
            return Ok(nodes);
        }
    }

    Err(DecodeError::MissingEndNode)
}

/// Payload of a media / hard drive device path node.
///
/// Start and size are in logical blocks of the underlying device, as found in
/// the GPT partition entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Setters)]
pub struct HardDriveNode {
    pub partition_number: u32,
    pub partition_start: u64,
    pub partition_size: u64,
    pub partition_signature: Guid,
    pub partition_format: u8,
    pub signature_type: u8,
}

impl HardDriveNode {
    pub const PAYLOAD_LEN: usize = 38;
    #[allow(clippy::cast_possible_truncation)]
    pub const NODE_LEN: u16 = (HEADER_LEN + Self::PAYLOAD_LEN) as u16;

    pub const FORMAT_MBR: u8 = 0x01;
    pub const FORMAT_GPT: u8 = 0x02;

    pub const SIGNATURE_NONE: u8 = 0x00;
    pub const SIGNATURE_MBR: u8 = 0x01;
    pub const SIGNATURE_GUID: u8 = 0x02;

    /// A GPT partition identified by its unique partition GUID.
    #[must_use]
    pub const fn gpt(
        partition_number: u32,
        partition_start: u64,
        partition_size: u64,
        partition_signature: Guid,
    ) -> Self {
        Self {
            partition_number,
            partition_start,
            partition_size,
            partition_signature,
            partition_format: Self::FORMAT_GPT,
            signature_type: Self::SIGNATURE_GUID,
        }
    }

    #[must_use]
    pub fn to_payload(&self) -> [u8; Self::PAYLOAD_LEN] {
        let mut out = [0u8; Self::PAYLOAD_LEN];
        out[0..4].copy_from_slice(&self.partition_number.to_le_bytes());
        out[4..12].copy_from_slice(&self.partition_start.to_le_bytes());
        out[12..20].copy_from_slice(&self.partition_size.to_le_bytes());
        out[20..36].copy_from_slice(&self.partition_signature.to_bytes());
        out[36] = self.partition_format;
        out[37] = self.signature_type;
        out
    }

    /// # Errors
    /// [`DecodeError::PayloadLength`] unless the payload is exactly 38 bytes.
    pub fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let payload: &[u8; Self::PAYLOAD_LEN] =
            payload.try_into().map_err(|_| DecodeError::PayloadLength {
                expected: Self::PAYLOAD_LEN,
                actual: payload.len(),
            })?;

        let mut signature = [0u8; 16];
        signature.copy_from_slice(&payload[20..36]);

        Ok(Self {
            partition_number: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
            partition_start: read_u64_le(&payload[4..12]),
            partition_size: read_u64_le(&payload[12..20]),
            partition_signature: Guid::from_bytes(signature),
            partition_format: payload[36],
            signature_type: payload[37],
        })
    }
}

#[inline]
fn read_u64_le(s: &[u8]) -> u64 {
    u64::from_le_bytes([s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use uefi::guid;

    fn esp() -> HardDriveNode {
        HardDriveNode::gpt(
            1,
            2048,
            1_048_576,
            guid!("4c3b1b6e-6a7f-4f1e-9c1b-0d1e2f3a4b5c"),
        )
    }

    #[test]
    fn hard_drive_node_is_42_bytes() {
        let node = DevicePathNode::hard_drive(&esp());
        assert_eq!(node.length, 42);
        assert_eq!(node.serialized_len(), 42);
        assert_eq!(node.as_hard_drive(), Some(esp()));
    }

    #[test]
    fn file_path_node_matches_ucs2_length() {
        // 21 characters + NUL, two bytes each, plus the header.
        let node = DevicePathNode::file_path("\\EFI\\Linux\\loader.efi").unwrap();
        assert_eq!(node.length, 48);
        assert_eq!(node.as_file_path().as_deref(), Some("\\EFI\\Linux\\loader.efi"));
    }

    #[test]
    fn encodes_header_little_endian() {
        let bytes = encode(&[DevicePathNode::hard_drive(&esp()), DevicePathNode::end_entire()]).unwrap();
        assert_eq!(&bytes[0..4], &[0x04, 0x01, 0x2A, 0x00]);
        assert_eq!(&bytes[42..], &[0x7F, 0xFF, 0x04, 0x00]);
    }

    #[test]
    fn rejects_empty_path() {
        assert_eq!(encode(&[]), Err(EncodingError::EmptyDevicePath));
    }

    #[test]
    fn rejects_missing_terminator() {
        let nodes = [DevicePathNode::file_path("\\a.efi").unwrap()];
        assert_eq!(encode(&nodes), Err(EncodingError::MissingEndNode));
    }

    #[test]
    fn rejects_terminator_in_the_middle() {
        let nodes = [
            DevicePathNode::end_entire(),
            DevicePathNode::file_path("\\a.efi").unwrap(),
            DevicePathNode::end_entire(),
        ];
        assert_eq!(encode(&nodes), Err(EncodingError::EarlyEndNode(0)));
    }

    #[test]
    fn rejects_terminator_with_payload() {
        let nodes = [
            DevicePathNode::file_path("\\a.efi").unwrap(),
            DevicePathNode::new(device_type::END, end_subtype::END_ENTIRE, vec![0xAA, 0xBB]).unwrap(),
        ];
        assert_eq!(
            encode(&nodes),
            Err(EncodingError::MalformedEndNode { index: 1, length: 6 })
        );
    }

    #[test]
    fn rejects_wrong_declared_length() {
        let mut node = DevicePathNode::hard_drive(&esp());
        node.length = 40;
        assert_eq!(
            encode(&[node, DevicePathNode::end_entire()]),
            Err(EncodingError::NodeLengthMismatch {
                index: 0,
                declared: 40,
                actual: 42
            })
        );
    }

    #[test]
    fn decode_keeps_unknown_nodes_opaque() {
        let vendor = DevicePathNode::new(device_type::HARDWARE, 0x04, vec![1, 2, 3]).unwrap();
        let nodes = vec![vendor, DevicePathNode::end_entire()];
        let bytes = encode(&nodes).unwrap();
        assert_eq!(decode(&bytes).unwrap(), nodes);
    }

    #[test]
    fn decode_rejects_short_node_length() {
        assert_eq!(
            decode(&[0x04, 0x04, 0x02, 0x00]),
            Err(DecodeError::InvalidNodeLength { offset: 0, length: 2 })
        );
    }

    #[test]
    fn decode_rejects_data_after_terminator() {
        assert_eq!(
            decode(&[0x7F, 0xFF, 0x04, 0x00, 0x7F]),
            Err(DecodeError::TrailingNodes)
        );
    }

    #[test]
    fn decode_rejects_terminator_with_payload() {
        assert_eq!(
            decode(&[0x7F, 0xFF, 0x06, 0x00, 0xAA, 0xBB]),
            Err(DecodeError::MalformedEndNode { offset: 0, length: 6 })
        );
    }

    #[test]
    fn decode_requires_terminator() {
        let bytes = encode(&[
            DevicePathNode::file_path("\\a.efi").unwrap(),
            DevicePathNode::end_entire(),
        ])
        .unwrap();
        let without_end = &bytes[..bytes.len() - HEADER_LEN];
        assert_eq!(decode(without_end), Err(DecodeError::MissingEndNode));
    }

    #[test]
    fn setters_update_partition_fields() {
        let node = esp().with_partition_number(3).with_partition_size(4096);
        assert_eq!(node.partition_number, 3);
        assert_eq!(node.partition_size, 4096);
        assert_eq!(node.partition_format, HardDriveNode::FORMAT_GPT);
    }
}
