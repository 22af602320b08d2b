//! # Load Option Codec
//!
//! Byte layout of an `EFI_LOAD_OPTION` as stored in a `Boot####` variable:
//!
//! ```text
//! offset  size        field
//! 0       4           Attributes (LE32)
//! 4       2           FilePathListLength (LE16)
//! 6       2*(n+1)     Description (UCS-2, NUL-terminated)
//! ..      FPLL        FilePathList (device path nodes, end-entire last)
//! ..      rest        OptionalData (length implied by the variable size)
//! ```
//!
//! Every field is written explicitly; nothing is reinterpreted from raw
//! memory.

use crate::attributes::LoadOptionAttributes;
use crate::device_path::{self, DevicePathNode, HardDriveNode};
use crate::error::{DecodeError, EncodingError};
use crate::ucs2;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// Size of the `Attributes` and `FilePathListLength` fields.
const FIXED_HEADER_LEN: usize = 6;

/// In-memory form of a boot entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOption {
    pub attributes: LoadOptionAttributes,
    /// UCS-2 code units without the terminating NUL.
    pub description: Vec<u16>,
    pub device_path: Vec<DevicePathNode>,
    /// Opaque trailing bytes; empty when the option carries none.
    pub optional_data: Vec<u8>,
}

impl LoadOption {
    /// Builds an option from a UTF-8 description.
    ///
    /// # Errors
    /// Fails if the description contains NUL or non-UCS-2 characters.
    pub fn new(
        attributes: LoadOptionAttributes,
        description: &str,
        device_path: Vec<DevicePathNode>,
    ) -> Result<Self, EncodingError> {
        Ok(Self {
            attributes,
            description: ucs2::encode_str(description)?,
            device_path,
            optional_data: Vec::new(),
        })
    }

    /// An option that boots `loader_path` from the given partition, with the
    /// two-node-plus-terminator device path firmware boot managers expect.
    ///
    /// # Errors
    /// Fails if the description or the path is not representable.
    pub fn for_partition_file(
        attributes: LoadOptionAttributes,
        description: &str,
        partition: &HardDriveNode,
        loader_path: &str,
    ) -> Result<Self, EncodingError> {
        let device_path = vec![
            DevicePathNode::hard_drive(partition),
            DevicePathNode::file_path(loader_path)?,
            DevicePathNode::end_entire(),
        ];
        Self::new(attributes, description, device_path)
    }

    #[must_use]
    pub fn with_optional_data(mut self, data: Vec<u8>) -> Self {
        self.optional_data = data;
        self
    }

    /// The description as a Rust string.
    #[must_use]
    pub fn description_lossy(&self) -> String {
        ucs2::to_string_lossy(&self.description)
    }

    /// The file path of the first media / file path node, if any.
    #[must_use]
    pub fn loader_path(&self) -> Option<String> {
        self.device_path.iter().find_map(DevicePathNode::as_file_path)
    }

    /// Serializes the option into its firmware byte layout.
    ///
    /// # Errors
    /// Any structural problem with the description or device path.
    pub fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        if self.description.contains(&0) {
            return Err(EncodingError::EmbeddedNul);
        }

        let file_path_list = device_path::encode(&self.device_path)?;
        let file_path_list_length = u16::try_from(file_path_list.len())
            .map_err(|_| EncodingError::FilePathListTooLong(file_path_list.len()))?;

        let mut out = Vec::with_capacity(
            FIXED_HEADER_LEN
                + (self.description.len() + 1) * 2
                + file_path_list.len()
                + self.optional_data.len(),
        );
        out.extend_from_slice(&self.attributes.into_bits().to_le_bytes());
        out.extend_from_slice(&file_path_list_length.to_le_bytes());
        ucs2::write_with_nul(&self.description, &mut out);
        out.extend_from_slice(&file_path_list);
        out.extend_from_slice(&self.optional_data);
        Ok(out)
    }

    /// Parses a `Boot####` payload.
    ///
    /// # Errors
    /// Any [`DecodeError`] for truncated or inconsistent input.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < FIXED_HEADER_LEN {
            return Err(DecodeError::TruncatedHeader);
        }

        let attributes =
            LoadOptionAttributes::from_bits(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
        let file_path_list_length = usize::from(u16::from_le_bytes([bytes[4], bytes[5]]));

        let rest = &bytes[FIXED_HEADER_LEN..];
        let (description, consumed) =
            ucs2::read_until_nul(rest).ok_or(DecodeError::UnterminatedDescription)?;

        let rest = &rest[consumed..];
        if file_path_list_length > rest.len() {
            return Err(DecodeError::FilePathListOutOfBounds {
                declared: file_path_list_length,
                available: rest.len(),
            });
        }
        let (file_path_list, optional_data) = rest.split_at(file_path_list_length);

        Ok(Self {
            attributes,
            description,
            device_path: device_path::decode(file_path_list)?,
            optional_data: optional_data.to_vec(),
        })
    }
}
