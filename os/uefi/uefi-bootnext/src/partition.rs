//! Finds the partition this image was loaded from.

use boot_entry::{DecodeError, HardDriveNode};
use uefi::boot;
use uefi::proto::device_path::{DeviceSubType, DeviceType, LoadedImageDevicePath};

#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    #[error("the loaded image device path is unavailable")]
    Protocol(#[source] uefi::Error),
    #[error("the image was not loaded from a hard drive partition")]
    NotOnHardDrive,
    #[error("the hard drive node of the image path is malformed")]
    Malformed(#[from] DecodeError),
}

/// Copies the media / hard drive node out of the loaded image's device path.
///
/// # Errors
/// See [`PartitionError`].
pub fn boot_partition() -> Result<HardDriveNode, PartitionError> {
    let path = boot::open_protocol_exclusive::<LoadedImageDevicePath>(boot::image_handle())
        .map_err(PartitionError::Protocol)?;

    let node = path
        .node_iter()
        .find(|node| {
            node.device_type() == DeviceType::MEDIA
                && node.sub_type() == DeviceSubType::MEDIA_HARD_DRIVE
        })
        .ok_or(PartitionError::NotOnHardDrive)?;

    Ok(HardDriveNode::from_payload(node.data())?)
}
