//! Image load options, as handed to the image by the shell. Parsing lives
//! in [`boot_entry::options`].

use alloc::string::{String, ToString};
use uefi::boot;
use uefi::proto::loaded_image::LoadedImage;

/// The raw load options, or an empty string if there are none.
#[must_use]
pub fn command_line() -> String {
    let Ok(image) = boot::open_protocol_exclusive::<LoadedImage>(boot::image_handle()) else {
        return String::new();
    };
    image
        .load_options_as_cstr16()
        .map(ToString::to_string)
        .unwrap_or_default()
}
