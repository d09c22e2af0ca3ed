//! Attached picture frames (`PIC`/`APIC`).

use crate::core::string::Encoding;
use std::fmt::{self, Display, Formatter};

/// An embedded image, decoded from a `PIC` (ID3v2.2) or `APIC` (ID3v2.3/2.4) frame.
#[derive(Clone, Debug)]
pub struct AttachedPictureFrame {
    pub mime: String,
    pub pic_type: PictureType,
    pub desc: String,
    pub picture: Vec<u8>,
}

impl AttachedPictureFrame {
    pub(crate) fn is_empty(&self) -> bool {
        self.picture.is_empty()
    }

    /// Renders the frame body (everything after the frame header) in ID3v2.4 shape.
    /// The encoding byte is always `0` (Latin1), matching this crate's write-side rule
    /// that the text-encoding byte always defaults to Latin1.
    pub(crate) fn render(&self) -> Vec<u8> {
        let mut out = vec![Encoding::Latin1.render_byte()];
        out.extend(crate::core::string::render_terminated(Encoding::Latin1, &self.mime));
        out.push(self.pic_type.encode());
        out.extend(crate::core::string::render_terminated(Encoding::Latin1, &self.desc));
        out.extend(&self.picture);
        out
    }
}

impl Display for AttachedPictureFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "{} [{:?}]", self.mime, self.pic_type]?;
        if !self.desc.is_empty() {
            write![f, " \"{}\"", self.desc]?;
        }
        Ok(())
    }
}

/// The reduced picture-type vocabulary this crate distinguishes: most of the 21 ID3v2
/// picture-type codes collapse into `Unsupported`, which keeps the native numeric code
/// around instead of discarding it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PictureType {
    Generic,
    Front,
    Back,
    Cd,
    Unsupported(u8),
}

impl PictureType {
    pub(crate) fn decode(code: u8) -> Self {
        match code {
            0 => Self::Generic,
            3 => Self::Front,
            4 => Self::Back,
            6 => Self::Cd,
            other => Self::Unsupported(other),
        }
    }

    /// Encodes back to a wire byte. `Generic` and `Unsupported` both round-trip to `0`,
    /// since the native code of an unsupported type isn't writable under this vocabulary.
    pub(crate) fn encode(self) -> u8 {
        match self {
            Self::Generic | Self::Unsupported(_) => 0,
            Self::Front => 3,
            Self::Back => 4,
            Self::Cd => 6,
        }
    }
}

pub(crate) fn mime_from_v22_format(format: [u8; 3]) -> String {
    match &format {
        b"PNG" => String::from("image/png"),
        b"BMP" => String::from("image/bmp"),
        b"GIF" => String::from("image/gif"),
        _ => String::from("image/jpeg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picture_type_roundtrips_known_codes() {
        for code in [0u8, 3, 4, 6] {
            assert_eq!(PictureType::decode(code).encode(), code);
        }
    }

    #[test]
    fn picture_type_unsupported_preserves_native_code_but_writes_zero() {
        let pt = PictureType::decode(0x08);
        assert_eq!(pt, PictureType::Unsupported(0x08));
        assert_eq!(pt.encode(), 0);
    }

    #[test]
    fn v22_format_maps_known_codes_and_defaults_to_jpeg() {
        assert_eq!(mime_from_v22_format(*b"PNG"), "image/png");
        assert_eq!(mime_from_v22_format(*b"GIF"), "image/gif");
        assert_eq!(mime_from_v22_format(*b"XXX"), "image/jpeg");
    }
}
