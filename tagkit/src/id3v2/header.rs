//! Tag headers, versioning, and the extended header / restrictions block.
use crate::core::io::BufStream;
use crate::id3v2::syncdata;
use crate::id3v2::{ParseError, ParseResult};
use log::{error, warn};
use std::convert::TryInto;
use std::fmt::{self, Display, Formatter};

const ID: &[u8] = b"ID3";

/// The version an ID3v2 tag was read as. Includes ID3v2.2, since it's readable even
/// though this crate never writes it back out.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Version {
    V22,
    V23,
    V24,
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::V22 => write![f, "ID3v2.2"],
            Self::V23 => write![f, "ID3v2.3"],
            Self::V24 => write![f, "ID3v2.4"],
        }
    }
}

#[derive(Clone, Debug)]
pub struct TagHeader {
    version: Version,
    tag_size: u32,
    flags: TagFlags,
    extended: Option<ExtendedHeader>,
}

impl TagHeader {
    /// Parses the 10-byte base header and, if present, the extended header that follows it.
    /// `stream` must be positioned immediately after the 10 base header bytes on return.
    pub(crate) fn parse(raw: [u8; 10], stream: &mut BufStream) -> ParseResult<Self> {
        if &raw[0..3] != ID {
            return Err(ParseError::NotFound);
        }

        let version = match (raw[3], raw[4]) {
            (2, _) => Version::V22,
            (3, _) => Version::V23,
            (4, _) => Version::V24,
            (m, _) => {
                error!("id3v2.{} is not a supported version", m);
                return Err(ParseError::Unsupported);
            }
        };

        let raw_flags = raw[5];

        let unused_mask = match version {
            Version::V22 => 0x3F,
            Version::V23 => 0x1F,
            Version::V24 => 0x0F,
        };

        if raw_flags & unused_mask != 0 {
            warn!("unused flag bits are set on the tag header, ignoring them");
        }

        let flags = TagFlags {
            unsync: raw_flags & 0x80 != 0,
            extended: version != Version::V22 && raw_flags & 0x40 != 0,
            experimental: raw_flags & 0x20 != 0,
            footer: raw_flags & 0x10 != 0,
        };

        let tag_size = syncdata::to_u28(raw[6..10].try_into().unwrap());

        let extended = if flags.extended {
            Some(ExtendedHeader::parse(stream, version)?)
        } else {
            None
        };

        Ok(Self {
            version,
            tag_size,
            flags,
            extended,
        })
    }

    /// Renders the base header plus any extended header, always as ID3v2.4. The returned
    /// tag-size field is a placeholder (`0`) that the caller must backfill once the frame
    /// body has been rendered.
    pub(crate) fn render(&self) -> Vec<u8> {
        let mut out = vec![b'I', b'D', b'3', 4, 0, 0, 0, 0, 0, 0];

        out[5] |= u8::from(self.flags.unsync) * 0x80;
        out[5] |= u8::from(self.extended.is_some()) * 0x40;
        out[5] |= u8::from(self.flags.experimental) * 0x20;

        if let Some(extended) = &self.extended {
            out.extend(extended.render());
        }

        out
    }

    pub(crate) fn with_version(version: Version) -> Self {
        Self {
            version,
            tag_size: 0,
            flags: TagFlags::default(),
            extended: None,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn size(&self) -> u32 {
        self.tag_size
    }

    pub(crate) fn flags(&self) -> TagFlags {
        self.flags
    }

    pub fn extended(&self) -> Option<&ExtendedHeader> {
        self.extended.as_ref()
    }
}

#[derive(Default, Clone, Copy, Debug)]
pub(crate) struct TagFlags {
    pub unsync: bool,
    pub extended: bool,
    pub experimental: bool,
    pub footer: bool,
}

#[derive(Default, Debug, Clone)]
pub struct ExtendedHeader {
    pub crc32: Option<u32>,
    pub is_update: bool,
    pub restrictions: Option<Restrictions>,
}

impl ExtendedHeader {
    fn parse(stream: &mut BufStream, version: Version) -> ParseResult<Self> {
        // The extended header's size field is synch-safe for any version beyond
        // ID3v2.2, and everything after it has the same shape: a 1-byte flag count
        // (always 1) followed by the flags byte.
        if version == Version::V22 {
            return Err(ParseError::Unsupported);
        }

        let size = syncdata::to_u28(stream.read_array()?);

        if size == 0 {
            return Err(ParseError::MalformedData);
        }

        if stream.read_u8()? != 1 {
            warn!("extended header flag count was not 1");
        }

        let flags = stream.read_u8()?;
        let mut header = ExtendedHeader::default();

        if flags & 0x40 != 0 {
            if stream.read_u8()? != 0 {
                return Err(ParseError::MalformedData);
            }
            header.is_update = true;
        }

        if flags & 0x20 != 0 {
            if stream.read_u8()? != 5 {
                return Err(ParseError::MalformedData);
            }
            header.crc32 = Some(syncdata::to_u35(stream.read_array()?));
        }

        if flags & 0x10 != 0 {
            if stream.read_u8()? != 1 {
                return Err(ParseError::MalformedData);
            }

            let restrictions = stream.read_u8()?;

            header.restrictions = Some(Restrictions {
                tag_size: match restrictions >> 6 {
                    0 => TagSizeRestriction::Max128Frames1Mb,
                    1 => TagSizeRestriction::Max64Frames128Kb,
                    2 => TagSizeRestriction::Max32Frames40Kb,
                    _ => TagSizeRestriction::Max32Frames4Kb,
                },
                text_encoding: match (restrictions & 0x20) >> 5 {
                    0 => TextEncodingRestriction::None,
                    _ => TextEncodingRestriction::Latin1OrUtf8,
                },
                text_size: match (restrictions & 0x18) >> 3 {
                    0 => TextSizeRestriction::None,
                    1 => TextSizeRestriction::LessThan1024Chars,
                    2 => TextSizeRestriction::LessThan128Chars,
                    _ => TextSizeRestriction::LessThan30Chars,
                },
                image_encoding: match (restrictions & 0x4) >> 2 {
                    0 => ImageEncodingRestriction::None,
                    _ => ImageEncodingRestriction::OnlyPngOrJpeg,
                },
                image_size: match restrictions & 0x3 {
                    0 => ImageSizeRestriction::None,
                    1 => ImageSizeRestriction::LessThan256x256,
                    2 => ImageSizeRestriction::LessThan64x64,
                    _ => ImageSizeRestriction::Exactly64x64,
                },
            });
        }

        Ok(header)
    }

    fn render(&self) -> Vec<u8> {
        // Always rendered in ID3v2.4 shape, mirroring the informational "update" flag
        // and restrictions of the tag we read, plus a verbatim copy of the CRC.
        let mut data = vec![0, 0, 0, 6, 1, 0];

        if self.is_update {
            data[3] += 1;
            data[5] |= 0x40;
            data.push(0);
        }

        if let Some(crc) = self.crc32 {
            data[3] += 6;
            data[5] |= 0x20;
            data.push(5);
            data.extend(syncdata::from_u35(crc));
        }

        if let Some(restrictions) = self.restrictions {
            data[3] += 2;
            data[5] |= 0x10;
            data.push(1);

            let mut bits = 0;
            bits |= (restrictions.tag_size as u8) << 6;
            bits |= (restrictions.text_encoding as u8) << 5;
            bits |= (restrictions.text_size as u8) << 3;
            bits |= (restrictions.image_encoding as u8) << 2;
            bits |= restrictions.image_size as u8;
            data.push(bits);
        }

        let size = (data.len() - 4) as u32;
        data[0..4].copy_from_slice(&syncdata::from_u28(size));

        data
    }

    /// The maximum tag size (in bytes) implied by `restrictions`, or `None` if unrestricted.
    pub(crate) fn max_tag_size(&self) -> Option<u32> {
        self.restrictions.map(|r| {
            let kb = match r.tag_size {
                TagSizeRestriction::Max128Frames1Mb => 1024,
                TagSizeRestriction::Max64Frames128Kb => 128,
                TagSizeRestriction::Max32Frames40Kb => 40,
                TagSizeRestriction::Max32Frames4Kb => 4,
            };
            kb * 1024
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Restrictions {
    pub tag_size: TagSizeRestriction,
    pub text_encoding: TextEncodingRestriction,
    pub text_size: TextSizeRestriction,
    pub image_encoding: ImageEncodingRestriction,
    pub image_size: ImageSizeRestriction,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TagSizeRestriction {
    Max128Frames1Mb = 0,
    Max64Frames128Kb = 1,
    Max32Frames40Kb = 2,
    Max32Frames4Kb = 3,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextEncodingRestriction {
    None = 0,
    Latin1OrUtf8 = 1,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextSizeRestriction {
    None = 0,
    LessThan1024Chars = 1,
    LessThan128Chars = 2,
    LessThan30Chars = 3,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageEncodingRestriction {
    None = 0,
    OnlyPngOrJpeg = 1,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageSizeRestriction {
    None = 0,
    LessThan256x256 = 1,
    LessThan64x64 = 2,
    Exactly64x64 = 3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_v3_tag_header() {
        let data = *b"\x49\x44\x33\x03\x00\xA0\x00\x08\x49\x30";
        let mut stream = BufStream::new(&[]);
        let header = TagHeader::parse(data, &mut stream).unwrap();

        assert_eq!(header.size(), 140464);
        assert_eq!(header.version(), Version::V23);
        assert!(header.flags().unsync);
        assert!(!header.flags().extended);
        assert!(header.flags().experimental);
    }

    #[test]
    fn parse_v4_tag_header_with_extended() {
        let ext = b"\x00\x00\x00\x06\x01\x00";
        let data = *b"\x49\x44\x33\x04\x00\x40\x00\x08\x49\x30";
        let mut stream = BufStream::new(ext);
        let header = TagHeader::parse(data, &mut stream).unwrap();

        assert_eq!(header.version(), Version::V24);
        assert!(header.flags().extended);
        assert!(header.extended().is_some());
    }

    #[test]
    fn rejects_bad_magic() {
        let data = *b"\x00\x00\x00\x04\x00\x00\x00\x08\x49\x30";
        let mut stream = BufStream::new(&[]);
        assert!(matches!(
            TagHeader::parse(data, &mut stream),
            Err(ParseError::NotFound)
        ));
    }

    #[test]
    fn rejects_unsupported_version() {
        let data = *b"\x49\x44\x33\x05\x00\x00\x00\x08\x49\x30";
        let mut stream = BufStream::new(&[]);
        assert!(matches!(
            TagHeader::parse(data, &mut stream),
            Err(ParseError::Unsupported)
        ));
    }

    #[test]
    fn v4_extended_header_roundtrip() {
        let header = ExtendedHeader {
            crc32: Some(0x7BCDEF16),
            is_update: true,
            restrictions: Some(Restrictions {
                tag_size: TagSizeRestriction::Max32Frames40Kb,
                text_encoding: TextEncodingRestriction::Latin1OrUtf8,
                text_size: TextSizeRestriction::LessThan128Chars,
                image_encoding: ImageEncodingRestriction::OnlyPngOrJpeg,
                image_size: ImageSizeRestriction::None,
            }),
        };

        let rendered = header.render();
        let mut stream = BufStream::new(&rendered);
        let reparsed = ExtendedHeader::parse(&mut stream, Version::V24).unwrap();

        assert_eq!(reparsed.crc32, header.crc32);
        assert_eq!(reparsed.is_update, header.is_update);
        assert_eq!(reparsed.restrictions, header.restrictions);
    }

    #[test]
    fn v3_extended_header_uses_synchsafe_size_and_crc() {
        let mut ext = Vec::new();
        ext.extend_from_slice(&syncdata::from_u28(6)); // extended header size
        ext.push(1); // flag count
        ext.push(0x20); // CRC present
        ext.push(5); // CRC field length
        ext.extend_from_slice(&syncdata::from_u35(0xABCDE));

        let mut stream = BufStream::new(&ext);
        let header = ExtendedHeader::parse(&mut stream, Version::V23).unwrap();

        assert_eq!(header.crc32, Some(0xABCDE));
        assert!(!header.is_update);
        assert_eq!(header.restrictions, None);
    }
}
