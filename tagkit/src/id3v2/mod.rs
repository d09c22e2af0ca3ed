//! ID3v2 tag reading and writing (versions 2.2, 2.3, 2.4).
//!
//! Frame parsing and rendering live under [`frames`]; this module owns the tag-level
//! surface: locating a tag in a file, resolving its frames into semantic fields, and
//! rendering a tag back out (always in ID3v2.4 shape).
pub mod frame_id;
pub mod frames;
pub(crate) mod genre;
pub mod header;
mod popm;
mod syncdata;

pub use frame_id::SemanticField;
pub use frames::{AttachedPictureFrame, PictureType};
pub use header::{
    ExtendedHeader, ImageEncodingRestriction, ImageSizeRestriction, Restrictions,
    TagSizeRestriction, TextEncodingRestriction, TextSizeRestriction, Version,
};

use crate::core::io::BufStream;
use frames::{FieldValue, ParsedFrame};
use header::TagHeader;
use indexmap::IndexMap;
use log::{error, warn};
use std::error;
use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub type ParseResult<T> = Result<T, ParseError>;
pub type SaveResult<T> = Result<T, SaveError>;

/// Errors surfaced while locating or decoding a tag.
///
/// There is no "tag absent" variant: a file with no ID3v2 tag is a clean `Ok(None)`
/// result from [`Tag::read`], not a failure.
#[derive(Debug)]
pub enum ParseError {
    /// The 10-byte header didn't start with `ID3`.
    NotFound,
    /// The header declared a version this crate doesn't read.
    Unsupported,
    /// A frame, header, or extended header field was structurally invalid.
    MalformedData,
    Io(io::Error),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::NotFound => write![f, "no id3v2 tag found"],
            Self::Unsupported => write![f, "unsupported id3v2 version"],
            Self::MalformedData => write![f, "malformed id3v2 data"],
            Self::Io(err) => write![f, "io error: {}", err],
        }
    }
}

impl error::Error for ParseError {}

impl From<io::Error> for ParseError {
    fn from(err: io::Error) -> Self {
        ParseError::Io(err)
    }
}

/// Errors surfaced while rendering or saving a tag.
#[derive(Debug)]
pub enum SaveError {
    /// The rendered tag would not fit in a 28-bit synch-safe size field.
    TooLarge,
    Io(io::Error),
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::TooLarge => write![f, "rendered tag exceeds the maximum id3v2 tag size"],
            Self::Io(err) => write![f, "io error: {}", err],
        }
    }
}

impl error::Error for SaveError {}

impl From<io::Error> for SaveError {
    fn from(err: io::Error) -> Self {
        SaveError::Io(err)
    }
}

/// Options controlling how many frames [`Tag::read`] keeps around.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseOptions {
    /// When `true`, frames with no semantic-field mapping are kept as additional fields
    /// instead of being dropped. Off by default: only resolved fields matter unless a
    /// caller asks for the rest.
    pub read_all_meta_frames: bool,
}

/// Options controlling how [`Tag::render`] writes a tag back out.
#[derive(Clone, Copy, Debug)]
pub struct WriteOptions {
    /// Reproduce the POPM rating-byte clamp bug instead of clamping correctly. See
    /// [`popm::compute_rating_byte`]. Off by default.
    pub popm_bug_compat: bool,
    /// Log (rather than silently ignore) when the rendered tag would violate a
    /// restriction declared by the extended header that was read. This crate never
    /// refuses to write an oversized tag; it only warns.
    pub enforce_restrictions: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            popm_bug_compat: false,
            enforce_restrictions: false,
        }
    }
}

/// A frame kept verbatim because no semantic field in [`SemanticField`] claims it.
#[derive(Clone, Debug)]
pub struct AdditionalField {
    pub frame_id: String,
    pub value: String,
}

/// An ID3v2 tag: the header it was read with, its resolved semantic fields, any
/// unresolved frames kept alongside them, and its attached pictures.
pub struct Tag {
    header: TagHeader,
    fields: IndexMap<SemanticField, String>,
    additional_fields: IndexMap<String, AdditionalField>,
    pictures: Vec<AttachedPictureFrame>,
    pub write_options: WriteOptions,
}

impl Tag {
    /// Opens `path` and reads whatever ID3v2 tag sits at its start, if any.
    pub fn open<P: AsRef<Path>>(path: P, opts: ParseOptions) -> ParseResult<Option<Self>> {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Self::read(&data, file_len, opts)
    }

    /// Reads a tag from the start of `data`. `file_len` is the full size of the file
    /// `data` was read from, used to catch a tag header that lies about its own size.
    pub fn read(data: &[u8], file_len: u64, opts: ParseOptions) -> ParseResult<Option<Self>> {
        if data.len() < 10 {
            return Ok(None);
        }

        let mut raw = [0u8; 10];
        raw.copy_from_slice(&data[0..10]);

        let mut header_stream = BufStream::new(&data[10..]);
        let header = match TagHeader::parse(raw, &mut header_stream) {
            Ok(header) => header,
            Err(ParseError::NotFound) => return Ok(None),
            Err(ParseError::Unsupported) => {
                error!("id3v2 header declared an unsupported version, returning an empty tag");
                return Ok(Some(Self::empty(TagHeader::with_version(Version::V24))));
            }
            Err(err) => return Err(err),
        };

        let footer_len: u64 = if header.flags().footer { 10 } else { 0 };
        let total_len = 10u64 + u64::from(header.size()) + footer_len;

        if total_len > file_len {
            warn!("id3v2 header declares a tag larger than the file itself, treating it as empty");
            return Ok(Some(Self::empty(header)));
        }

        let ext_len = header_stream.pos();
        let body_len = (header.size() as usize).saturating_sub(ext_len);

        let mut body = match header_stream.slice_stream(body_len) {
            Ok(body) => body,
            Err(_) => return Ok(Some(Self::empty(header))),
        };

        let mut fields = IndexMap::new();
        let mut additional_fields = IndexMap::new();
        let mut pictures = Vec::new();

        for item in frames::parse_tag_frames(&header, &mut body) {
            match item {
                ParsedFrame::Field(FieldValue { frame_id, text }) => {
                    route_field(header.version(), frame_id, text, opts.read_all_meta_frames, &mut fields, &mut additional_fields);
                }
                ParsedFrame::Picture(picture) => {
                    if !picture.is_empty() {
                        pictures.push(picture);
                    }
                }
            }
        }

        Ok(Some(Self {
            header,
            fields,
            additional_fields,
            pictures,
            write_options: WriteOptions::default(),
        }))
    }

    fn empty(header: TagHeader) -> Self {
        Self {
            header,
            fields: IndexMap::new(),
            additional_fields: IndexMap::new(),
            pictures: Vec::new(),
            write_options: WriteOptions::default(),
        }
    }

    pub fn version(&self) -> Version {
        self.header.version()
    }

    /// The total on-disk size of the tag this was read from (10-byte header plus body),
    /// useful as the `old_tag_size` argument to [`Tag::save`].
    pub fn size(&self) -> u64 {
        10 + u64::from(self.header.size())
    }

    pub fn field(&self, field: SemanticField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn set_field(&mut self, field: SemanticField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub fn remove_field(&mut self, field: SemanticField) {
        self.fields.shift_remove(&field);
    }

    /// Sets the rating field from a `0..=5` star count, applying the POPM write-scale
    /// conversion at write time rather than storing the scaled byte directly.
    pub fn set_rating(&mut self, stars: &str) {
        self.fields.insert(SemanticField::Rating, stars.to_string());
    }

    pub fn additional_fields(&self) -> impl Iterator<Item = &AdditionalField> {
        self.additional_fields.values()
    }

    pub fn pictures(&self) -> &[AttachedPictureFrame] {
        &self.pictures
    }

    pub fn add_picture(&mut self, picture: AttachedPictureFrame) {
        self.pictures.push(picture);
    }

    /// Renders this tag as a complete ID3v2.4 byte sequence, header included.
    pub fn render(&self) -> SaveResult<Vec<u8>> {
        let mut out = self.header.render();

        for (field, code) in frame_id::write_order() {
            if let Some(value) = self.fields.get(&field) {
                out.extend(frames::emit_field_frame(&self.header, code, value, &self.write_options));
            }
        }

        for additional in self.additional_fields.values() {
            out.extend(frames::emit_field_frame(&self.header, &additional.frame_id, &additional.value, &self.write_options));
        }

        for picture in &self.pictures {
            out.extend(frames::emit_picture_frame(&self.header, picture));
        }

        let tag_size = (out.len() - 10) as u32;

        if tag_size >= (1 << 28) {
            return Err(SaveError::TooLarge);
        }

        if self.write_options.enforce_restrictions {
            if let Some(max) = self.header.extended().and_then(|e| e.max_tag_size()) {
                if tag_size > max {
                    warn!("rendered tag is {} bytes, exceeding the declared restriction of {} bytes; writing it anyway", tag_size, max);
                }
            }
        }

        out[6..10].copy_from_slice(&syncdata::from_u28(tag_size));

        Ok(out)
    }

    /// Writes this tag to `path`, replacing whatever occupied the first `old_tag_size`
    /// bytes of the file (typically [`Tag::size`] of the tag that was read, or `0` for a
    /// file with no existing tag).
    pub fn save<P: AsRef<Path>>(&self, path: P, old_tag_size: u64) -> SaveResult<()> {
        let data = self.render()?;
        crate::core::io::write_replaced(path, &data, old_tag_size)?;
        Ok(())
    }
}

/// Routes one parsed frame into either the semantic-field map or the additional-field
/// map: an ID3v2.2 frame id is looked up in the v2.2 table, everything else in the
/// shared v2.3/2.4 table, and the genre field is always run through genre-code
/// extraction regardless of which frame id produced it.
fn route_field(
    version: Version,
    frame_id: String,
    text: String,
    read_all_meta_frames: bool,
    fields: &mut IndexMap<SemanticField, String>,
    additional_fields: &mut IndexMap<String, AdditionalField>,
) {
    let upper = frame_id.to_uppercase();

    match frame_id::field_for(version, &upper) {
        Some(SemanticField::Genre) => {
            fields.insert(SemanticField::Genre, genre::extract(&text));
        }
        Some(field) => {
            fields.insert(field, text);
        }
        None => {
            if read_all_meta_frames {
                additional_fields.insert(upper.clone(), AdditionalField { frame_id: upper, value: text });
            }
        }
    }
}
