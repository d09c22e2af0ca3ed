//! Frame parsing and rendering.
//!
//! Every frame is parsed as either a short text-style field or an attached picture; which
//! one depends only on how much payload is left once the encoding byte (and, for `COMM`,
//! the language and description) have been consumed. There is no per-frame-type struct
//! zoo here: `TIT2`, `TXXX`, `POPM` and a hundred other codes all reduce to the same
//! `FieldValue` shape on the way out of the parser.
mod lang;
mod picture;

pub use picture::{AttachedPictureFrame, PictureType};

use crate::core::io::BufStream;
use crate::core::string::{self, Encoding};
use crate::id3v2::header::{TagHeader, Version};
use crate::id3v2::{frame_id, ParseError, WriteOptions};
use lang::Language;
use log::warn;

/// Frames with fewer than this many bytes of remaining payload are read as text; frames
/// with this many or more are read as pictures. Heuristic, not a real ID3v2 rule, but it's
/// what this crate's frame loop has always used and changing it would break compatibility
/// with tags this crate has already written.
const PICTURE_THRESHOLD: usize = 500;

/// One frame's worth of parsed content.
pub(crate) enum ParsedFrame {
    Field(FieldValue),
    Picture(AttachedPictureFrame),
}

/// The unified output of every non-picture frame: a frame id (used for semantic-field
/// lookup) paired with the single string value the frame carries.
pub(crate) struct FieldValue {
    pub frame_id: String,
    pub text: String,
}

/// Walks `body` until it's exhausted or a malformed frame id is hit, returning every frame
/// successfully parsed along the way.
pub(crate) fn parse_tag_frames(tag_header: &TagHeader, body: &mut BufStream) -> Vec<ParsedFrame> {
    let mut frames = Vec::new();

    while body.remaining() >= min_frame_header_len(tag_header.version()) {
        match parse_one_frame(tag_header.version(), body) {
            Ok(Some(frame)) => frames.push(frame),
            Ok(None) => {}
            Err(_) => break,
        }
    }

    frames
}

fn min_frame_header_len(version: Version) -> usize {
    match version {
        Version::V22 => 6,
        Version::V23 | Version::V24 => 10,
    }
}

fn parse_one_frame(version: Version, stream: &mut BufStream) -> Result<Option<ParsedFrame>, ParseError> {
    let id_len = if version == Version::V22 { 3 } else { 4 };
    let id_bytes = stream.slice(id_len)?;

    let raw_id = std::str::from_utf8(id_bytes)
        .ok()
        .filter(|s| s.bytes().next().is_some_and(|b| b.is_ascii_uppercase()))
        .map(str::to_string);

    let raw_id = match raw_id {
        Some(id) => id,
        None => {
            warn!("encountered an invalid frame id, stopping the frame loop");
            return Err(ParseError::MalformedData);
        }
    };

    let size = match version {
        Version::V22 => {
            let bytes = stream.slice(3)?;
            (usize::from(bytes[0]) << 16) | (usize::from(bytes[1]) << 8) | usize::from(bytes[2])
        }
        Version::V23 => stream.read_be_u32()? as usize,
        Version::V24 => super::syncdata::to_u28(stream.read_array()?) as usize,
    };

    let mut data_length_indicator = false;
    if version != Version::V22 {
        let flags = stream.read_be_u16()?;
        data_length_indicator = flags & 0x0001 != 0;
    }

    let mut frame = stream.slice_stream(size)?;

    if data_length_indicator {
        frame.skip(4).ok();
    }

    if frame.is_empty() {
        return Ok(None);
    }

    let encoding_byte = frame.read_u8()?;
    let mut encoding = match Encoding::parse(encoding_byte) {
        Some(enc) => enc,
        None => {
            frame.rewind(1).ok();
            Encoding::Latin1
        }
    };

    let is_comm = raw_id == "COM" || raw_id == "COMM";
    let is_pop = raw_id == "POP" || raw_id == "POPM";
    let is_txx = raw_id == "TXX" || raw_id == "TXXX";

    if is_comm {
        let lang_bytes = frame.read_array::<3>().unwrap_or(*b"xxx");
        let _lang = Language::try_new(lang_bytes).unwrap_or_default();

        if version != Version::V22 && encoding == Encoding::Utf16 {
            if let Some(bom_encoding) = sniff_bom(&frame) {
                frame.skip(2).ok();
                encoding = bom_encoding;
            } else {
                encoding = Encoding::Utf16Be;
            }
        }

        let _desc = string::read_terminated(encoding, &mut frame);
    } else if version != Version::V22 && encoding == Encoding::Utf16 {
        if let Some(bom_encoding) = sniff_bom(&frame) {
            frame.skip(2).ok();
            encoding = bom_encoding;
        }
    }

    let original_encoding_byte = encoding_byte;
    let remaining = frame.remaining();

    if remaining == 0 {
        return Ok(None);
    }

    if remaining >= PICTURE_THRESHOLD {
        let picture = parse_picture(version, original_encoding_byte, encoding, &mut frame)?;
        return Ok(Some(ParsedFrame::Picture(picture)));
    }

    if is_pop {
        let _email = string::read_terminated(Encoding::Latin1, &mut frame);
        let rating = frame.read_u8().unwrap_or(0);
        return Ok(Some(ParsedFrame::Field(FieldValue {
            frame_id: raw_id,
            text: rating.to_string(),
        })));
    }

    if is_txx {
        let raw = strip_trailing_nuls(frame.take_rest(), encoding.nul_size());
        let mut sub = BufStream::new(raw);
        let desc = string::read_terminated(encoding, &mut sub);
        let value = string::read(encoding, &mut sub);

        return Ok(Some(ParsedFrame::Field(FieldValue {
            frame_id: desc,
            text: value,
        })));
    }

    let raw = strip_trailing_nuls(frame.take_rest(), encoding.nul_size());
    let mut sub = BufStream::new(raw);
    let text = string::read(encoding, &mut sub);

    Ok(Some(ParsedFrame::Field(FieldValue {
        frame_id: raw_id,
        text,
    })))
}

fn parse_picture(
    version: Version,
    original_encoding_byte: u8,
    mut encoding: Encoding,
    frame: &mut BufStream,
) -> Result<AttachedPictureFrame, ParseError> {
    // The generic UTF-16 BOM sniff above runs before we know whether this frame turns out
    // to be a picture, so an encoding-1 picture frame has already had a (possibly bogus)
    // BOM stripped out from under its mime-type field. Back off one byte to compensate;
    // this doesn't fully undo that early read, which is a known wrinkle in this parser
    // rather than a deliberate design.
    if version != Version::V22 && original_encoding_byte == 1 {
        frame.rewind(1).ok();
    }

    let mime = if version == Version::V22 {
        let format = frame.read_array::<3>()?;
        picture::mime_from_v22_format(format)
    } else {
        string::read_terminated(Encoding::Latin1, frame)
    };

    let pic_type = PictureType::decode(frame.read_u8()?);

    if version != Version::V22 && encoding == Encoding::Utf16 {
        if let Some(bom_encoding) = sniff_bom(frame) {
            frame.skip(2).ok();
            encoding = bom_encoding;
        } else {
            encoding = Encoding::Utf16Be;
        }
    }

    let desc = string::read_terminated(encoding, frame);
    let picture = frame.take_rest().to_vec();

    Ok(AttachedPictureFrame {
        mime,
        pic_type,
        desc,
        picture,
    })
}

/// Looks at (without consuming) the next two bytes for a UTF-16 byte-order mark.
fn sniff_bom(stream: &BufStream) -> Option<Encoding> {
    match stream.peek(0..2).ok()? {
        [0xFF, 0xFE] => Some(Encoding::Utf16Le),
        [0xFE, 0xFF] => Some(Encoding::Utf16Be),
        _ => None,
    }
}

fn strip_trailing_nuls(data: &[u8], width: usize) -> &[u8] {
    let mut end = data.len();

    while end >= width && data[end - width..end].iter().all(|&b| b == 0) {
        end -= width;
    }

    &data[..end]
}

/// Emits a field as a single ID3v2.4 frame. `code` is either a known write code (from the
/// semantic-field registry) or an arbitrary additional-field id; whichever it is, an
/// unrecognized code gets wrapped in a `TXXX` frame carrying `code` as its description,
/// exactly as ID3v2.2 codes with no ID3v2.4 analogue do.
pub(crate) fn emit_field_frame(tag_header: &TagHeader, code: &str, value: &str, options: &WriteOptions) -> Vec<u8> {
    let code = code.to_uppercase();
    let unsync = tag_header.flags().unsync;

    if code == "POPM" || code == "POP" {
        return render_text_frame_header("POPM", render_popm_body(value, options), unsync);
    }

    if code == "COMM" || code == "COM" {
        return render_text_frame_header("COMM", render_comm_body(value), unsync);
    }

    if frame_id::is_known_write_code(&code) && code != "TXXX" {
        return render_text_frame_header(&code, render_text_body(value), unsync);
    }

    render_text_frame_header("TXXX", render_txxx_body(&code, value), unsync)
}

pub(crate) fn emit_picture_frame(tag_header: &TagHeader, picture: &AttachedPictureFrame) -> Vec<u8> {
    render_picture_frame_header(picture.render(), tag_header.flags().unsync)
}

fn render_text_body(value: &str) -> Vec<u8> {
    let mut out = vec![Encoding::Latin1.render_byte()];
    out.extend(string::render(Encoding::Latin1, value));
    out
}

fn render_txxx_body(desc: &str, value: &str) -> Vec<u8> {
    let mut out = vec![Encoding::Latin1.render_byte()];
    out.extend(string::render_terminated(Encoding::Latin1, desc));
    out.extend(string::render(Encoding::Latin1, value));
    out
}

fn render_comm_body(value: &str) -> Vec<u8> {
    // Language and description are both dropped on write; only the comment text survives
    // a read-then-write round trip.
    let mut out = vec![Encoding::Latin1.render_byte()];
    out.extend(b"eng");
    out.push(0); // empty description, terminated
    out.extend(string::render(Encoding::Latin1, value));
    out
}

fn render_popm_body(value: &str, options: &WriteOptions) -> Vec<u8> {
    let rating = super::popm::compute_rating_byte(value, options.popm_bug_compat);
    let mut out = vec![0u8]; // email, empty + terminator
    out.push(rating);
    out.extend([0, 0, 0, 0]); // play count, always zero
    out
}

/// Wraps a text-shaped frame body in a frame header. Text frames never carry a
/// data-length indicator: format flags are `0x0000` normally, `0x0002` when the body
/// has been run through the unsynchronization transform.
fn render_text_frame_header(id: &str, body: Vec<u8>, unsync: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 10);
    out.extend(id.as_bytes());

    let (body, format_flags) = if unsync {
        (super::syncdata::encode(&body), 0x02u8)
    } else {
        (body, 0x00u8)
    };

    out.extend(super::syncdata::from_u28(body.len() as u32));
    out.extend([0u8, format_flags]);
    out.extend(body);
    out
}

/// Wraps an `APIC` body in a frame header. Unlike a text frame, a picture frame always
/// carries a 4-byte data-length indicator recording its original size, whether or not
/// unsynchronization applies: format flags are `0x0001` normally, `0x0003` when the
/// body has also been run through the unsynchronization transform.
fn render_picture_frame_header(body: Vec<u8>, unsync: bool) -> Vec<u8> {
    let original_len = body.len() as u32;
    let body = if unsync { super::syncdata::encode(&body) } else { body };

    let mut sized = Vec::with_capacity(body.len() + 4);
    sized.extend(super::syncdata::from_u28(original_len));
    sized.extend(body);

    let format_flags = if unsync { 0x03u8 } else { 0x01u8 };

    let mut out = Vec::with_capacity(sized.len() + 10);
    out.extend(b"APIC");
    out.extend(super::syncdata::from_u28(sized.len() as u32));
    out.extend([0u8, format_flags]);
    out.extend(sized);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id3v2::header::TagHeader;

    fn v24_header() -> TagHeader {
        TagHeader::with_version(Version::V24)
    }

    fn v24_unsync_header() -> TagHeader {
        let raw = *b"ID3\x04\x00\x80\x00\x00\x00\x00";
        let mut stream = BufStream::new(&[]);
        TagHeader::parse(raw, &mut stream).unwrap()
    }

    fn build_text_frame(id: &str, encoding: u8, body: &[u8]) -> Vec<u8> {
        let mut payload = vec![encoding];
        payload.extend(body);

        let mut out = Vec::new();
        out.extend(id.as_bytes());
        out.extend(super::super::syncdata::from_u28(payload.len() as u32));
        out.extend([0u8, 0u8]);
        out.extend(payload);
        out
    }

    #[test]
    fn parses_simple_text_frame() {
        let raw = build_text_frame("TIT2", 0, b"Hello\0");
        let mut stream = BufStream::new(&raw);
        let header = v24_header();

        let frames = parse_tag_frames(&header, &mut stream);
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            ParsedFrame::Field(f) => {
                assert_eq!(f.frame_id, "TIT2");
                assert_eq!(f.text, "Hello");
            }
            _ => panic!("expected a field"),
        }
    }

    #[test]
    fn parses_popm_rating() {
        let mut payload = vec![0u8]; // email terminator
        payload.push(204);
        payload.extend([0, 0, 0, 0]);

        let mut out = Vec::new();
        out.extend(b"POPM");
        out.extend(super::super::syncdata::from_u28(payload.len() as u32));
        out.extend([0u8, 0u8]);
        out.extend(payload);

        let mut stream = BufStream::new(&out);
        let frames = parse_tag_frames(&v24_header(), &mut stream);

        match &frames[0] {
            ParsedFrame::Field(f) => {
                assert_eq!(f.frame_id, "POPM");
                assert_eq!(f.text, "204");
            }
            _ => panic!("expected a field"),
        }
    }

    #[test]
    fn parses_txxx_as_renamed_field() {
        let mut payload = vec![0u8];
        payload.extend(b"REPLAYGAIN_TRACK_GAIN\0");
        payload.extend(b"-6.5 dB");

        let mut out = Vec::new();
        out.extend(b"TXXX");
        out.extend(super::super::syncdata::from_u28(payload.len() as u32));
        out.extend([0u8, 0u8]);
        out.extend(payload);

        let mut stream = BufStream::new(&out);
        let frames = parse_tag_frames(&v24_header(), &mut stream);

        match &frames[0] {
            ParsedFrame::Field(f) => {
                assert_eq!(f.frame_id, "REPLAYGAIN_TRACK_GAIN");
                assert_eq!(f.text, "-6.5 dB");
            }
            _ => panic!("expected a field"),
        }
    }

    #[test]
    fn large_payload_parses_as_picture() {
        let mut payload = vec![0u8];
        payload.extend(b"image/png\0");
        payload.push(3); // front cover
        payload.push(0); // empty description, terminated
        payload.extend(vec![0xAB; PICTURE_THRESHOLD]);

        let mut out = Vec::new();
        out.extend(b"APIC");
        out.extend(super::super::syncdata::from_u28(payload.len() as u32));
        out.extend([0u8, 0u8]);
        out.extend(payload);

        let mut stream = BufStream::new(&out);
        let frames = parse_tag_frames(&v24_header(), &mut stream);

        match &frames[0] {
            ParsedFrame::Picture(p) => {
                assert_eq!(p.mime, "image/png");
                assert_eq!(p.pic_type, PictureType::Front);
                assert_eq!(p.picture.len(), PICTURE_THRESHOLD);
            }
            _ => panic!("expected a picture"),
        }
    }

    #[test]
    fn invalid_frame_id_stops_the_loop() {
        let mut out = Vec::new();
        out.extend(b"tit2"); // lowercase, invalid
        out.extend(super::super::syncdata::from_u28(4));
        out.extend([0u8, 0u8, b'a', b'b', b'c', b'd']);

        let mut stream = BufStream::new(&out);
        let frames = parse_tag_frames(&v24_header(), &mut stream);
        assert!(frames.is_empty());
    }

    #[test]
    fn emit_text_field_roundtrips() {
        let options = WriteOptions::default();
        let header = v24_header();
        let rendered = emit_field_frame(&header, "TIT2", "Hello", &options);

        let mut stream = BufStream::new(&rendered);
        let frames = parse_tag_frames(&header, &mut stream);
        match &frames[0] {
            ParsedFrame::Field(f) => {
                assert_eq!(f.frame_id, "TIT2");
                assert_eq!(f.text, "Hello");
            }
            _ => panic!("expected a field"),
        }
    }

    #[test]
    fn emit_unknown_code_wraps_in_txxx() {
        let options = WriteOptions::default();
        let header = v24_header();
        let rendered = emit_field_frame(&header, "TYE", "2003", &options);
        assert_eq!(&rendered[0..4], b"TXXX");
    }

    #[test]
    fn unsynced_text_frame_sets_unsync_flag_with_no_data_length_indicator() {
        let options = WriteOptions::default();
        let header = v24_unsync_header();
        let rendered = emit_field_frame(&header, "TIT2", "Hello", &options);

        assert_eq!(rendered[8], 0);
        assert_eq!(rendered[9], 0x02);

        let mut stream = BufStream::new(&rendered);
        let frames = parse_tag_frames(&header, &mut stream);
        match &frames[0] {
            ParsedFrame::Field(f) => assert_eq!(f.text, "Hello"),
            _ => panic!("expected a field"),
        }
    }

    #[test]
    fn picture_frame_always_carries_data_length_indicator() {
        let header = v24_header();
        let picture = AttachedPictureFrame {
            mime: String::from("image/png"),
            pic_type: PictureType::Front,
            desc: String::new(),
            picture: vec![0xAB; 16],
        };
        let rendered = emit_picture_frame(&header, &picture);

        assert_eq!(&rendered[0..4], b"APIC");
        assert_eq!(rendered[9], 0x01);

        let mut stream = BufStream::new(&rendered);
        let frames = parse_tag_frames(&header, &mut stream);
        match &frames[0] {
            ParsedFrame::Picture(p) => assert_eq!(p.picture.len(), 16),
            _ => panic!("expected a picture"),
        }
    }

    #[test]
    fn unsynced_picture_frame_sets_both_unsync_and_data_length_indicator_flags() {
        let header = v24_unsync_header();
        let picture = AttachedPictureFrame {
            mime: String::from("image/png"),
            pic_type: PictureType::Front,
            desc: String::new(),
            picture: vec![0xAB; 16],
        };
        let rendered = emit_picture_frame(&header, &picture);

        assert_eq!(rendered[9], 0x03);

        let mut stream = BufStream::new(&rendered);
        let frames = parse_tag_frames(&header, &mut stream);
        match &frames[0] {
            ParsedFrame::Picture(p) => assert_eq!(p.picture.len(), 16),
            _ => panic!("expected a picture"),
        }
    }

    #[test]
    fn comment_frame_description_is_discarded_not_prepended_to_text() {
        let mut payload = vec![1u8]; // UTF-16
        payload.extend(b"eng");
        payload.extend([0xFF, 0xFE]); // BOM, little-endian
        payload.extend(b"d\0".iter().flat_map(|&b| [b, 0])); // "d" + NUL, UTF-16LE
        payload.extend(b"t".iter().flat_map(|&b| [b, 0])); // "t", UTF-16LE

        let mut out = Vec::new();
        out.extend(b"COMM");
        out.extend(super::super::syncdata::from_u28(payload.len() as u32));
        out.extend([0u8, 0u8]);
        out.extend(payload);

        let mut stream = BufStream::new(&out);
        let frames = parse_tag_frames(&v24_header(), &mut stream);

        match &frames[0] {
            ParsedFrame::Field(f) => {
                assert_eq!(f.frame_id, "COMM");
                assert_eq!(f.text, "t");
            }
            _ => panic!("expected a field"),
        }
    }
}
