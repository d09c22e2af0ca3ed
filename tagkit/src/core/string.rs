//! Tag string handling.
use crate::core::io::BufStream;
use log::warn;

/// The internal representation of text encodings used by tag frames.
///
/// `Utf16Le` is never produced by a wire-format encoding byte; it only exists so that a
/// caller who has already resolved a BOM can keep decoding the rest of a value without
/// re-sniffing it on every call.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Encoding {
    /// ISO-8859-1, a.k.a. Latin1. Used by ID3v1 and as ID3v2's encoding `0`.
    Latin1,
    /// UTF-16 with a leading byte-order mark. ID3v2's encoding `1`.
    Utf16,
    /// UTF-16BE with no BOM. Only valid in ID3v2.4; ID3v2's encoding `2`.
    Utf16Be,
    /// UTF-8, with no BOM. Only valid in ID3v2.4; ID3v2's encoding `3`.
    Utf8,
    /// UTF-16LE with no BOM. Used internally once a BOM has already been resolved.
    Utf16Le,
}

impl Encoding {
    pub(crate) fn nul_size(self) -> usize {
        match self {
            Self::Utf8 | Self::Latin1 => 1,
            _ => 2,
        }
    }

    /// Maps an ID3v2 encoding byte (`0..=3`) to a concrete encoding. Returns `None` for
    /// any other byte, in which case the caller should treat the encoding byte as absent.
    pub(crate) fn parse(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Latin1),
            1 => Some(Self::Utf16),
            2 => Some(Self::Utf16Be),
            3 => Some(Self::Utf8),
            _ => None,
        }
    }

    /// The byte this encoding is written back as. `Utf16Le` renders as `1`, the same as
    /// `Utf16`, since both are written with a leading BOM.
    pub(crate) fn render_byte(self) -> u8 {
        match self {
            Self::Latin1 => 0,
            Self::Utf16 | Self::Utf16Le => 1,
            Self::Utf16Be => 2,
            Self::Utf8 => 3,
        }
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Self::Latin1
    }
}

/// Consumes the rest of this stream and decodes it into a string according to the encoding.
pub(crate) fn read(encoding: Encoding, stream: &mut BufStream) -> String {
    decode(encoding, stream.take_rest())
}

/// Searches and consumes the stream up until a NUL terminator and decodes it into a
/// string according to the encoding. The string will not include the terminator.
pub(crate) fn read_terminated(encoding: Encoding, stream: &mut BufStream) -> String {
    let string_data = match encoding.nul_size() {
        1 => stream.search(&[0]),
        2 => stream.search(&[0, 0]),
        _ => unreachable!(),
    };

    decode(encoding, string_data)
}

/// Renders a string according to the encoding.
pub(crate) fn render(encoding: Encoding, string: &str) -> Vec<u8> {
    match encoding {
        Encoding::Latin1 => encode_latin1(string),
        Encoding::Utf16 => encode_utf16(string),
        Encoding::Utf16Be => encode_utf16be(string),
        Encoding::Utf8 => string.as_bytes().to_vec(),
        Encoding::Utf16Le => encode_utf16le(string),
    }
}

/// Renders a string plus a NUL terminator according to the encoding.
pub(crate) fn render_terminated(encoding: Encoding, string: &str) -> Vec<u8> {
    let mut result = render(encoding, string);
    result.resize(result.len() + encoding.nul_size(), 0);
    result
}

fn decode(encoding: Encoding, data: &[u8]) -> String {
    // Strip a trailing NUL terminator if present; BufStream::search includes it in what
    // it returns, and plenty of non-terminated frame bodies are NUL-padded anyway.
    let data = match encoding.nul_size() {
        1 => data.strip_suffix(&[0]).unwrap_or(data),
        2 => data.strip_suffix(&[0, 0]).unwrap_or(data),
        _ => unreachable!(),
    };

    match encoding {
        Encoding::Latin1 => decode_latin1(data),
        Encoding::Utf16 => decode_utf16(data),
        Encoding::Utf16Be => decode_utf16be(data),
        Encoding::Utf8 => String::from_utf8_lossy(data).to_string(),
        Encoding::Utf16Le => decode_utf16le(data),
    }
}

fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|&byte| char::from(byte)).collect()
}

fn decode_utf16(data: &[u8]) -> String {
    if data.len() < 2 {
        return String::new();
    }

    match (data[0], data[1]) {
        (0xFF, 0xFE) => decode_utf16le(&data[2..]),
        (0xFE, 0xFF) => decode_utf16be(&data[2..]),
        _ => {
            warn!("could not determine utf-16 bom, defaulting to utf-16be");
            decode_utf16be(data)
        }
    }
}

fn decode_utf16be(data: &[u8]) -> String {
    String::from_utf16_lossy(
        &data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect::<Vec<u16>>(),
    )
}

fn decode_utf16le(data: &[u8]) -> String {
    String::from_utf16_lossy(
        &data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect::<Vec<u16>>(),
    )
}

fn encode_latin1(string: &str) -> Vec<u8> {
    string
        .chars()
        .map(|ch| if u32::from(ch) > 0xFF { b'?' } else { ch as u8 })
        .collect()
}

fn encode_utf16(string: &str) -> Vec<u8> {
    let mut result: Vec<u8> = vec![0xFF, 0xFE];
    result.extend(encode_utf16le(string));
    result
}

fn encode_utf16be(string: &str) -> Vec<u8> {
    string
        .encode_utf16()
        .flat_map(|cp| cp.to_be_bytes())
        .collect()
}

fn encode_utf16le(string: &str) -> Vec<u8> {
    string
        .encode_utf16()
        .flat_map(|cp| cp.to_le_bytes())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STR_LATIN1: &str = "Caf\u{e9} na\u{ef}ve";
    const DATA_LATIN1: &[u8] = b"Caf\xe9 na\xefve";

    const STR_PLAIN: &str = "Hi";
    const DATA_UTF16LE: &[u8] = b"H\x00i\x00";
    const DATA_UTF16BE: &[u8] = b"\x00H\x00i";
    const DATA_UTF16_BOM_LE: &[u8] = b"\xFF\xFEH\x00i\x00";
    const DATA_UTF16_BOM_BE: &[u8] = b"\xFE\xFF\x00H\x00i";

    #[test]
    fn parse_latin1() {
        assert_eq!(decode(Encoding::Latin1, DATA_LATIN1), STR_LATIN1);
    }

    #[test]
    fn render_latin1_lossy() {
        assert_eq!(render(Encoding::Latin1, "caf\u{e9}\u{1f600}"), b"caf\xe9?");
    }

    #[test]
    fn parse_utf16_bom_le() {
        assert_eq!(decode(Encoding::Utf16, DATA_UTF16_BOM_LE), STR_PLAIN);
    }

    #[test]
    fn parse_utf16_bom_be() {
        assert_eq!(decode(Encoding::Utf16, DATA_UTF16_BOM_BE), STR_PLAIN);
    }

    #[test]
    fn parse_utf16le_no_bom() {
        assert_eq!(decode(Encoding::Utf16Le, DATA_UTF16LE), STR_PLAIN);
    }

    #[test]
    fn parse_utf16be_no_bom() {
        assert_eq!(decode(Encoding::Utf16Be, DATA_UTF16BE), STR_PLAIN);
    }

    #[test]
    fn render_utf16_adds_bom() {
        assert_eq!(render(Encoding::Utf16, STR_PLAIN), DATA_UTF16_BOM_LE);
    }

    #[test]
    fn render_terminated_adds_nul() {
        assert_eq!(render_terminated(Encoding::Latin1, "hi"), b"hi\0");
        assert_eq!(render_terminated(Encoding::Utf16Be, "hi"), b"\x00h\x00i\0\0");
    }

    #[test]
    fn read_terminated_stops_at_nul() {
        let data = b"first\0second";
        let mut stream = BufStream::new(data);

        assert_eq!(read_terminated(Encoding::Latin1, &mut stream), "first");
        assert_eq!(read_terminated(Encoding::Latin1, &mut stream), "second");
    }

    #[test]
    fn encoding_byte_roundtrip() {
        for byte in 0..=3u8 {
            let enc = Encoding::parse(byte).unwrap();
            assert_eq!(enc.render_byte(), byte);
        }
        assert!(Encoding::parse(4).is_none());
    }
}
