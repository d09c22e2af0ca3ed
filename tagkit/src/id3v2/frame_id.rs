//! Frame-ID validation and the per-version semantic field registry.

/// A tag field with a stable meaning across all three frame-id vocabularies.
///
/// This is what the frame-id registry maps a raw frame code onto, regardless of which
/// version's vocabulary it came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SemanticField {
    Title,
    Artist,
    AlbumArtist,
    Conductor,
    OriginalArtist,
    Album,
    OriginalAlbum,
    TrackNumber,
    DiscNumber,
    RecordingDate,
    RecordingYear,
    RecordingDayMonth,
    Comment,
    Composer,
    Rating,
    Genre,
    Copyright,
    Publisher,
    GeneralDescription,
}

/// One entry in the registry: a raw frame code paired with the field it feeds.
struct Mapping(&'static str, SemanticField);

// ID3v2.2's three-character frame vocabulary. Frame codes not listed here are either
// unsupported by this crate or have no semantic-field analogue and surface only through
// `Tag::additional_fields`.
#[rustfmt::skip]
static V22_FIELDS: &[Mapping] = &[
    Mapping("TT2", SemanticField::Title),
    Mapping("TP1", SemanticField::Artist),
    Mapping("TP2", SemanticField::AlbumArtist),
    Mapping("TP3", SemanticField::Conductor),
    Mapping("TOA", SemanticField::OriginalArtist),
    Mapping("TAL", SemanticField::Album),
    Mapping("TOT", SemanticField::OriginalAlbum),
    Mapping("TRK", SemanticField::TrackNumber),
    Mapping("TPA", SemanticField::DiscNumber),
    Mapping("TYE", SemanticField::RecordingYear),
    Mapping("TDA", SemanticField::RecordingDayMonth),
    Mapping("COM", SemanticField::Comment),
    Mapping("TCM", SemanticField::Composer),
    Mapping("POP", SemanticField::Rating),
    Mapping("TCO", SemanticField::Genre),
    Mapping("TCR", SemanticField::Copyright),
    Mapping("TPB", SemanticField::Publisher),
    Mapping("TT1", SemanticField::GeneralDescription),
];

// ID3v2.3/2.4's shared four-character frame vocabulary (the two versions disagree on very
// little of the text-frame surface that this registry cares about).
#[rustfmt::skip]
static V34_FIELDS: &[Mapping] = &[
    Mapping("TIT2", SemanticField::Title),
    Mapping("TPE1", SemanticField::Artist),
    Mapping("TPE2", SemanticField::AlbumArtist),
    Mapping("TPE3", SemanticField::Conductor),
    Mapping("TOPE", SemanticField::OriginalArtist),
    Mapping("TALB", SemanticField::Album),
    Mapping("TOAL", SemanticField::OriginalAlbum),
    Mapping("TRCK", SemanticField::TrackNumber),
    Mapping("TPOS", SemanticField::DiscNumber),
    Mapping("TDRC", SemanticField::RecordingDate),
    Mapping("TYER", SemanticField::RecordingYear),
    Mapping("TDAT", SemanticField::RecordingDayMonth),
    Mapping("COMM", SemanticField::Comment),
    Mapping("TCOM", SemanticField::Composer),
    Mapping("POPM", SemanticField::Rating),
    Mapping("TCON", SemanticField::Genre),
    Mapping("TCOP", SemanticField::Copyright),
    Mapping("TPUB", SemanticField::Publisher),
    Mapping("TIT1", SemanticField::GeneralDescription),
];

/// The frame code a field is written back as on ID3v2.4 output. Declaration order here
/// is the order fields are emitted on write.
pub(crate) fn write_frame_id(field: SemanticField) -> &'static str {
    V34_FIELDS
        .iter()
        .find(|m| m.1 == field)
        .map(|m| m.0)
        .expect("every SemanticField variant has a v2.3/2.4 frame code")
}

/// All fields in write order, paired with their ID3v2.4 frame code.
pub(crate) fn write_order() -> impl Iterator<Item = (SemanticField, &'static str)> {
    V34_FIELDS.iter().map(|m| (m.1, m.0))
}

/// Whether `code` is one of the frame codes this crate recognizes on write. Additional
/// fields carrying an unrecognized code get wrapped in a `TXXX` frame instead of being
/// emitted under their own frame id.
pub(crate) fn is_known_write_code(code: &str) -> bool {
    V34_FIELDS.iter().any(|m| m.0 == code) || code == "TXXX"
}

/// Looks up the semantic field a raw frame code maps to: ID3v2.2 codes are looked up in
/// the v2.2 table, everything else in the shared v2.3/2.4 table.
pub(crate) fn field_for(version: super::Version, raw_id: &str) -> Option<SemanticField> {
    let table = match version {
        super::Version::V22 => V22_FIELDS,
        super::Version::V23 | super::Version::V24 => V34_FIELDS,
    };

    table
        .iter()
        .find(|m| m.0.eq_ignore_ascii_case(raw_id))
        .map(|m| m.1)
}
