use std::error;
use std::fmt::{self, Display, Formatter};
use std::io;
use tagkit::id3v2::SemanticField;

static TAG_NAMES: &[(&str, SemanticField)] = &[
    ("title", SemanticField::Title),
    ("artist", SemanticField::Artist),
    ("album-artist", SemanticField::AlbumArtist),
    ("conductor", SemanticField::Conductor),
    ("original-artist", SemanticField::OriginalArtist),
    ("album", SemanticField::Album),
    ("original-album", SemanticField::OriginalAlbum),
    ("track", SemanticField::TrackNumber),
    ("disc", SemanticField::DiscNumber),
    ("date", SemanticField::RecordingDate),
    ("year", SemanticField::RecordingYear),
    ("daymonth", SemanticField::RecordingDayMonth),
    ("comment", SemanticField::Comment),
    ("composer", SemanticField::Composer),
    ("rating", SemanticField::Rating),
    ("genre", SemanticField::Genre),
    ("copyright", SemanticField::Copyright),
    ("publisher", SemanticField::Publisher),
    ("description", SemanticField::GeneralDescription),
];

/// Parses a `--tags` argument value into the semantic field it names.
pub fn field_from_arg(arg: &str) -> Result<SemanticField, OpError> {
    TAG_NAMES
        .iter()
        .find(|(name, _)| *name == arg)
        .map(|(_, field)| *field)
        .ok_or_else(|| OpError::InvalidTag(arg.to_string()))
}

/// The display name a field is printed under in `show` output.
pub fn field_name(field: SemanticField) -> &'static str {
    TAG_NAMES.iter().find(|(_, f)| *f == field).map(|(name, _)| *name).unwrap_or("unknown")
}

#[derive(Debug)]
pub enum OpError {
    Io(io::Error),
    InvalidTag(String),
    MalformedMetadata,
    UnsupportedMetadata,
}

impl Display for OpError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Io(err) => write![f, "{}", err],
            Self::InvalidTag(tag) => write![f, "unrecognized tag \"{}\"", tag],
            Self::MalformedMetadata => write![f, "malformed metadata"],
            Self::UnsupportedMetadata => write![f, "unsupported metadata"],
        }
    }
}

impl error::Error for OpError {}

impl From<io::Error> for OpError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
