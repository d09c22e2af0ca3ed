//! Playlist format registry.
//!
//! A small, fixed table mapping file extensions to a playlist format descriptor. This
//! crate doesn't read or write any of the formats themselves — it only answers "what
//! format does this path claim to be, and what URI style should its contents use".
use std::path::Path;

/// A playlist container format this registry knows the extensions and URI conventions
/// for, without implementing a reader or writer for it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlaylistFormat {
    M3u,
    Pls,
    Fpl,
    Xspf,
    Smil,
    Asx,
    B4s,
}

impl PlaylistFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::M3u => "M3U",
            Self::Pls => "PLS",
            Self::Fpl => "FPL",
            Self::Xspf => "XSPF",
            Self::Smil => "SMIL",
            Self::Asx => "ASX",
            Self::B4s => "B4S",
        }
    }

    /// The URI convention a format's entries use by default.
    pub fn default_uri_style(self) -> UriStyle {
        match self {
            Self::M3u | Self::Pls | Self::Xspf => UriStyle::Undefined,
            Self::Fpl | Self::Asx => UriStyle::MsUri,
            Self::Smil => UriStyle::RfcUri,
            Self::B4s => UriStyle::WinampUri,
        }
    }
}

/// The URI convention a playlist entry's file paths are expected to follow.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UriStyle {
    Undefined,
    MsUri,
    RfcUri,
    WinampUri,
}

struct Extension(&'static str, PlaylistFormat);

#[rustfmt::skip]
static EXTENSIONS: &[Extension] = &[
    Extension("m3u", PlaylistFormat::M3u),
    Extension("m3u8", PlaylistFormat::M3u),
    Extension("pls", PlaylistFormat::Pls),
    Extension("fpl", PlaylistFormat::Fpl),
    Extension("xspf", PlaylistFormat::Xspf),
    Extension("smil", PlaylistFormat::Smil),
    Extension("smi", PlaylistFormat::Smil),
    Extension("zpl", PlaylistFormat::Smil),
    Extension("wpl", PlaylistFormat::Smil),
    Extension("asx", PlaylistFormat::Asx),
    Extension("wax", PlaylistFormat::Asx),
    Extension("wvx", PlaylistFormat::Asx),
    Extension("b4s", PlaylistFormat::B4s),
];

/// A descriptor handed back by [`describe`]: the matched format (if any) and the URI
/// style it should be read/written with. `uri_style` starts out as the format's default
/// and can be overridden by the caller before use.
#[derive(Clone, Copy, Debug)]
pub struct PlaylistDescriptor {
    pub format: Option<PlaylistFormat>,
    pub uri_style: UriStyle,
}

impl PlaylistDescriptor {
    pub fn with_uri_style(mut self, style: UriStyle) -> Self {
        self.uri_style = style;
        self
    }
}

/// Looks up the playlist format implied by `path`'s extension, matched case-insensitively.
/// A path with no extension, or an extension this registry doesn't recognize, yields a
/// descriptor with `format: None` and the `Undefined` URI style — the stub case.
pub fn describe<P: AsRef<Path>>(path: P) -> PlaylistDescriptor {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    let format = ext
        .as_deref()
        .and_then(|ext| EXTENSIONS.iter().find(|e| e.0 == ext))
        .map(|e| e.1);

    PlaylistDescriptor {
        format,
        uri_style: format.map(PlaylistFormat::default_uri_style).unwrap_or(UriStyle::Undefined),
    }
}
