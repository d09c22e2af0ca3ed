//! Genre code extraction and the ID3v1 genre table.
use regex::Regex;
use std::sync::OnceLock;

/// Extracts the ID3v1 genre name out of a TCON/TCO-style value.
///
/// Values look like `"(17)"`, `"(4)Eurodance"`, or a plain genre string with no numeric
/// prefix at all. A numeric prefix in parentheses at the start of the string is parsed and
/// stripped; if nothing is left afterward and the number is a valid ID3v1 genre index, the
/// standard genre name is substituted.
pub(crate) fn extract(raw: &str) -> String {
    let trimmed = raw.trim_matches('\0');

    let re = prefix_regex();

    let captures = match re.captures(trimmed) {
        Some(c) => c,
        None => return trimmed.to_string(),
    };

    let whole = captures.get(0).unwrap();
    let index: usize = match captures[1].parse() {
        Ok(i) => i,
        Err(_) => return trimmed.to_string(),
    };

    let remainder = &trimmed[whole.end()..];

    if remainder.is_empty() {
        if let Some(name) = ID3V1_GENRES.get(index) {
            return name.to_string();
        }
    }

    remainder.to_string()
}

fn prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // [0-9] rather than \d: the unicode tables \d needs aren't compiled in, since this
    // crate builds regex with default-features disabled.
    RE.get_or_init(|| Regex::new(r"^\(([0-9]+)\)").unwrap())
}

/// The standard ID3v1 genre list, indexed by genre code.
pub(crate) static ID3V1_GENRES: &[&str] = &[
    "Blues", "Classic Rock", "Country", "Dance", "Disco", "Funk", "Grunge", "Hip-Hop",
    "Jazz", "Metal", "New Age", "Oldies", "Other", "Pop", "R&B", "Rap", "Reggae", "Rock",
    "Techno", "Industrial", "Alternative", "Ska", "Death Metal", "Pranks", "Soundtrack",
    "Euro-Techno", "Ambient", "Trip-Hop", "Vocal", "Jazz+Funk", "Fusion", "Trance",
    "Classical", "Instrumental", "Acid", "House", "Game", "Sound Clip", "Gospel", "Noise",
    "AlternRock", "Bass", "Soul", "Punk", "Space", "Meditative", "Instrumental Pop",
    "Instrumental Rock", "Ethnic", "Gothic", "Darkwave", "Techno-Industrial", "Electronic",
    "Pop-Folk", "Eurodance", "Dream", "Southern Rock", "Comedy", "Cult", "Gangsta",
    "Top 40", "Christian Rap", "Pop/Funk", "Jungle", "Native American", "Cabaret",
    "New Wave", "Psychedelic", "Rave", "Showtunes", "Trailer", "Lo-Fi", "Tribal",
    "Acid Punk", "Acid Jazz", "Polka", "Retro", "Musical", "Rock & Roll", "Hard Rock",
];
