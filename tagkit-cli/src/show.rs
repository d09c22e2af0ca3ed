use std::io::{self, ErrorKind};
use std::path::Path;

use tagkit::id3v2::{ParseOptions, Tag};

use crate::args::{self, OpError};

pub fn show<'a>(paths: impl Iterator<Item = &'a str>, tags: Option<Vec<&'a str>>) -> Result<(), OpError> {
    let tags = match tags {
        Some(names) => {
            let mut fields = Vec::new();
            for name in names {
                fields.push(args::field_from_arg(name)?);
            }
            Some(fields)
        }
        None => None,
    };

    for path in paths {
        if let Err(err) = show_file(path, &tags) {
            eprintln!("tagkit: {}: {}", path, err);
        }
    }

    Ok(())
}

fn show_file(path: &str, tags: &Option<Vec<tagkit::id3v2::SemanticField>>) -> Result<(), OpError> {
    let path = new_path_safe(path)?;

    let opts = ParseOptions { read_all_meta_frames: true };
    let tag = Tag::open(path, opts).map_err(|_| OpError::MalformedMetadata)?;

    let tag = match tag {
        Some(tag) => tag,
        None => return Err(OpError::UnsupportedMetadata),
    };

    match tags {
        Some(fields) => {
            for &field in fields {
                if let Some(value) = tag.field(field) {
                    println!("{}: {}", args::field_name(field), value);
                }
            }
        }
        None => {
            for (name, field) in all_fields() {
                if let Some(value) = tag.field(field) {
                    println!("{}: {}", name, value);
                }
            }

            for additional in tag.additional_fields() {
                println!("\"{}\": {}", additional.frame_id, additional.value);
            }
        }
    }

    for picture in tag.pictures() {
        println!("picture: {}", picture);
    }

    Ok(())
}

fn all_fields() -> impl Iterator<Item = (&'static str, tagkit::id3v2::SemanticField)> {
    use tagkit::id3v2::SemanticField::*;

    [
        ("title", Title),
        ("artist", Artist),
        ("album-artist", AlbumArtist),
        ("conductor", Conductor),
        ("original-artist", OriginalArtist),
        ("album", Album),
        ("original-album", OriginalAlbum),
        ("track", TrackNumber),
        ("disc", DiscNumber),
        ("date", RecordingDate),
        ("year", RecordingYear),
        ("daymonth", RecordingDayMonth),
        ("comment", Comment),
        ("composer", Composer),
        ("rating", Rating),
        ("genre", Genre),
        ("copyright", Copyright),
        ("publisher", Publisher),
        ("description", GeneralDescription),
    ]
    .into_iter()
}

fn new_path_safe(string: &str) -> Result<&Path, io::Error> {
    let path = Path::new(string);

    if !path.exists() {
        return Err(io::Error::new(ErrorKind::NotFound, "no such file or directory"));
    }

    if path.is_dir() {
        return Err(io::Error::new(ErrorKind::Other, "is a directory"));
    }

    Ok(path)
}
