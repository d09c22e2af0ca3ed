//! ISO-639-2 language codes, as stored in `COMM` frames.

use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Language([u8; 3]);

impl Language {
    pub fn try_new(code: [u8; 3]) -> Option<Self> {
        if code.iter().all(u8::is_ascii_alphabetic) {
            let mut lower = code;
            lower.iter_mut().for_each(|b| *b = b.to_ascii_lowercase());
            Some(Self(lower))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap()
    }
}

impl Default for Language {
    fn default() -> Self {
        // "xxx" isn't a real ISO-639-2 code but is the conventional stand-in for unknown.
        Self(*b"xxx")
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "{}", self.as_str()]
    }
}
