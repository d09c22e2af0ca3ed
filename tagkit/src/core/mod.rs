//! Core utilities shared by every tag format this crate supports.

pub(crate) mod io;
pub(crate) mod string;

pub use {
    io::{BufStream, StreamError},
    string::Encoding,
};
