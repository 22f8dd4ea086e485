//! Pure text helpers: ANSI parsing, display width and wrapping.

pub mod ansi;
pub mod width;
pub mod wrap;
