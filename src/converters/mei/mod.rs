//! MEI (Music Encoding Initiative) dialect

pub mod reader;
pub mod writer;

pub use reader::{parse, parse_with_warnings, read_metadata};
pub use writer::build;
