//! CMME (Computerized Mensural Music Editing) dialect

pub mod reader;
pub mod writer;

pub use reader::{parse, parse_with_warnings, read_metadata};
pub use writer::build;
