//! Cross-cutting string/path/file helpers used throughout the core.

pub mod file_io;
pub mod path;
pub mod tokenize;
pub mod wildcard;

pub use file_io::{read_section, write_section, FileIoError};
pub use tokenize::tokenize;
pub use wildcard::glob_match;
