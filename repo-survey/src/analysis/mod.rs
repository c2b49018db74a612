//! Offline text analysis shared by probes and the annotate command.

pub mod cmake;
pub mod keywords;
pub mod requirements;

pub use cmake::{is_cmake_file, CMakeReport, Dependency};
pub use keywords::KeywordSet;
pub use requirements::{requirements_includes, Manifest};
