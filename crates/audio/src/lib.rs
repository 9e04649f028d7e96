pub mod io;
pub mod stems;

pub use io::{probe, MediaInfo};
pub use stems::{SourceKind, StemPatterns, StemResolver};
