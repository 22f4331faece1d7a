//! Line-level parsing of solver logs.

pub mod line;
pub mod options;
pub mod parse;

pub use line::{LineKind, LogLine};
pub use options::{MalformedPolicy, ParseOptions, TimeUnit};
pub use parse::LogRecordParser;
