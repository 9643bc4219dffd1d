//! Build transcript reading: classification, parsing and parse caching

pub mod cache;
pub mod classify;
pub mod grammar;
pub mod parser;
pub mod record;

pub use cache::{CacheKey, FileParseCache, NoopParseCache, ParseCache};
pub use classify::{classify, ClassifiedTranscript};
pub use parser::parse_transcript;
pub use record::{CommandRecord, ToolKind};

use crate::error::Result;
use crate::model::Conventions;

/// Classifies and parses a whole transcript
pub fn parse(transcript: &str, conventions: &Conventions) -> Result<Vec<CommandRecord>> {
    let classified = classify(transcript, conventions);
    parse_transcript(&classified)
}
