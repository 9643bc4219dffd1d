//! Invocation classifier
//!
//! Picks compiler, archiver and direct-linker invocations out of a build
//! transcript by the basename of the first token on each line. Everything
//! else in the log is dropped.

use crate::model::Conventions;
use crate::paths;

/// Raw invocation lines, grouped by tool, in transcript order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedTranscript {
    pub compiler: Vec<String>,
    pub archiver: Vec<String>,
    pub linker: Vec<String>,
}

impl ClassifiedTranscript {
    pub fn len(&self) -> usize {
        self.compiler.len() + self.archiver.len() + self.linker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn classify(transcript: &str, conventions: &Conventions) -> ClassifiedTranscript {
    let mut classified = ClassifiedTranscript::default();

    for line in transcript.lines() {
        let Some(first) = line.split_whitespace().next() else {
            continue;
        };
        let command = paths::basename(first);
        let line = line.trim().to_string();

        if conventions.is_compiler(command) {
            classified.compiler.push(line);
        } else if command == conventions.archiver {
            classified.archiver.push(line);
        } else if command == conventions.linker {
            classified.linker.push(line);
        }
    }

    classified
}
