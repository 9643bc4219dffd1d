//! Command-line parser
//!
//! Turns one raw invocation line into a typed invocation using the tables in
//! [`super::grammar`]. A line that does not fit its grammar is a fatal error:
//! silently dropping it would leave a hole in the dependency graph.

use super::classify::ClassifiedTranscript;
use super::grammar::{Arity, Grammar, OptionField, OptionSpec, ARCHIVE_MODE, COMPILER, LINKER};
use super::record::{
    ArchiverInvocation, CommandRecord, CompilerInvocation, LinkerInvocation, ToolKind,
};
use crate::error::{ResolveError, Result};
use std::collections::HashSet;
use tracing::{debug, error};

/// Options and positionals collected from one line
#[derive(Debug, Default)]
struct Matches {
    values: Vec<(OptionField, String)>,
    switches: Vec<OptionField>,
    flags: Vec<String>,
    positionals: Vec<String>,
}

impl Matches {
    fn take(&self, field: OptionField) -> Vec<String> {
        self.values
            .iter()
            .filter(|(f, _)| *f == field)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn has(&self, field: OptionField) -> bool {
        self.switches.contains(&field)
    }
}

fn tokenize(grammar: &Grammar, line: &str) -> Result<Vec<String>> {
    let normalized = grammar.normalize_line(line);
    let mut tokens = shlex::split(&normalized).ok_or_else(|| ResolveError::Parse {
        tool: grammar.tool,
        reason: "unbalanced quoting".to_string(),
        line: line.to_string(),
    })?;
    if !tokens.is_empty() {
        tokens.remove(0);
    }
    Ok(tokens)
}

fn match_options(grammar: &Grammar, line: &str, tokens: Vec<String>) -> Result<Matches> {
    let fail = |reason: String| ResolveError::Parse {
        tool: grammar.tool,
        reason,
        line: line.to_string(),
    };

    let mut matches = Matches::default();
    let mut seen: HashSet<&'static str> = HashSet::new();
    let mut tokens = tokens.into_iter();

    while let Some(token) = tokens.next() {
        let (spec, attached): (&OptionSpec, Option<String>) = if token.starts_with("--") {
            let (name, value) = match token.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (token.as_str(), None),
            };
            let spec = grammar
                .long(name)
                .ok_or_else(|| fail(format!("unknown option '{}'", name)))?;
            (spec, value)
        } else if token.len() > 1 && token.starts_with('-') {
            if let Some(spec) = grammar.short_switch(&token) {
                (spec, None)
            } else if let Some(spec) = grammar.short_value(&token) {
                let rest = &token[spec.name.len()..];
                (spec, (!rest.is_empty()).then(|| rest.to_string()))
            } else {
                return Err(fail(format!("unknown option '{}'", token)));
            }
        } else {
            matches.positionals.push(token);
            continue;
        };

        if !spec.repeatable && !seen.insert(spec.name) {
            return Err(fail(format!("option '{}' given more than once", spec.name)));
        }

        match spec.arity {
            Arity::Switch => {
                if attached.is_some() {
                    return Err(fail(format!("option '{}' takes no value", spec.name)));
                }
                if spec.field == OptionField::Flag {
                    matches.flags.push(spec.name.to_string());
                } else {
                    matches.switches.push(spec.field);
                }
            }
            Arity::Value => {
                let value = match attached {
                    Some(value) => value,
                    None => tokens
                        .next()
                        .ok_or_else(|| fail(format!("option '{}' requires a value", spec.name)))?,
                };
                if spec.field == OptionField::Flag {
                    let joiner = if spec.is_long() { "=" } else { "" };
                    matches.flags.push(format!("{}{}{}", spec.name, joiner, value));
                } else {
                    matches.values.push((spec.field, value));
                }
            }
        }
    }

    Ok(matches)
}

fn require_output(tool: ToolKind, line: &str, matches: &Matches) -> Result<String> {
    matches
        .take(OptionField::Output)
        .pop()
        .ok_or_else(|| ResolveError::MissingOutput {
            tool: tool.as_str(),
            line: line.to_string(),
        })
}

pub fn parse_compiler(line: &str) -> Result<CompilerInvocation> {
    let tokens = tokenize(&COMPILER, line)?;
    let matches = match_options(&COMPILER, line, tokens)?;

    Ok(CompilerInvocation {
        output: require_output(ToolKind::Compiler, line, &matches)?,
        include_dirs: matches.take(OptionField::IncludeDir),
        defines: matches.take(OptionField::Define),
        libraries: matches.take(OptionField::Library),
        library_dirs: matches.take(OptionField::LibraryDir),
        frameworks: matches.take(OptionField::Framework),
        compile_only: matches.has(OptionField::CompileOnly),
        flags: matches.flags,
        sources: matches.positionals,
    })
}

pub fn parse_linker(line: &str) -> Result<LinkerInvocation> {
    let tokens = tokenize(&LINKER, line)?;
    let matches = match_options(&LINKER, line, tokens)?;

    Ok(LinkerInvocation {
        output: require_output(ToolKind::Linker, line, &matches)?,
        libraries: matches.take(OptionField::Library),
        frameworks: matches.take(OptionField::Framework),
        flags: matches.flags,
        sources: matches.positionals,
    })
}

/// Parses `ar <mode> <archive> <member>...`
pub fn parse_archiver(line: &str) -> Result<ArchiverInvocation> {
    let fail = |reason: &str| ResolveError::Parse {
        tool: ToolKind::Archiver.as_str(),
        reason: reason.to_string(),
        line: line.to_string(),
    };

    let mut tokens = shlex::split(line)
        .ok_or_else(|| fail("unbalanced quoting"))?
        .into_iter()
        .skip(1);

    let mode = tokens.next().ok_or_else(|| fail("missing mode"))?;
    if mode != ARCHIVE_MODE {
        return Err(ResolveError::UnsupportedArchiveMode {
            mode,
            line: line.to_string(),
        });
    }
    let archive = tokens.next().ok_or_else(|| fail("missing archive"))?;
    let members: Vec<String> = tokens.collect();

    if members.is_empty() {
        return Err(fail("no archive members"));
    }
    if let Some(option) = members.iter().find(|m| m.len() > 1 && m.starts_with('-')) {
        return Err(fail(&format!("unknown option '{}'", option)));
    }

    Ok(ArchiverInvocation { archive, members })
}

/// Parses every classified line into records: compiler lines first, then
/// direct linker lines, then archiver lines.
pub fn parse_transcript(classified: &ClassifiedTranscript) -> Result<Vec<CommandRecord>> {
    let mut records = Vec::with_capacity(classified.len());

    for line in &classified.compiler {
        records.push(parse_compiler(line).map_err(log_failure)?.into());
    }
    for line in &classified.linker {
        records.push(parse_linker(line).map_err(log_failure)?.into());
    }
    for line in &classified.archiver {
        records.push(parse_archiver(line).map_err(log_failure)?.into());
    }

    debug!(count = records.len(), "Parsed invocation records");
    Ok(records)
}

fn log_failure(err: ResolveError) -> ResolveError {
    error!("Error reading invocation: {}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compile_line() {
        let inv = parse_compiler(
            "g++ -o annlib/src/ANN.o -c -fPIC -fno-strict-aliasing -w -DNDEBUG -O3 \
             -DBOOST_ALL_NO_LIB -I/d/build/include -I /d/modules/annlib/src \
             /d/modules/annlib/src/ANN.cpp",
        )
        .unwrap();

        assert_eq!(inv.output, "annlib/src/ANN.o");
        assert!(inv.compile_only);
        assert_eq!(inv.defines, vec!["NDEBUG", "BOOST_ALL_NO_LIB"]);
        assert_eq!(inv.include_dirs, vec!["/d/build/include", "/d/modules/annlib/src"]);
        assert_eq!(inv.sources, vec!["/d/modules/annlib/src/ANN.cpp"]);
        assert_eq!(inv.flags, vec!["-fPIC", "-fno-strict-aliasing", "-w", "-O3"]);
    }

    #[test]
    fn test_parse_shared_link_line() {
        let inv = parse_compiler(
            "g++ -o lib/libcctbx.so -shared -s cctbx/a.o cctbx/b.o -Llib -L/d/lib -lm -lscitbx",
        )
        .unwrap();

        assert_eq!(inv.output, "lib/libcctbx.so");
        assert!(!inv.compile_only);
        assert_eq!(inv.sources, vec!["cctbx/a.o", "cctbx/b.o"]);
        assert_eq!(inv.libraries, vec!["m", "scitbx"]);
        assert_eq!(inv.library_dirs, vec!["lib", "/d/lib"]);
        assert!(inv.flags.contains(&"--shared".to_string()));
        assert!(inv.flags.contains(&"-s".to_string()));
    }

    #[test]
    fn test_parse_mac_bundle_line() {
        let inv = parse_compiler(
            "g++ -o lib/ext.so -bundle -undefined dynamic_lookup a.o -framework Python -Wl,-x",
        )
        .unwrap();

        assert_eq!(inv.frameworks, vec!["Python"]);
        assert!(inv.flags.contains(&"--bundle".to_string()));
        assert!(inv.flags.contains(&"--undefined=dynamic_lookup".to_string()));
        assert!(inv.flags.contains(&"--Wl=-x".to_string()));
        assert_eq!(inv.sources, vec!["a.o"]);
    }

    #[test]
    fn test_equals_and_adjacent_values() {
        let a = parse_compiler("gcc -o x.o -c --framework=Cocoa x.c").unwrap();
        let b = parse_compiler("gcc -o x.o -c --framework Cocoa x.c").unwrap();
        assert_eq!(a.frameworks, b.frameworks);
    }

    #[test]
    fn test_quoted_define() {
        let inv = parse_compiler(r#"gcc -o x.o -c "-DNAME=\"a b\"" x.c"#).unwrap();
        assert_eq!(inv.defines, vec![r#"NAME="a b""#]);
    }

    #[test]
    fn test_unknown_option_is_fatal() {
        let err = parse_compiler("g++ -o x.o -c -pg x.cc").unwrap_err();
        match err {
            ResolveError::Parse { line, reason, .. } => {
                assert_eq!(line, "g++ -o x.o -c -pg x.cc");
                assert!(reason.contains("-pg"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_repeated_output_is_fatal() {
        assert!(matches!(
            parse_compiler("g++ -o a.o -o b.o -c a.cc"),
            Err(ResolveError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_output() {
        assert!(matches!(
            parse_compiler("gcc -c a.c"),
            Err(ResolveError::MissingOutput { .. })
        ));
    }

    #[test]
    fn test_missing_option_value() {
        assert!(matches!(
            parse_compiler("gcc -c a.c -o"),
            Err(ResolveError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_linker_line() {
        let inv = parse_linker("ld -o lib/x.dylib -dynamic -bind_at_load a.o b.o -lSystem -framework Python")
            .unwrap();

        assert_eq!(inv.output, "lib/x.dylib");
        assert_eq!(inv.sources, vec!["a.o", "b.o"]);
        assert_eq!(inv.libraries, vec!["System"]);
        assert_eq!(inv.frameworks, vec!["Python"]);
        assert_eq!(inv.flags, vec!["--dynamic", "--bind_at_load"]);
    }

    #[test]
    fn test_parse_archiver_line() {
        let inv = parse_archiver("ar rc lib/libann.a annlib/src/ANN.o annlib/src/kd_tree.o").unwrap();
        assert_eq!(inv.archive, "lib/libann.a");
        assert_eq!(inv.members.len(), 2);
    }

    #[test]
    fn test_archiver_mode_must_be_rc() {
        let err = parse_archiver("ar x lib/libann.a ANN.o").unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedArchiveMode { ref mode, .. } if mode == "x"));
    }

    #[test]
    fn test_archiver_mode_checked_before_members() {
        for line in ["ar x lib/libann.a", "ar t lib/libann.a -v", "ar rcs"] {
            assert!(
                matches!(
                    parse_archiver(line),
                    Err(ResolveError::UnsupportedArchiveMode { .. })
                ),
                "{}",
                line
            );
        }
    }

    #[test]
    fn test_archiver_needs_members() {
        assert!(matches!(
            parse_archiver("ar rc lib/libann.a"),
            Err(ResolveError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_transcript_orders_records() {
        let classified = ClassifiedTranscript {
            compiler: vec!["g++ -o a.o -c /r/m/a.cc".to_string()],
            archiver: vec!["ar rc libm.a a.o".to_string()],
            linker: vec!["ld -o x.so a.o".to_string()],
        };

        let records = parse_transcript(&classified).unwrap();
        let tools: Vec<ToolKind> = records.iter().map(|r| r.tool).collect();
        assert_eq!(
            tools,
            vec![ToolKind::Compiler, ToolKind::Linker, ToolKind::Archiver]
        );
    }
}
