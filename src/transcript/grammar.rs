//! Declarative option grammars for the supported tools
//!
//! Each grammar is a table of recognized options plus the line-level
//! rewrites that must run before tokenizing. Historical single-dash spellings
//! (`-shared`, `-dynamic`, ...) are rewritten to their long form because the
//! tables only know the long form.

/// Which record field an option feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionField {
    Output,
    IncludeDir,
    Define,
    LibraryDir,
    Library,
    Framework,
    CompileOnly,
    /// Carried through verbatim, not interpreted
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Switch,
    Value,
}

#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub arity: Arity,
    pub field: OptionField,
    /// May appear more than once
    pub repeatable: bool,
}

impl OptionSpec {
    const fn value(name: &'static str, field: OptionField) -> Self {
        Self {
            name,
            arity: Arity::Value,
            field,
            repeatable: true,
        }
    }

    const fn single(name: &'static str, field: OptionField) -> Self {
        Self {
            name,
            arity: Arity::Value,
            field,
            repeatable: false,
        }
    }

    const fn switch(name: &'static str, field: OptionField) -> Self {
        Self {
            name,
            arity: Arity::Switch,
            field,
            repeatable: true,
        }
    }

    pub fn is_long(&self) -> bool {
        self.name.starts_with("--")
    }
}

#[derive(Debug)]
pub struct Grammar {
    pub tool: &'static str,
    pub options: &'static [OptionSpec],
    /// Single-dash spellings rewritten to `--name`
    pub long_aliases: &'static [&'static str],
    /// Further substring rewrites, applied after the aliases
    pub rewrites: &'static [(&'static str, &'static str)],
}

impl Grammar {
    pub fn long(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.is_long() && o.name == name)
    }

    pub fn short_switch(&self, token: &str) -> Option<&OptionSpec> {
        self.options
            .iter()
            .find(|o| !o.is_long() && o.arity == Arity::Switch && o.name == token)
    }

    /// Short option taking a value, matched by its two-character name
    pub fn short_value(&self, token: &str) -> Option<&OptionSpec> {
        self.options
            .iter()
            .find(|o| !o.is_long() && o.arity == Arity::Value && token.starts_with(o.name))
    }

    /// Applies the alias and rewrite table to a raw line
    pub fn normalize_line(&self, line: &str) -> String {
        let mut line = format!("{} ", line);
        for alias in self.long_aliases {
            let short = format!(" -{} ", alias);
            let long = format!(" --{} ", alias);
            // Adjacent repeats share a separator, so one pass can miss every other one
            while line.contains(&short) {
                line = line.replace(&short, &long);
            }
        }
        for (from, to) in self.rewrites {
            line = line.replace(from, to);
        }
        line
    }
}

use OptionField::*;

pub static COMPILER: Grammar = Grammar {
    tool: "compiler",
    options: &[
        OptionSpec::single("-o", Output),
        OptionSpec::value("-I", IncludeDir),
        OptionSpec::value("-D", Define),
        OptionSpec::value("-L", LibraryDir),
        OptionSpec::value("-l", Library),
        OptionSpec::value("-W", Flag),
        OptionSpec::value("-f", Flag),
        OptionSpec::single("-O", Flag),
        OptionSpec::switch("-c", CompileOnly),
        OptionSpec::switch("-w", Flag),
        OptionSpec::switch("-s", Flag),
        OptionSpec::switch("--shared", Flag),
        OptionSpec::single("--undefined", Flag),
        OptionSpec::switch("--bundle", Flag),
        OptionSpec::switch("--dylib", Flag),
        OptionSpec::switch("--nostartfiles", Flag),
        OptionSpec::value("--Wl", Flag),
        OptionSpec::value("--framework", Framework),
    ],
    long_aliases: &[
        "bundle",
        "dylib",
        "shared",
        "undefined",
        "nostartfiles",
        "framework",
    ],
    rewrites: &[("-Wl,", "--Wl=")],
};

pub static LINKER: Grammar = Grammar {
    tool: "linker",
    options: &[
        OptionSpec::single("-o", Output),
        OptionSpec::value("-l", Library),
        OptionSpec::switch("--dynamic", Flag),
        OptionSpec::switch("-m", Flag),
        OptionSpec::switch("-r", Flag),
        OptionSpec::switch("-d", Flag),
        OptionSpec::switch("--bind_at_load", Flag),
        OptionSpec::value("--framework", Framework),
    ],
    long_aliases: &["dynamic", "bind_at_load", "framework"],
    rewrites: &[],
};

/// The only archiver mode understood: replace members, create if missing
pub const ARCHIVE_MODE: &str = "rc";
