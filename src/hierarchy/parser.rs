//! Heading detection over raw chunk text.

use regex::Regex;

/// A structural marker detected at the start of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    /// What kind of marker was matched.
    pub kind: HeadingKind,
    /// Heading title, truncated at the first newline.
    pub title: String,
}

/// Kinds of structural markers recognized by a [`HeadingProfile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingKind {
    /// Dot-separated numeric section code, e.g. `150.7.1`.
    Numbered {
        /// The full section code as written in the document.
        code: String,
        /// Nesting level: the number of dot separators in the code.
        level: usize,
    },
    /// Parenthesized sub-clause label, e.g. `(3)`.
    SubClause {
        /// The label including parentheses.
        label: String,
    },
}

impl HeadingMatch {
    /// The code or label stored in chunk record payloads.
    pub fn code(&self) -> &str {
        match &self.kind {
            HeadingKind::Numbered { code, .. } => code,
            HeadingKind::SubClause { label } => label,
        }
    }
}

/// Compiled heading patterns for one document family.
///
/// Heading grammars vary across by-laws; a profile pins down the one in use
/// rather than guessing a canonical grammar. Numbered codes are tried before
/// sub-clause labels.
#[derive(Debug, Clone)]
pub struct HeadingProfile {
    numbered: Regex,
    subclause: Regex,
}

impl HeadingProfile {
    /// Profile for a document family whose section codes share a fixed prefix,
    /// e.g. `150.7` for the garden-suite chapter of Toronto's by-law 569-2013.
    ///
    /// When the prefix matches nothing in a document, every chunk parses as
    /// headingless and all hierarchies stay empty; that degradation is silent.
    pub fn with_code_prefix(prefix: &str) -> Self {
        let escaped = regex::escape(prefix.trim());
        Self {
            numbered: Regex::new(&format!(r"^({escaped}(?:\.\d+)*)[ \t]+(.+)"))
                .unwrap_or_else(|_| generic_numbered()),
            subclause: subclause_pattern(),
        }
    }

    /// Profile accepting any dot-separated numeric code at the start of a chunk.
    pub fn generic() -> Self {
        Self {
            numbered: generic_numbered(),
            subclause: subclause_pattern(),
        }
    }

    /// Detect a heading at the start of the (trimmed) chunk text.
    ///
    /// Returns `None` for body-text chunks; the caller inherits the active
    /// hierarchy in that case.
    pub fn parse(&self, text: &str) -> Option<HeadingMatch> {
        let cleaned = text.trim();

        if let Some(captures) = self.numbered.captures(cleaned) {
            let code = captures[1].to_string();
            let title = first_line(&captures[2]);
            if !title.is_empty() {
                let level = code.matches('.').count();
                return Some(HeadingMatch {
                    kind: HeadingKind::Numbered { code, level },
                    title,
                });
            }
        }

        if let Some(captures) = self.subclause.captures(cleaned) {
            let label = format!("({})", &captures[1]);
            let title = first_line(&captures[2]);
            if !title.is_empty() {
                return Some(HeadingMatch {
                    kind: HeadingKind::SubClause { label },
                    title,
                });
            }
        }

        None
    }
}

fn generic_numbered() -> Regex {
    Regex::new(r"^(\d+(?:\.\d+)*)[ \t]+(.+)").expect("generic heading pattern compiles")
}

fn subclause_pattern() -> Regex {
    Regex::new(r"^\((\d+)\)[ \t]*(.+)").expect("sub-clause pattern compiles")
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("").trim().to_string()
}
