//! Code-keyed hierarchy lookup built over a whole document.

use super::parser::{HeadingKind, HeadingMatch};
use super::HIERARCHY_DELIMITER;
use std::collections::HashMap;

/// Title and nesting level recorded for one heading code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyEntry {
    /// Heading title as written in the document.
    pub title: String,
    /// Nesting level of the code.
    pub level: usize,
}

/// Mapping from heading code to [`HierarchyEntry`], built once per indexing
/// run and read-only afterward.
///
/// Duplicate codes are malformed input; the last occurrence in document order
/// wins. The index is discarded after indexing completes; only the rendered
/// hierarchy strings persist in chunk records.
#[derive(Debug, Default)]
pub struct HierarchyIndex {
    entries: HashMap<String, HierarchyEntry>,
}

impl HierarchyIndex {
    /// Build the index from the numbered headings of a document, in order.
    pub fn build<'a>(headings: impl IntoIterator<Item = &'a HeadingMatch>) -> Self {
        let mut index = Self::default();
        for matched in headings {
            if let HeadingKind::Numbered { code, level } = &matched.kind {
                index.entries.insert(
                    code.clone(),
                    HierarchyEntry {
                        title: matched.title.clone(),
                        level: *level,
                    },
                );
            }
        }
        index
    }

    /// Look up the entry recorded for a code.
    pub fn get(&self, code: &str) -> Option<&HierarchyEntry> {
        self.entries.get(code)
    }

    /// Resolve the ancestor chain for a code, root-to-leaf.
    ///
    /// Walks the code through prefix truncation (dropping the last
    /// dot-separated component each step) and collects the title of every
    /// prefix present in the index. Undefined prefixes are skipped silently,
    /// so a code whose prefixes are all unknown resolves to an empty chain.
    pub fn resolve(&self, code: &str) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = code;

        loop {
            if let Some(entry) = self.entries.get(current) {
                path.push(entry.title.clone());
            }
            match current.rfind('.') {
                Some(position) => current = &current[..position],
                None => break,
            }
        }

        path.reverse();
        path
    }

    /// Resolve the ancestor chain and render it as a delimiter-joined path.
    pub fn resolve_path(&self, code: &str) -> String {
        self.resolve(code).join(HIERARCHY_DELIMITER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(code: &str, title: &str) -> HeadingMatch {
        HeadingMatch {
            kind: HeadingKind::Numbered {
                code: code.to_string(),
                level: code.matches('.').count(),
            },
            title: title.to_string(),
        }
    }

    #[test]
    fn resolves_full_ancestor_chain() {
        let headings = vec![
            heading("150.7", "Garden Suites"),
            heading("150.7.1", "Permitted Uses"),
            heading("150.7.1.2", "Setbacks"),
        ];
        let index = HierarchyIndex::build(&headings);

        assert_eq!(
            index.resolve("150.7.1.2"),
            vec!["Garden Suites", "Permitted Uses", "Setbacks"]
        );
        assert_eq!(
            index.resolve_path("150.7.1.2"),
            "Garden Suites > Permitted Uses > Setbacks"
        );
    }

    #[test]
    fn gaps_in_the_chain_are_skipped_silently() {
        let headings = vec![
            heading("150.7.1", "Permitted Uses"),
            heading("150.7.1.2", "Setbacks"),
        ];
        let index = HierarchyIndex::build(&headings);

        // 150.7 and 150 are never defined; they contribute nothing.
        assert_eq!(
            index.resolve("150.7.1.2"),
            vec!["Permitted Uses", "Setbacks"]
        );
    }

    #[test]
    fn entirely_undefined_prefixes_resolve_to_empty() {
        let index = HierarchyIndex::build(&[heading("150.7.1", "Permitted Uses")]);
        assert!(index.resolve("42.1.3").is_empty());
        assert_eq!(index.resolve_path("42.1.3"), "");
    }

    #[test]
    fn duplicate_codes_keep_the_last_occurrence() {
        let headings = vec![
            heading("150.7.1", "Permitted Uses"),
            heading("150.7.1", "Permitted Uses (amended)"),
        ];
        let index = HierarchyIndex::build(&headings);
        assert_eq!(
            index.get("150.7.1").map(|entry| entry.title.as_str()),
            Some("Permitted Uses (amended)")
        );
    }

    #[test]
    fn subclause_matches_are_not_indexed() {
        let matches = vec![HeadingMatch {
            kind: HeadingKind::SubClause {
                label: "(3)".into(),
            },
            title: "Minimum rear yard setback".into(),
        }];
        let index = HierarchyIndex::build(&matches);
        assert!(index.get("(3)").is_none());
    }
}
