//! Streaming ancestor-stack tracking across a sequence of chunks.

use super::parser::{HeadingKind, HeadingMatch};
use super::HIERARCHY_DELIMITER;

/// State machine that maintains the active ancestor path while chunks are
/// consumed in document order.
///
/// A numbered heading at level `L` truncates the stack to `L` entries and
/// pushes its own title; a sibling or shallower heading thereby closes out any
/// deeper nesting. Sub-clause labels only decorate the rendered path and never
/// occupy a stack slot, so the next numbered heading truncates as if the
/// sub-clause had not occurred. Scoped to one indexing run.
#[derive(Debug, Default)]
pub struct HierarchyTracker {
    stack: Vec<String>,
    subclause: Option<String>,
}

impl HierarchyTracker {
    /// Consume the heading outcome for the next chunk and return the hierarchy
    /// path string that applies to that chunk.
    pub fn observe(&mut self, heading: Option<&HeadingMatch>) -> String {
        match heading {
            Some(matched) => match &matched.kind {
                HeadingKind::Numbered { level, .. } => {
                    self.stack.truncate(*level);
                    self.stack.push(matched.title.clone());
                    self.subclause = None;
                }
                HeadingKind::SubClause { .. } => {
                    self.subclause = Some(matched.title.clone());
                }
            },
            None => {}
        }
        self.current()
    }

    /// Render the hierarchy path that is currently active.
    pub fn current(&self) -> String {
        let base = self.stack.join(HIERARCHY_DELIMITER);
        match &self.subclause {
            Some(title) if base.is_empty() => title.clone(),
            Some(title) => format!("{base}{HIERARCHY_DELIMITER}{title}"),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HeadingProfile;

    fn observe_all(chunks: &[&str]) -> Vec<String> {
        let profile = HeadingProfile::with_code_prefix("150.7");
        let mut tracker = HierarchyTracker::default();
        chunks
            .iter()
            .map(|chunk| tracker.observe(profile.parse(chunk).as_ref()))
            .collect()
    }

    #[test]
    fn walks_a_garden_suite_heading_sequence() {
        let paths = observe_all(&[
            "150.7.1 Permitted Uses\nA garden suite is permitted...",
            "continuation without any heading",
            "150.7.1.2 Setbacks\nThe required setbacks are...",
            "(3) Minimum rear yard setback\nThe rear yard must be...",
        ]);
        assert_eq!(
            paths,
            vec![
                "Permitted Uses",
                "Permitted Uses",
                "Permitted Uses > Setbacks",
                "Permitted Uses > Setbacks > Minimum rear yard setback",
            ]
        );
    }

    #[test]
    fn body_chunks_inherit_the_nearest_preceding_path() {
        let paths = observe_all(&[
            "no heading yet",
            "150.7.2 Building Height\nbody",
            "more body text",
            "and yet more",
        ]);
        assert_eq!(paths[0], "");
        assert_eq!(paths[1], "Building Height");
        assert_eq!(paths[2], "Building Height");
        assert_eq!(paths[3], "Building Height");
    }

    #[test]
    fn sibling_heading_closes_deeper_nesting() {
        let profile = HeadingProfile::generic();
        let mut tracker = HierarchyTracker::default();
        let paths: Vec<String> = [
            "5 Parking\nbody",
            "5.1 Location\nbody",
            "5.1.1 Access\nbody",
            "5.2 Loading\nbody",
        ]
        .iter()
        .map(|chunk| tracker.observe(profile.parse(chunk).as_ref()))
        .collect();

        assert_eq!(paths[2], "Parking > Location > Access");
        // The level-1 sibling truncates both the level-1 and level-2 entries.
        assert_eq!(paths[3], "Parking > Loading");
    }

    #[test]
    fn subclause_does_not_disturb_the_stack() {
        let paths = observe_all(&[
            "150.7.1.2 Setbacks\nbody",
            "(1) Front yard\nbody",
            "(2) Side yard\nbody",
            "150.7.1.3 Separation\nbody",
        ]);
        assert_eq!(paths[1], "Setbacks > Front yard");
        // A second label replaces the first instead of accumulating.
        assert_eq!(paths[2], "Setbacks > Side yard");
        // The next numbered heading truncates as if no label had occurred.
        assert_eq!(paths[3], "Setbacks > Separation");
    }

    #[test]
    fn subclause_before_any_numbered_heading_stands_alone() {
        let paths = observe_all(&["(4) Transition rule\nbody"]);
        assert_eq!(paths[0], "Transition rule");
    }
}
