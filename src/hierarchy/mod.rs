//! Heading detection and hierarchy reconstruction.
//!
//! Regulatory documents carry their structure in numbered section codes
//! (`150.7`, `150.7.1`, `150.7.1.2`, ...) and parenthesized sub-clauses
//! (`(3) Minimum rear yard setback`). This module detects those markers inside
//! text chunks and rebuilds the ancestor path for every chunk, including body
//! chunks that carry no marker of their own.

pub mod index;
pub mod parser;
pub mod tracker;

pub use index::{HierarchyEntry, HierarchyIndex};
pub use parser::{HeadingKind, HeadingMatch, HeadingProfile};
pub use tracker::HierarchyTracker;

/// Separator between ancestor titles in a rendered hierarchy path.
pub const HIERARCHY_DELIMITER: &str = " > ";

/// Strategy used to reconstruct the ancestor path for each chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HierarchyStrategy {
    /// One-at-a-time processing: the streaming tracker stack is the only state.
    Streaming,
    /// Full-document lookahead: headed chunks resolve against the code index,
    /// body chunks inherit the streaming stack.
    Lookahead,
}

/// Compute the hierarchy path string for every chunk, in document order.
///
/// Both strategies agree on well-formed input; `Lookahead` additionally
/// recovers ancestors that are defined later in the document than their
/// descendants, because the index is built over all chunks up front.
pub fn resolve_hierarchies(
    headings: &[Option<HeadingMatch>],
    strategy: HierarchyStrategy,
) -> Vec<String> {
    let index = match strategy {
        HierarchyStrategy::Streaming => None,
        HierarchyStrategy::Lookahead => Some(HierarchyIndex::build(headings.iter().flatten())),
    };

    let mut tracker = HierarchyTracker::default();
    headings
        .iter()
        .map(|heading| {
            let streamed = tracker.observe(heading.as_ref());
            match (&index, heading) {
                (Some(index), Some(matched)) => match &matched.kind {
                    HeadingKind::Numbered { code, .. } => index.resolve_path(code),
                    HeadingKind::SubClause { .. } => streamed,
                },
                _ => streamed,
            }
        })
        .collect()
}
