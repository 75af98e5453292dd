/*!
Raw configuration documents carried alongside a snapshot.

The core treats job and view `config.xml` documents as opaque bytes; they are
captured verbatim and replayed verbatim. Only the view attribute extraction
in [`crate::views`] looks inside them.
*/

use std::collections::BTreeMap;
use std::fmt;

/// Kind of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocKind {
    Job,
    View,
}

impl DocKind {
    /// Directory this kind's documents live under inside an archive.
    pub fn dir(&self) -> &'static str {
        match self {
            DocKind::Job => "jobs",
            DocKind::View => "views",
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocKind::Job => write!(f, "job"),
            DocKind::View => write!(f, "view"),
        }
    }
}

/// Per-item raw configuration documents, keyed by `(kind, name)`.
///
/// Iteration order is fixed: all job documents alphabetically, then all view
/// documents alphabetically. The archive packager relies on this to produce
/// byte-stable entry ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStore {
    docs: BTreeMap<(DocKind, String), String>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<N, D>(&mut self, kind: DocKind, name: N, document: D)
    where
        N: Into<String>,
        D: Into<String>,
    {
        self.docs.insert((kind, name.into()), document.into());
    }

    pub fn get(&self, kind: DocKind, name: &str) -> Option<&str> {
        self.docs
            .get(&(kind, name.to_string()))
            .map(|d| d.as_str())
    }

    /// Iterate documents in stable order: jobs alphabetically, then views.
    pub fn iter(&self) -> impl Iterator<Item = (DocKind, &str, &str)> {
        self.docs
            .iter()
            .map(|((kind, name), doc)| (*kind, name.as_str(), doc.as_str()))
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
