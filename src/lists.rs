//! Optional flat identifier lists (exclusions and special handling).

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::ZeroEntryError;

/// A set of identifiers read from a one-per-line text file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierList {
    ids: HashSet<String>,
}

impl IdentifierList {
    /// Parses one identifier per line. Surrounding whitespace is trimmed and
    /// blank lines are skipped.
    pub fn parse(contents: &str) -> Self {
        let ids = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { ids }
    }

    /// Loads a list file. A missing file yields an empty list.
    pub fn load(path: &Path) -> Result<Self, ZeroEntryError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let list = Self::parse(&contents);
                debug!(path = %path.display(), entries = list.len(), "loaded identifier list");
                Ok(list)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "identifier list absent, using empty list");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.ids.contains(identifier)
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl<S: Into<String>> FromIterator<S> for IdentifierList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}
