//! Filter pipeline: zero-quantity identifiers minus exclusions, with special
//! items flagged for the extended entry protocol.

use std::path::Path;

use tracing::info;

use crate::config::ZeroEntryConfig;
use crate::error::ZeroEntryError;
use crate::extract::{self, Extraction};
use crate::lists::IdentifierList;

/// One identifier scheduled for entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub identifier: String,
    /// Set when the identifier is on the special-handling list.
    pub special: bool,
}

/// Final ordered work list handed to the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkList {
    items: Vec<WorkItem>,
}

impl WorkList {
    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.identifier.as_str())
    }

    pub fn special_count(&self) -> usize {
        self.items.iter().filter(|i| i.special).count()
    }
}

/// Drops excluded identifiers (keeping order and duplicates) and flags
/// special ones. Does not check for emptiness.
pub fn filter(
    identifiers: Vec<String>,
    exclusions: &IdentifierList,
    specials: &IdentifierList,
) -> WorkList {
    let items = identifiers
        .into_iter()
        .filter(|id| !exclusions.contains(id))
        .map(|identifier| {
            let special = specials.contains(&identifier);
            WorkItem {
                identifier,
                special,
            }
        })
        .collect();
    WorkList { items }
}

/// Like [`filter`], but an empty result is [`ZeroEntryError::NoWork`].
pub fn select(
    identifiers: Vec<String>,
    exclusions: &IdentifierList,
    specials: &IdentifierList,
) -> Result<WorkList, ZeroEntryError> {
    let work = filter(identifiers, exclusions, specials);
    if work.is_empty() {
        return Err(ZeroEntryError::NoWork);
    }
    Ok(work)
}

/// Everything the commands need from one pass over an export.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub extraction: Extraction,
    pub work: WorkList,
}

/// Loads the (exclusions, specials) lists named in the configuration.
pub fn load_lists(
    config: &ZeroEntryConfig,
) -> Result<(IdentifierList, IdentifierList), ZeroEntryError> {
    let exclusions = IdentifierList::load(&config.exclusion_file)?;
    let specials = IdentifierList::load(&config.special_file)?;
    Ok((exclusions, specials))
}

/// Runs extraction and filtering for `path` with the configured list files.
pub fn prepare(path: &Path, config: &ZeroEntryConfig) -> Result<Prepared, ZeroEntryError> {
    let extraction = extract::extract(path)?;
    let (exclusions, specials) = load_lists(config)?;

    let zero = extraction.zero_quantity();
    let zero_count = zero.len();
    let work = select(zero, &exclusions, &specials)?;
    info!(
        zero_quantity = zero_count,
        excluded = zero_count - work.len(),
        special = work.special_count(),
        selected = work.len(),
        "work list ready"
    );
    Ok(Prepared { extraction, work })
}
