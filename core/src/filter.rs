//! Query filtering and the update the results surface needs.

use crate::collector::Entry;
use crate::error::Result;
use crate::matcher::compile_case_insensitive;

/// How the results surface has to change to show a new filtered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    /// The displayed lines are a prefix of the new list; add the rest.
    Append(Vec<Entry>),
    /// Clear the surface and write the whole list.
    Replace(Vec<Entry>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refreshed {
    pub filtered: Vec<Entry>,
    pub update: ViewUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Same query and no force: nothing to do.
    NoOp,
    Updated(Refreshed),
}

/// Entries of `entries` matching `query` case-insensitively, in collection
/// order.
pub fn filter_entries(entries: &[Entry], query: &str) -> Result<Vec<Entry>> {
    let re = compile_case_insensitive(query)?;
    Ok(entries
        .iter()
        .filter(|entry| re.is_match(entry))
        .cloned()
        .collect())
}

/// Recomputes the filtered list for `query`.
///
/// `displayed` is the list written to the results surface by the previous
/// refresh. When it is a non-empty prefix of the new list only the tail is
/// appended; otherwise the surface is rewritten. A malformed query is an
/// error and leaves the caller's state untouched.
pub fn refresh(
    entries: &[Entry],
    query: &str,
    prev_query: &str,
    displayed: &[Entry],
    force: bool,
) -> Result<RefreshOutcome> {
    if query == prev_query && !force {
        return Ok(RefreshOutcome::NoOp);
    }
    let filtered = filter_entries(entries, query)?;
    let update = if !displayed.is_empty() && filtered.starts_with(displayed) {
        ViewUpdate::Append(filtered[displayed.len()..].to_vec())
    } else {
        ViewUpdate::Replace(filtered.clone())
    };
    Ok(RefreshOutcome::Updated(Refreshed { filtered, update }))
}
