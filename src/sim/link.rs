//! Link index lookup
//!
//! Mechanics are paired by an authored `link_index`. Indices are not unique:
//! every entity sharing an index belongs to the same group. Iteration order is
//! stable (sorted by link, then by insertion) to keep ticks deterministic.

use std::collections::BTreeMap;

/// Maps a link index to the positions of the entities carrying it
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    groups: BTreeMap<u32, Vec<usize>>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from the link index of each entity, in entity order
    pub fn from_links(links: impl IntoIterator<Item = u32>) -> Self {
        let mut table = Self::new();
        for (idx, link) in links.into_iter().enumerate() {
            table.insert(link, idx);
        }
        table
    }

    pub fn insert(&mut self, link: u32, entity: usize) {
        self.groups.entry(link).or_default().push(entity);
    }

    /// Entities sharing `link` (empty when none do)
    pub fn members(&self, link: u32) -> &[usize] {
        self.groups.get(&link).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, link: u32) -> bool {
        self.groups.contains_key(&link)
    }
}
