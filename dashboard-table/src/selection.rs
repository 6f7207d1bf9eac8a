use std::collections::BTreeSet;

/// Selected rows of one table, keyed by row id.
///
/// Ids survive re-sorting and paging. Ids of rows that disappear from the data are dropped by
/// [`retain_present`](Self::retain_present).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowSelection {
    ids: BTreeSet<String>,
}

impl RowSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn set(&mut self, id: &str, selected: bool) {
        if selected {
            self.ids.insert(id.to_string());
        } else {
            self.ids.remove(id);
        }
    }

    /// Flip the selection of `id`, returns the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        let selected = !self.is_selected(id);
        self.set(id, selected);
        selected
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Drop every id for which `present` is false. Returns the number of ids dropped.
    pub fn retain_present<F>(&mut self, present: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let before = self.ids.len();
        self.ids.retain(|id| present(id));
        before - self.ids.len()
    }
}
