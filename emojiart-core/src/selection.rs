//! Emoji selection, kept next to the document rather than inside it.

use std::collections::BTreeSet;

use crate::{EmojiArt, EmojiId};

/// A set of selected emoji ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<EmojiId>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`. Returns whether it is now selected.
    pub fn toggle(&mut self, id: EmojiId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Add `id` to the selection.
    pub fn select(&mut self, id: EmojiId) {
        self.ids.insert(id);
    }

    /// Remove `id` from the selection.
    pub fn deselect(&mut self, id: EmojiId) {
        self.ids.remove(&id);
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: EmojiId) -> bool {
        self.ids.contains(&id)
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of selected ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Selected ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = EmojiId> + '_ {
        self.ids.iter().copied()
    }

    /// Drop ids that no longer exist in `art`.
    pub fn retain_existing(&mut self, art: &EmojiArt) {
        self.ids.retain(|id| art.emoji(*id).is_some());
    }
}

impl FromIterator<EmojiId> for Selection {
    fn from_iter<I: IntoIterator<Item = EmojiId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut selection = Selection::new();
        let id = EmojiId::new(1);
        assert!(selection.toggle(id));
        assert!(selection.contains(id));
        assert!(!selection.toggle(id));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_deselect() {
        let mut selection = Selection::new();
        selection.select(EmojiId::new(2));
        selection.select(EmojiId::new(1));
        selection.select(EmojiId::new(2));
        assert_eq!(selection.len(), 2);
        assert_eq!(
            selection.ids().collect::<Vec<_>>(),
            vec![EmojiId::new(1), EmojiId::new(2)]
        );
        selection.deselect(EmojiId::new(1));
        assert!(!selection.contains(EmojiId::new(1)));
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_retain_existing() {
        let mut art = EmojiArt::new();
        let a = art.add_emoji("😀", (0, 0), 40);
        let b = art.add_emoji("🐶", (0, 0), 40);
        let mut selection: Selection = [a, b].into_iter().collect();

        art.remove_emoji(a);
        selection.retain_existing(&art);
        assert!(!selection.contains(a));
        assert!(selection.contains(b));
    }
}
