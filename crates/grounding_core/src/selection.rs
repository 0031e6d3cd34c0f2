use crate::chunk::ChunkIndex;

/// What a click did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Selected(ChunkIndex),
    Deselected(ChunkIndex),
}

/// Selected and hovered chunk of the active document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionState {
    selected: Option<ChunkIndex>,
    hovered: Option<ChunkIndex>,
}

impl SelectionState {
    pub fn selected(&self) -> Option<ChunkIndex> {
        self.selected
    }

    pub fn hovered(&self) -> Option<ChunkIndex> {
        self.hovered
    }

    /// Toggle: clicking the selected chunk clears the selection, clicking any
    /// other chunk selects it and drops the previous one.
    pub fn click(&mut self, index: ChunkIndex) -> SelectionChange {
        if self.selected == Some(index) {
            self.selected = None;
            SelectionChange::Deselected(index)
        } else {
            self.selected = Some(index);
            SelectionChange::Selected(index)
        }
    }

    pub fn hover_enter(&mut self, index: ChunkIndex) -> bool {
        let changed = self.hovered != Some(index);
        self.hovered = Some(index);
        changed
    }

    pub fn hover_leave(&mut self) -> bool {
        self.hovered.take().is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_toggles_and_replaces() {
        let mut selection = SelectionState::default();
        assert_eq!(selection.click(2), SelectionChange::Selected(2));
        assert_eq!(selection.click(4), SelectionChange::Selected(4));
        assert_eq!(selection.selected(), Some(4));
        assert_eq!(selection.click(4), SelectionChange::Deselected(4));
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn hover_is_independent_of_selection() {
        let mut selection = SelectionState::default();
        selection.click(1);
        assert!(selection.hover_enter(3));
        assert!(!selection.hover_enter(3));
        assert_eq!(selection.selected(), Some(1));
        assert!(selection.hover_leave());
        assert!(!selection.hover_leave());
        assert_eq!(selection.hovered(), None);
        assert_eq!(selection.selected(), Some(1));
    }
}
