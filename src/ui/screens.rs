/// Highlighted row within one of the list views. The lists themselves live in
/// the library; only the cursor is screen state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListCursor {
    pub(crate) selected: usize,
}

impl ListCursor {
    pub(crate) fn move_selection(&mut self, offset: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len as isize {
            new = len as isize - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    /// Keep the cursor on a valid row after the list shrank.
    pub(crate) fn ensure_in_bounds(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// Move the cursor to `id` if it is present in `ids`.
    pub(crate) fn focus<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>, id: &str) {
        if let Some(idx) = ids.into_iter().position(|candidate| candidate == id) {
            self.selected = idx;
        }
    }
}

/// Top-level views reachable from the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum View {
    Songs,
    Setlists,
    Settings,
}

impl View {
    pub(crate) const ALL: [View; 3] = [View::Songs, View::Setlists, View::Settings];

    pub(crate) fn title(self) -> &'static str {
        match self {
            View::Songs => "Songs",
            View::Setlists => "Setlists",
            View::Settings => "Settings",
        }
    }

    pub(crate) fn next(self) -> Self {
        match self {
            View::Songs => View::Setlists,
            View::Setlists => View::Settings,
            View::Settings => View::Songs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_stays_in_bounds() {
        let mut cursor = ListCursor::default();
        cursor.move_selection(5, 3);
        assert_eq!(cursor.selected, 2);
        cursor.move_selection(-10, 3);
        assert_eq!(cursor.selected, 0);
        cursor.select_last(4);
        cursor.ensure_in_bounds(2);
        assert_eq!(cursor.selected, 1);
        cursor.ensure_in_bounds(0);
        assert_eq!(cursor.selected, 0);
    }

    #[test]
    fn focus_finds_id() {
        let mut cursor = ListCursor::default();
        cursor.focus(["a", "b", "c"], "c");
        assert_eq!(cursor.selected, 2);
        cursor.focus(["a"], "zzz");
        assert_eq!(cursor.selected, 2);
    }

    #[test]
    fn views_cycle() {
        assert_eq!(View::Settings.next(), View::Songs);
        assert_eq!(View::ALL.len(), 3);
    }
}
