use crate::models::HealthCentre;
use crate::query::SearchKind;

/// Entries of the top-level menu.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum MainItem {
    User,
    Admin,
    Exit,
}

/// Entries of the user submenu: the search dimensions plus "back".
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum UserItem {
    Search(SearchKind),
    Back,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum AdminItem {
    Add,
    Edit,
    Delete,
    Exit,
}

/// Anything that can be listed in a [`Menu`].
pub(crate) trait MenuItem: Copy {
    fn label(&self) -> &'static str;
}

impl MenuItem for MainItem {
    fn label(&self) -> &'static str {
        match self {
            MainItem::User => "User",
            MainItem::Admin => "Admin",
            MainItem::Exit => "Exit",
        }
    }
}

impl MenuItem for UserItem {
    fn label(&self) -> &'static str {
        match self {
            UserItem::Search(kind) => kind.menu_label(),
            UserItem::Back => "Back to main menu",
        }
    }
}

impl MenuItem for AdminItem {
    fn label(&self) -> &'static str {
        match self {
            AdminItem::Add => "Add a new health centre",
            AdminItem::Edit => "Edit an existing health centre",
            AdminItem::Delete => "Delete a health centre",
            AdminItem::Exit => "Exit to main menu",
        }
    }
}

/// A vertical list with a highlighted entry. Digits pick entries directly,
/// 1-based like the printed numbering.
pub(crate) struct Menu<T: MenuItem> {
    pub(crate) title: &'static str,
    pub(crate) items: Vec<T>,
    pub(crate) selected: usize,
}

impl<T: MenuItem> Menu<T> {
    /// New menu with the first item selected.
    pub(crate) fn new(title: &'static str, items: Vec<T>) -> Self {
        Self {
            title,
            items,
            selected: 0,
        }
    }

    /// Move the highlight, wrapping at either end.
    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.items.is_empty() {
            return;
        }
        let len = self.items.len() as isize;
        self.selected = (self.selected as isize + offset).rem_euclid(len) as usize;
    }

    /// Highlighted item.
    pub(crate) fn current(&self) -> Option<T> {
        self.items.get(self.selected).copied()
    }

    /// Select by printed number. `None` means the digit is not on the menu.
    pub(crate) fn pick(&mut self, digit: char) -> Option<T> {
        let index = digit.to_digit(10)? as usize;
        let item = self.items.get(index.checked_sub(1)?).copied()?;
        self.selected = index - 1;
        Some(item)
    }

    /// Lines as printed: `1. User`.
    pub(crate) fn numbered_labels(&self) -> Vec<String> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| format!("{}. {}", idx + 1, item.label()))
            .collect()
    }
}

pub(crate) fn main_menu() -> Menu<MainItem> {
    Menu::new(
        "Welcome to the HSE Health Centre Kiosk",
        vec![MainItem::User, MainItem::Admin, MainItem::Exit],
    )
}

pub(crate) fn user_menu() -> Menu<UserItem> {
    let mut items: Vec<UserItem> = SearchKind::ALL.into_iter().map(UserItem::Search).collect();
    items.push(UserItem::Back);
    Menu::new("HSE Information Kiosk - Search", items)
}

pub(crate) fn admin_menu() -> Menu<AdminItem> {
    Menu::new(
        "Admin Interface",
        vec![
            AdminItem::Add,
            AdminItem::Edit,
            AdminItem::Delete,
            AdminItem::Exit,
        ],
    )
}

/// Hits of the last search, rendered as cards.
pub(crate) struct ResultsScreen {
    pub(crate) kind: SearchKind,
    pub(crate) term: String,
    pub(crate) results: Vec<HealthCentre>,
    pub(crate) selected: usize,
}

impl ResultsScreen {
    pub(crate) fn new(kind: SearchKind, term: String, results: Vec<HealthCentre>) -> Self {
        Self {
            kind,
            term,
            results,
            selected: 0,
        }
    }

    /// Move between result cards, stopping at the first and last.
    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.results.is_empty() {
            self.selected = 0;
            return;
        }
        let max = self.results.len() as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, max) as usize;
    }

    /// Card under the highlight, if any.
    pub(crate) fn current(&self) -> Option<&HealthCentre> {
        self.results.get(self.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_pick_entries_one_based() {
        let mut menu = user_menu();
        assert_eq!(menu.pick('1'), Some(UserItem::Search(SearchKind::Town)));
        assert_eq!(menu.pick('6'), Some(UserItem::Back));
        assert_eq!(menu.selected, 5);
        assert_eq!(menu.pick('0'), None);
        assert_eq!(menu.pick('7'), None);
        assert_eq!(menu.pick('x'), None);
    }

    #[test]
    fn menu_selection_wraps() {
        let mut menu = main_menu();
        menu.move_selection(-1);
        assert_eq!(menu.current(), Some(MainItem::Exit));
        menu.move_selection(1);
        assert_eq!(menu.current(), Some(MainItem::User));
    }

    #[test]
    fn results_selection_is_clamped() {
        let mut screen = ResultsScreen::new(
            SearchKind::Town,
            "Cork".into(),
            vec![HealthCentre::new("1", "A"), HealthCentre::new("2", "B")],
        );
        screen.move_selection(5);
        assert_eq!(screen.current().map(|c| c.id.as_str()), Some("2"));
        screen.move_selection(-5);
        assert_eq!(screen.selected, 0);
    }
}
