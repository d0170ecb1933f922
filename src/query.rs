//! Search dimensions offered in user mode. Each one is a substring predicate
//! over one or more columns, executed through [`RecordStore::query`].
//!
//! The phone and role lookups filter on town or hospital name: the operator
//! names a place and gets back its phone number or role, so the filtered and
//! displayed columns differ.

use std::fmt;

use tracing::debug;

use crate::db::{Predicate, RecordStore, CASEFOLD_FN};
use crate::error::StoreError;
use crate::models::{Column, HealthCentre};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Town,
    Site,
    Phone,
    Location,
    Role,
}

impl SearchKind {
    /// Menu order.
    pub const ALL: [SearchKind; 5] = [
        SearchKind::Town,
        SearchKind::Site,
        SearchKind::Phone,
        SearchKind::Location,
        SearchKind::Role,
    ];

    /// Columns the term is matched against (any of them may match).
    pub fn filter_columns(self) -> &'static [Column] {
        match self {
            SearchKind::Town => &[Column::Town],
            SearchKind::Site => &[Column::Address],
            SearchKind::Phone | SearchKind::Role => &[Column::Town, Column::Name],
            SearchKind::Location => &[Column::Name],
        }
    }

    /// Columns rendered for each hit.
    pub fn display_columns(self) -> &'static [Column] {
        match self {
            SearchKind::Town | SearchKind::Site => &Column::ALL,
            SearchKind::Phone => &[Column::Name, Column::Phone],
            SearchKind::Location => &[
                Column::Name,
                Column::Latitude,
                Column::Longitude,
                Column::Address,
                Column::PostalCode,
            ],
            SearchKind::Role => &[Column::Name, Column::Role],
        }
    }

    pub fn menu_label(self) -> &'static str {
        match self {
            SearchKind::Town => "By town",
            SearchKind::Site => "By site",
            SearchKind::Phone => "Phone number search",
            SearchKind::Location => "Location search",
            SearchKind::Role => "Role search",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            SearchKind::Town => "Which town?",
            SearchKind::Site => "Which street or site address?",
            SearchKind::Phone | SearchKind::Role => "Which hospital or location?",
            SearchKind::Location => "Which area?",
        }
    }

    /// Build the parameterized predicate for `term`.
    pub fn predicate(self, term: &str) -> Predicate {
        contains_any(self.filter_columns(), term)
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.menu_label())
    }
}

/// Run a search. No match yields an empty vector.
pub fn search(
    store: &RecordStore,
    kind: SearchKind,
    term: &str,
) -> Result<Vec<HealthCentre>, StoreError> {
    let results = store.query(&kind.predicate(term))?;
    debug!(kind = ?kind, hits = results.len(), "search finished");
    Ok(results)
}

pub fn by_town(store: &RecordStore, term: &str) -> Result<Vec<HealthCentre>, StoreError> {
    search(store, SearchKind::Town, term)
}

pub fn by_site(store: &RecordStore, term: &str) -> Result<Vec<HealthCentre>, StoreError> {
    search(store, SearchKind::Site, term)
}

pub fn by_phone(store: &RecordStore, term: &str) -> Result<Vec<HealthCentre>, StoreError> {
    search(store, SearchKind::Phone, term)
}

pub fn by_location(store: &RecordStore, term: &str) -> Result<Vec<HealthCentre>, StoreError> {
    search(store, SearchKind::Location, term)
}

pub fn by_role(store: &RecordStore, term: &str) -> Result<Vec<HealthCentre>, StoreError> {
    search(store, SearchKind::Role, term)
}

/// `casefold(col1) LIKE ?1 ESCAPE '\' OR ...` with every parameter bound to
/// the lowercased `%term%`. Both sides are folded in Rust so accented
/// capitals match too.
fn contains_any(columns: &[Column], term: &str) -> Predicate {
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    let clause = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            format!(
                "{CASEFOLD_FN}({}) LIKE ?{} ESCAPE '\\'",
                column.as_sql(),
                idx + 1
            )
        })
        .collect::<Vec<_>>()
        .join(" OR ");
    let params = vec![pattern; columns.len()];
    Predicate::new(clause, params)
}

/// Make `%`, `_` and the escape character itself match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn town_predicate_binds_wrapped_term() {
        let predicate = SearchKind::Town.predicate("ORK");
        assert_eq!(predicate.clause(), "casefold(town) LIKE ?1 ESCAPE '\\'");
        assert_eq!(predicate.params(), ["%ork%".to_string()]);
    }

    #[test]
    fn phone_and_role_filter_on_town_or_name() {
        for kind in [SearchKind::Phone, SearchKind::Role] {
            let predicate = kind.predicate("Cork");
            assert_eq!(
                predicate.clause(),
                "casefold(town) LIKE ?1 ESCAPE '\\' OR casefold(name) LIKE ?2 ESCAPE '\\'"
            );
            assert_eq!(predicate.params().len(), 2);
        }
        assert!(SearchKind::Phone.display_columns().contains(&Column::Phone));
        assert!(SearchKind::Role.display_columns().contains(&Column::Role));
    }

    #[test]
    fn user_text_never_reaches_the_clause() {
        let predicate = SearchKind::Location.predicate("x' OR 1=1 --");
        assert!(!predicate.clause().contains("1=1"));
        assert_eq!(predicate.params()[0], "%x' or 1=1 --%");
    }

    #[test]
    fn wildcards_in_terms_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(SearchKind::Site.predicate("a_b").params()[0], "%a\\_b%");
    }
}
