use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::{KioskError, KioskResult};
use crate::models::{Column, FieldValue, HealthCentre};
use crate::query::SearchKind;

/// Single-line input used for search terms and the admin password.
#[derive(Default, Clone)]
pub(crate) struct TextPrompt {
    pub(crate) value: String,
    pub(crate) masked: bool,
    pub(crate) error: Option<String>,
}

impl TextPrompt {
    /// Password entry: the value is never drawn.
    pub(crate) fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    /// Append a printable character. Returns whether the input changed.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value.push(ch);
        self.error = None;
        true
    }

    /// Drop the last character.
    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    /// Empty the input, e.g. after a rejected password.
    pub(crate) fn clear(&mut self) {
        self.value.clear();
    }

    /// What the screen shows: the text itself, or one `*` per character.
    pub(crate) fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    /// Characters typed, for cursor placement.
    pub(crate) fn value_len(&self) -> usize {
        self.value.chars().count()
    }
}

/// Search term entry for one dimension.
#[derive(Clone)]
pub(crate) struct SearchPrompt {
    pub(crate) kind: SearchKind,
    pub(crate) input: TextPrompt,
}

impl SearchPrompt {
    pub(crate) fn new(kind: SearchKind) -> Self {
        Self {
            kind,
            input: TextPrompt::default(),
        }
    }
}

/// Add form: one text field per column, in schema order.
#[derive(Clone)]
pub(crate) struct CentreForm {
    pub(crate) values: Vec<String>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl Default for CentreForm {
    fn default() -> Self {
        Self {
            values: vec![String::new(); Column::ALL.len()],
            active: 0,
            error: None,
        }
    }
}

impl CentreForm {
    /// Column of the focused field.
    pub(crate) fn active_column(&self) -> Column {
        Column::ALL[self.active]
    }

    /// Move focus forwards or backwards, wrapping around.
    pub(crate) fn move_focus(&mut self, offset: isize) {
        let len = self.values.len() as isize;
        self.active = (self.active as isize + offset).rem_euclid(len) as usize;
    }

    /// Append a character to the active field, rejecting letters in the
    /// coordinate fields.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if self.active_column().is_numeric() && !is_numeric_char(ch) {
            return false;
        }
        self.values[self.active].push(ch);
        true
    }

    /// Drop the last character of the focused field.
    pub(crate) fn backspace(&mut self) {
        self.values[self.active].pop();
    }

    fn value(&self, column: Column) -> &str {
        let idx = Column::ALL
            .iter()
            .position(|candidate| *candidate == column)
            .unwrap_or_default();
        &self.values[idx]
    }

    /// Validate the inputs and build the record ready for insertion.
    pub(crate) fn parse_inputs(&self) -> KioskResult<HealthCentre> {
        let text = |column: Column| -> KioskResult<Option<String>> {
            match FieldValue::parse(column, self.value(column))? {
                FieldValue::Text(value) => Ok(value),
                FieldValue::Number(_) => Ok(None),
            }
        };
        let number = |column: Column| -> KioskResult<Option<f64>> {
            match FieldValue::parse(column, self.value(column))? {
                FieldValue::Number(value) => Ok(value),
                FieldValue::Text(_) => Ok(None),
            }
        };

        let centre = HealthCentre {
            id: self.value(Column::Id).trim().to_string(),
            name: self.value(Column::Name).trim().to_string(),
            latitude: number(Column::Latitude)?,
            longitude: number(Column::Longitude)?,
            address: text(Column::Address)?,
            town: text(Column::Town)?,
            postal_code: text(Column::PostalCode)?,
            role: text(Column::Role)?,
            phone: text(Column::Phone)?,
        };
        centre.validate()?;
        Ok(centre)
    }

    /// Render field `idx` with its label and a placeholder when empty.
    pub(crate) fn build_line(&self, idx: usize) -> Line<'static> {
        let column = Column::ALL[idx];
        let placeholder = if column.is_required() {
            "<required>"
        } else {
            "<optional>"
        };
        field_line(
            column.label(),
            &self.values[idx],
            placeholder,
            self.active == idx,
        )
    }
}

/// Fields of the edit form.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum EditField {
    #[default]
    Id,
    Column,
    Value,
}

/// Edit form: which row, which column (from the allow-list), and the value.
#[derive(Clone)]
pub(crate) struct EditForm {
    pub(crate) id: String,
    pub(crate) columns: Vec<Column>,
    pub(crate) column: usize,
    pub(crate) value: String,
    pub(crate) active: EditField,
    pub(crate) error: Option<String>,
}

impl Default for EditForm {
    fn default() -> Self {
        Self {
            id: String::new(),
            columns: Column::editable().collect(),
            column: 0,
            value: String::new(),
            active: EditField::Id,
            error: None,
        }
    }
}

impl EditForm {
    /// Column currently chosen in the picker.
    pub(crate) fn selected_column(&self) -> Column {
        self.columns[self.column]
    }

    /// Tab order is id, column, value.
    pub(crate) fn move_focus(&mut self, forward: bool) {
        self.active = match (self.active, forward) {
            (EditField::Id, true) | (EditField::Value, false) => EditField::Column,
            (EditField::Column, true) => EditField::Value,
            (EditField::Column, false) | (EditField::Value, true) => EditField::Id,
            (EditField::Id, false) => EditField::Value,
        };
    }

    /// Cycle through the editable columns while the column field has focus.
    pub(crate) fn cycle_column(&mut self, offset: isize) {
        if self.active != EditField::Column {
            return;
        }
        let len = self.columns.len() as isize;
        self.column = (self.column as isize + offset).rem_euclid(len) as usize;
    }

    /// A letter typed into the column field selects the first column whose
    /// name starts with it.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            EditField::Id => {
                self.id.push(ch);
                true
            }
            EditField::Value => {
                if self.selected_column().is_numeric() && !is_numeric_char(ch) {
                    return false;
                }
                self.value.push(ch);
                true
            }
            EditField::Column => {
                let wanted = ch.to_ascii_lowercase();
                match self
                    .columns
                    .iter()
                    .position(|column| column.as_sql().starts_with(wanted))
                {
                    Some(idx) => {
                        self.column = idx;
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Drop the last character of the id or value. No-op on the picker.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            EditField::Id => {
                self.id.pop();
            }
            EditField::Value => {
                self.value.pop();
            }
            EditField::Column => {}
        }
    }

    /// Trimmed id, chosen column and the typed value parsed for that column.
    pub(crate) fn parse_inputs(&self) -> KioskResult<(String, Column, FieldValue)> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(KioskError::input("ID is required."));
        }
        let column = self.selected_column();
        let value = FieldValue::parse(column, &self.value)?;
        Ok((id.to_string(), column, value))
    }

    /// Render one field. The picker shows the column label between arrows.
    pub(crate) fn build_line(&self, field: EditField) -> Line<'static> {
        match field {
            EditField::Id => field_line("ID", &self.id, "<required>", self.active == field),
            EditField::Column => {
                let style = if self.active == field {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::raw(format!("{:<width$}: ", "Column", width = label_width())),
                    Span::styled(format!("< {} >", self.selected_column().label()), style),
                ])
            }
            EditField::Value => field_line(
                "New value",
                &self.value,
                "<empty clears the field>",
                self.active == field,
            ),
        }
    }

    /// Characters typed into `field`, for cursor placement.
    pub(crate) fn value_len(&self, field: EditField) -> usize {
        match field {
            EditField::Id => self.id.chars().count(),
            EditField::Value => self.value.chars().count(),
            EditField::Column => 0,
        }
    }
}

/// Id entry for the delete flow.
#[derive(Default, Clone)]
pub(crate) struct DeleteForm {
    pub(crate) id: TextPrompt,
}

#[derive(Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) centre: HealthCentre,
}

fn is_numeric_char(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E')
}

/// Width of the longest form label so values line up.
pub(crate) fn label_width() -> usize {
    Column::ALL
        .iter()
        .map(|column| column.label().len())
        .chain(["New value".len()])
        .max()
        .unwrap_or_default()
}

/// Render a `Label: value` line, highlighting the focused field.
fn field_line(label: &str, value: &str, placeholder: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{label:<width$}: ", width = label_width())),
        Span::styled(display, style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form(values: [&str; 9]) -> CentreForm {
        CentreForm {
            values: values.iter().map(|value| value.to_string()).collect(),
            ..CentreForm::default()
        }
    }

    #[test]
    fn add_form_builds_a_record() {
        let form = filled_form([
            "3",
            "Galway Uni Hosp",
            "53.27",
            "-9.06",
            "Newcastle Rd",
            "Galway",
            "H91",
            "ED",
            "091524222",
        ]);
        let centre = form.parse_inputs().unwrap();
        assert_eq!(centre.id, "3");
        assert_eq!(centre.town.as_deref(), Some("Galway"));
        assert_eq!(centre.longitude, Some(-9.06));
    }

    #[test]
    fn add_form_reports_input_errors() {
        let form = filled_form(["3", "", "", "", "", "", "", "", ""]);
        assert!(matches!(form.parse_inputs(), Err(KioskError::Input(_))));

        let form = filled_form(["3", "Clinic", "5..3", "", "", "", "", "", ""]);
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn coordinate_fields_reject_letters() {
        let mut form = CentreForm::default();
        form.active = 2;
        assert!(!form.push_char('n'));
        assert!(form.push_char('5'));
        assert!(form.push_char('-'));
        assert_eq!(form.values[2], "5-");
    }

    #[test]
    fn focus_wraps_around() {
        let mut form = CentreForm::default();
        form.move_focus(-1);
        assert_eq!(form.active_column(), Column::Phone);
        form.move_focus(1);
        assert_eq!(form.active_column(), Column::Id);
    }

    #[test]
    fn edit_form_only_offers_allowed_columns() {
        let mut form = EditForm::default();
        assert!(!form.columns.contains(&Column::Id));

        form.id.push_str("1");
        form.move_focus(true);
        assert!(form.push_char('t'));
        assert_eq!(form.selected_column(), Column::Town);
        assert!(!form.push_char('z'));

        form.move_focus(true);
        for ch in "Blackrock".chars() {
            form.push_char(ch);
        }
        let (id, column, value) = form.parse_inputs().unwrap();
        assert_eq!(id, "1");
        assert_eq!(column, Column::Town);
        assert_eq!(value, FieldValue::Text(Some("Blackrock".into())));
    }

    #[test]
    fn edit_form_requires_an_id() {
        let form = EditForm::default();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn masked_prompt_hides_characters() {
        let mut prompt = TextPrompt::masked();
        for ch in "admin123".chars() {
            prompt.push_char(ch);
        }
        assert_eq!(prompt.display(), "********");
        assert_eq!(prompt.value, "admin123");
    }
}
