use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::models::{Column, HealthCentre};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Render one column of a record as display text; NULL shows as a dash.
pub(crate) fn field_text(centre: &HealthCentre, column: Column) -> String {
    let text = match column {
        Column::Id => Some(centre.id.clone()),
        Column::Name => Some(centre.name.clone()),
        Column::Latitude => centre.latitude.map(|value| value.to_string()),
        Column::Longitude => centre.longitude.map(|value| value.to_string()),
        Column::Address => centre.address.clone(),
        Column::Town => centre.town.clone(),
        Column::PostalCode => centre.postal_code.clone(),
        Column::Role => centre.role.clone(),
        Column::Phone => centre.phone.clone(),
    };
    text.filter(|value| !value.is_empty())
        .unwrap_or_else(|| "-".to_string())
}

/// OpenStreetMap link centred on the record, when it has coordinates.
pub(crate) fn map_url(centre: &HealthCentre) -> Option<String> {
    let (lat, lon) = centre.coordinates()?;
    Some(format!(
        "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map=16/{lat}/{lon}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_render_as_dash() {
        let centre = HealthCentre::new("9", "Clinic");
        assert_eq!(field_text(&centre, Column::Name), "Clinic");
        assert_eq!(field_text(&centre, Column::Phone), "-");
        assert_eq!(field_text(&centre, Column::Latitude), "-");
    }

    #[test]
    fn map_url_needs_both_coordinates() {
        let mut centre = HealthCentre::new("1", "St. James's");
        centre.latitude = Some(53.34);
        assert!(map_url(&centre).is_none());

        centre.longitude = Some(-6.29);
        let url = map_url(&centre).unwrap();
        assert!(url.contains("mlat=53.34"));
        assert!(url.contains("mlon=-6.29"));
    }
}
