use intake_core::FieldName;
use intake_pipeline::FormView;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::UiState;

/// Render the editable form.
pub fn render(frame: &mut Frame, view: &FormView<'_>, ui: &UiState, area: Rect) {
    let lines: Vec<Line> = FieldName::ALL
        .into_iter()
        .map(|field| field_line(field, view, ui))
        .collect();

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Form "),
    );
    frame.render_widget(form, area);
}

fn label(field: FieldName, view: &FormView<'_>) -> String {
    match field {
        FieldName::FirstName => "First Name*".to_string(),
        FieldName::LastName => "Last Name*".to_string(),
        FieldName::Tel => "Phone Number*".to_string(),
        FieldName::Gender => view.options.gender.name().to_string(),
        FieldName::Photo => "Photo".to_string(),
        FieldName::CheckedMeals => view.options.meals.name().to_string(),
        FieldName::Holidays => view.options.holidays.name().to_string(),
    }
}

fn field_line<'a>(field: FieldName, view: &'a FormView<'_>, ui: &'a UiState) -> Line<'a> {
    let focused = ui.focus() == field;
    let marker = if focused { "> " } else { "  " };
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::raw(marker),
        Span::styled(format!("{:<22}", label(field, view)), label_style),
    ];
    spans.extend(value_spans(field, view, ui, focused));
    Line::from(spans)
}

fn value_spans<'a>(
    field: FieldName,
    view: &'a FormView<'_>,
    ui: &'a UiState,
    focused: bool,
) -> Vec<Span<'a>> {
    let live = &view.live;
    let cursor = if focused { "_" } else { "" };

    match field {
        FieldName::FirstName => vec![Span::raw(format!("{}{cursor}", live.first_name))],
        FieldName::LastName => vec![Span::raw(format!("{}{cursor}", live.last_name))],
        FieldName::Tel => vec![Span::raw(format!("{}{cursor}", live.tel))],
        FieldName::Gender => vec![Span::raw(format!("< {} >", live.gender()))],
        FieldName::Holidays => vec![Span::raw(format!("< {} >", live.holidays()))],
        FieldName::CheckedMeals => view
            .options
            .meals
            .labels()
            .iter()
            .enumerate()
            .map(|(i, meal)| {
                let mark = if live.checked_meals().is_selected(i) {
                    "[x]"
                } else {
                    "[ ]"
                };
                let style = if focused && i == ui.meal_cursor {
                    Style::default().bg(Color::DarkGray).fg(Color::White)
                } else {
                    Style::default()
                };
                Span::styled(format!("{mark} {meal}  "), style)
            })
            .collect(),
        FieldName::Photo => {
            let mut spans = Vec::new();
            if let Some(photo) = live.photo() {
                spans.push(Span::styled(
                    format!("{} ({} bytes)  ", photo.name(), photo.size()),
                    Style::default().fg(Color::Green),
                ));
            }
            if focused {
                spans.push(Span::styled(
                    format!("path: {}_", ui.photo_input),
                    Style::default().fg(Color::DarkGray),
                ));
            } else if live.photo().is_none() {
                spans.push(Span::styled(
                    "(none)",
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans
        }
    }
}
