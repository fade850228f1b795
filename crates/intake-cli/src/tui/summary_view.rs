use intake_pipeline::{summary_lines, FormView};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Render the last submitted data, or a placeholder before the first commit.
pub fn render(frame: &mut Frame, view: &FormView<'_>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Your Submitted Data ");

    let Some(published) = view.submitted else {
        let empty = Paragraph::new("Nothing submitted yet. Press Ctrl-S to submit.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let mut lines: Vec<Line> = summary_lines(published)
        .into_iter()
        .map(|line| {
            Line::from(vec![
                Span::styled(
                    format!("{}: ", line.label),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(line.value),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "Submitted {}",
            published.submitted_at().format("%Y-%m-%d %H:%M:%S UTC")
        ),
        Style::default().fg(Color::DarkGray),
    )));

    let summary = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(summary, area);
}
