//! Row helpers shared by the menu and queue lists

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, List, ListItem, ListState},
    Frame,
};

/// Render rows with `focus` kept in view. Rows carry their own highlight.
pub fn render_rows(frame: &mut Frame, area: Rect, rows: Vec<ListItem>, focus: Option<usize>, block: Block) {
    let mut state = ListState::default().with_selected(focus);
    frame.render_stateful_widget(List::new(rows).block(block), area, &mut state);
}

pub fn row_style(highlighted: bool) -> Style {
    if highlighted {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn dim(text: String) -> Span<'static> {
    Span::styled(text, Style::default().fg(Color::DarkGray))
}

/// Digits of the largest row number, plus room for the trailing dot
pub fn index_width(rows: usize) -> usize {
    rows.max(1).to_string().len() + 1
}

/// One-based row number, right aligned
pub fn index_label(index: usize, width: usize) -> String {
    format!("{:>width$} ", format!("{}.", index + 1), width = width)
}

pub fn format_duration(ms: u32) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Pad or cut `s` to exactly `width` columns, marking cuts with an ellipsis
pub fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return format!("{:<width$}", s);
    }
    let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
    if width > 0 {
        cut.push('…');
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_format_as_minutes_and_seconds() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(61_500), "1:01");
    }

    #[test]
    fn titles_fit_their_column() {
        assert_eq!(fit("abcdefghij", 6), "abcde…");
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abc", 0), "");
    }

    #[test]
    fn row_numbers_align_to_the_widest() {
        assert_eq!(index_width(0), 2);
        assert_eq!(index_width(120), 4);
        assert_eq!(index_label(8, 4), "  9. ");
        assert_eq!(index_label(99, 4), "100. ");
    }
}
