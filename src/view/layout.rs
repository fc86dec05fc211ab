//! Layout rendering (top bar, menu list, queue)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::RenderModel;
use super::utils::{dim, fit, format_duration, index_label, index_width, render_rows, row_style};

pub fn render_top_bar(frame: &mut Frame, area: Rect, view: &RenderModel) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Breadcrumb
            Constraint::Length(25), // User
        ])
        .split(area);

    let mut path = view.breadcrumb.join(" › ");
    if let Some(loading) = &view.loading {
        path = format!("{}  (loading {}...)", path, loading);
    }
    let breadcrumb = Paragraph::new(path)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" cloudtune ")
                .padding(Padding::horizontal(1)),
        );
    frame.render_widget(breadcrumb, chunks[0]);

    let user = view.user.as_deref().unwrap_or("Not signed in");
    let user = Paragraph::new(format!("♪ {}", user))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" User "));
    frame.render_widget(user, chunks[1]);
}

pub fn render_menu(frame: &mut Frame, area: Rect, view: &RenderModel) {
    let content_width = area.width.saturating_sub(4) as usize;
    let first = view.first_index;
    let num_width = index_width(first + view.items.len());
    let title_width = content_width.saturating_sub(num_width + 1) * 6 / 10;

    let rows: Vec<ListItem> = view
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let style = row_style(Some(i) == view.selected_in_page);
            let mut spans = vec![
                Span::styled(index_label(first + i, num_width), style),
                Span::styled(fit(&item.title, title_width), style),
            ];
            if let Some(subtitle) = &item.subtitle {
                spans.push(dim(format!("  {}", subtitle)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = view.breadcrumb.last().cloned().unwrap_or_default();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
        .title_bottom(Line::from(format!(" page {}/{} ", view.page + 1, view.pages)).right_aligned())
        .padding(Padding::horizontal(1))
        .border_style(Style::default().fg(Color::Green));

    render_rows(frame, area, rows, view.selected_in_page, block);
}

pub fn render_queue(frame: &mut Frame, area: Rect, view: &RenderModel) {
    let num_width = index_width(view.queue_len);
    let content_width = area.width.saturating_sub(4) as usize;
    let title_width = content_width.saturating_sub(num_width + 10) * 6 / 10;

    let rows: Vec<ListItem> = view
        .queue_window
        .iter()
        .map(|(index, track)| {
            let style = row_style(Some(*index) == view.current_index);
            ListItem::new(Line::from(vec![
                Span::styled(index_label(*index, num_width), style),
                Span::styled(fit(&track.title, title_width), style),
                dim(format!("  {}", track.artist_line())),
                dim(format!("  {}", format_duration(track.duration_ms))),
            ]))
        })
        .collect();
    let focus = view
        .queue_window
        .iter()
        .position(|(index, _)| Some(*index) == view.current_index);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Queue ({}) ", view.queue_len))
        .padding(Padding::horizontal(1))
        .border_style(Style::default().fg(Color::Green));

    render_rows(frame, area, rows, focus, block);
}
