//! Progress bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::model::RenderModel;
use super::utils::format_duration;

pub fn render_progress_bar(frame: &mut Frame, area: Rect, view: &RenderModel) {
    let status_text = match &view.now_playing {
        None => " No track playing".to_string(),
        Some(track) if view.is_playing => {
            format!(" ▶ {} | {} ({})", track.title, track.artist_line(), track.album)
        }
        Some(track) => format!("⏸  {} | {} ({})", track.title, track.artist_line(), track.album),
    };

    let time_str = format!(
        "{} / {}",
        format_duration(view.position_ms),
        format_duration(view.duration_ms)
    );

    let progress_ratio = if view.duration_ms > 0 {
        (view.position_ms as f64 / view.duration_ms as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let position = match view.current_index {
        Some(index) => format!("{}/{}", index + 1, view.queue_len),
        None => format!("-/{}", view.queue_len),
    };
    let controls_info = format!(" {} | Mode: {} | Vol: {}% ", position, view.mode.label(), view.volume);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ", status_text))
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(progress_ratio)
        .label(time_str);

    frame.render_widget(gauge, area);
}
