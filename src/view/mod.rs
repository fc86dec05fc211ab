//! View module - UI rendering
//!
//! Renders a `RenderModel` with ratatui; it never reads engine state
//! directly. It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (formatting, scrollable lists)
//! - `layout`: Top bar, menu list and queue panes
//! - `progress`: Progress bar rendering
//! - `overlays`: Transient notice toast

mod utils;
mod layout;
mod progress;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{RenderModel, UiMode};

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, view: &RenderModel) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Breadcrumb + user
                Constraint::Min(0),    // Menu or queue
                Constraint::Length(3), // Progress bar with playback info
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], view);

        match view.ui_mode {
            UiMode::Menu => layout::render_menu(frame, chunks[1], view),
            UiMode::Playing => layout::render_queue(frame, chunks[1], view),
        }

        progress::render_progress_bar(frame, chunks[2], view);

        if let Some(notice) = &view.notice {
            overlays::render_notice(frame, notice);
        }
    }
}
