//! Pure snapshot of engine state handed to the view

use super::navigation::NavigationStack;
use super::playback::PlaybackController;
use super::types::{MenuItem, PlayMode, Track, UiMode};

/// Rows of the play queue shown around the current track
const QUEUE_WINDOW: usize = 8;

#[derive(Clone, Debug, Default)]
pub struct RenderModel {
    pub ui_mode: UiMode,
    pub breadcrumb: Vec<String>,
    /// Rows of the visible page only
    pub items: Vec<MenuItem>,
    pub selected_in_page: Option<usize>,
    /// Position of the first visible row in the whole list
    pub first_index: usize,
    pub page: usize,
    pub pages: usize,
    pub loading: Option<String>,
    pub now_playing: Option<Track>,
    pub queue_window: Vec<(usize, Track)>,
    pub current_index: Option<usize>,
    pub queue_len: usize,
    pub mode: PlayMode,
    pub volume: u8,
    pub is_playing: bool,
    pub position_ms: u32,
    pub duration_ms: u32,
    pub notice: Option<String>,
    pub user: Option<String>,
}

impl RenderModel {
    pub fn build(nav: &NavigationStack, player: &PlaybackController, ui_mode: UiMode) -> Self {
        let top = nav.top();
        let page_size = nav.page_size();
        let all = top.node.items();
        let page = top.page(page_size);
        let pages = all.len().div_ceil(page_size).max(1);
        let start = page * page_size;
        let items: Vec<MenuItem> = all.into_iter().skip(start).take(page_size).collect();
        let selected_in_page = (!items.is_empty()).then(|| top.selected - start);

        let queue = player.queue();
        let window_start = player.current_index().unwrap_or(0).saturating_sub(QUEUE_WINDOW / 2);
        let queue_window = queue
            .iter()
            .cloned()
            .enumerate()
            .skip(window_start)
            .take(QUEUE_WINDOW)
            .collect();

        Self {
            ui_mode,
            breadcrumb: nav.frames().map(|f| f.node.title()).collect(),
            items,
            selected_in_page,
            first_index: start,
            page,
            pages,
            loading: nav.loading_title(),
            now_playing: player.current_track().cloned(),
            queue_window,
            current_index: player.current_index(),
            queue_len: queue.len(),
            mode: player.mode(),
            volume: player.volume(),
            is_playing: player.is_playing(),
            position_ms: player.timing.current_position_ms(),
            duration_ms: player.timing.duration_ms,
            notice: None,
            user: None,
        }
    }
}
